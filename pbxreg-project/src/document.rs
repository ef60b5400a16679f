//! The project document: opaque text interleaved with sections of records.

use std::{collections::HashMap, fmt, str::FromStr};

use crate::{
    Error, ObjectId, Result,
    error::SourceContext,
    isa,
    parse::parse_segments,
    record::Record,
};

/// Filename used in diagnostics when none is known.
pub const DEFAULT_FILENAME: &str = "project.pbxproj";

/// A loaded `project.pbxproj`.
///
/// Serializing a document that has not been edited reproduces the input
/// byte for byte.
#[derive(Debug, Clone)]
pub struct Document {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
pub(crate) enum Segment {
    Text(String),
    Section(Section),
}

/// A `/* Begin X section */ … /* End X section */` block.
#[derive(Debug, Clone)]
pub(crate) struct Section {
    pub(crate) name: String,
    pub(crate) begin: String,
    pub(crate) entries: Vec<Entry>,
    pub(crate) end: String,
}

#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Record(Record),
    Text(String),
}

impl Section {
    pub(crate) fn new(name: &str, begin: &str) -> Self {
        Self {
            name: name.to_string(),
            begin: begin.to_string(),
            entries: Vec::new(),
            end: String::new(),
        }
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Record(record) => Some(record),
            Entry::Text(_) => None,
        })
    }

    /// Append `record` after the last record of the section.
    fn push(&mut self, record: Record) {
        let at = self
            .entries
            .iter()
            .rposition(|entry| matches!(entry, Entry::Record(_)))
            .map_or(self.entries.len(), |i| i + 1);
        self.entries.insert(at, Entry::Record(record));
    }
}

impl Document {
    /// Parse a document, using `filename` in diagnostics.
    ///
    /// Fails with [`Error::MalformedDocument`] when the build file or file
    /// reference section is missing, or when the document has no group or no
    /// sources build phase.
    pub fn parse(content: &str, filename: &str) -> Result<Self> {
        let ctx = SourceContext::new(content, filename);
        let document = Self {
            segments: parse_segments(&ctx)?,
        };
        document.check_required(&ctx)?;
        tracing::debug!(
            filename,
            records = document.records().count(),
            "parsed project document"
        );
        Ok(document)
    }

    fn check_required(&self, ctx: &SourceContext) -> Result<()> {
        for section in [isa::BUILD_FILE, isa::FILE_REFERENCE] {
            if !self.sections().any(|s| s.name == section) {
                return Err(ctx.malformed_error(format!("the {section} section")));
            }
        }
        for kind in [isa::GROUP, isa::SOURCES_BUILD_PHASE] {
            if !self.records().any(|r| r.is(kind)) {
                return Err(ctx.malformed_error(format!("a {kind} record")));
            }
        }
        Ok(())
    }

    pub(crate) fn sections(&self) -> impl Iterator<Item = &Section> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Section(section) => Some(section),
            Segment::Text(_) => None,
        })
    }

    fn sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.segments.iter_mut().filter_map(|segment| match segment {
            Segment::Section(section) => Some(section),
            Segment::Text(_) => None,
        })
    }

    /// All records in document order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.sections().flat_map(Section::records)
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.sections_mut().flat_map(|section| {
            section.entries.iter_mut().filter_map(|entry| match entry {
                Entry::Record(record) => Some(record),
                Entry::Text(_) => None,
            })
        })
    }

    /// Records of the given kind, in document order.
    pub fn records_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Record> {
        self.records().filter(move |r| r.is(kind))
    }

    /// The first record with `id`.
    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records().find(|r| r.id().as_str() == id)
    }

    pub(crate) fn record_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.records_mut().find(|r| r.id().as_str() == id)
    }

    /// Records by id. When an id is duplicated the first record wins, as in
    /// [`Document::record`].
    pub(crate) fn index(&self) -> HashMap<&str, &Record> {
        let mut index = HashMap::new();
        for record in self.records() {
            index.entry(record.id().as_str()).or_insert(record);
        }
        index
    }

    pub fn contains(&self, id: &str) -> bool {
        self.record(id).is_some()
    }

    /// Every record id, duplicates included.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records().map(|r| r.id().as_str())
    }

    /// Whether any record was created or changed since the document was read.
    pub fn is_modified(&self) -> bool {
        self.records().any(Record::is_modified)
    }

    /// Append `record` to the section named after its `isa`.
    pub(crate) fn push_record(&mut self, record: Record) -> Result<()> {
        let kind = record.isa().to_string();
        let section = self
            .sections_mut()
            .find(|s| s.name == kind)
            .ok_or_else(|| Error::validation(format!("document has no {kind} section")))?;
        tracing::debug!(id = %record.id(), kind = %kind, "staged new record");
        section.push(record);
        Ok(())
    }

    /// Remove every record matching `remove` and return them in document order.
    pub(crate) fn remove_records(&mut self, mut remove: impl FnMut(&Record) -> bool) -> Vec<Record> {
        let mut removed = Vec::new();
        for section in self.sections_mut() {
            let entries = std::mem::take(&mut section.entries);
            for entry in entries {
                match entry {
                    Entry::Record(record) if remove(&record) => removed.push(record),
                    entry => section.entries.push(entry),
                }
            }
        }
        removed
    }

    /// Record ids that occur more than once, each reported once.
    pub fn duplicate_ids(&self) -> Vec<ObjectId> {
        let mut seen = std::collections::HashSet::new();
        let mut reported = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for record in self.records() {
            let id = record.id();
            if !seen.insert(id.as_str()) && reported.insert(id.as_str()) {
                duplicates.push(id.clone());
            }
        }
        duplicates
    }
}

impl FromStr for Document {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Document::parse(s, DEFAULT_FILENAME)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Section(section) => {
                    out.push_str(&section.begin);
                    for entry in &section.entries {
                        match entry {
                            Entry::Record(record) => record.write(&mut out),
                            Entry::Text(text) => out.push_str(text),
                        }
                    }
                    out.push_str(&section.end);
                }
            }
        }
        f.write_str(&out)
    }
}

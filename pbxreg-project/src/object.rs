//! Typed views over the record kinds the editor works with.

use crate::{Document, ObjectId, isa, record::Record};

/// A `PBXFileReference`: one file on disk.
#[derive(Debug, Clone, Copy)]
pub struct FileReference<'a>(&'a Record);

impl<'a> FileReference<'a> {
    pub fn id(&self) -> &'a ObjectId {
        self.0.id()
    }

    pub fn path(&self) -> Option<&'a str> {
        self.0.get_str("path")
    }

    pub fn name(&self) -> Option<&'a str> {
        self.0.get_str("name")
    }

    /// Name shown in Xcode: `name`, else the last component of `path`.
    pub fn display_name(&self) -> &'a str {
        self.name()
            .or(self.path().map(pbxreg_core::display_name))
            .or(self.0.comment())
            .unwrap_or(self.0.id().as_str())
    }

    /// Whether this reference points at `path` (by `path`, `name` or display name).
    pub fn matches_path(&self, path: &str) -> bool {
        self.path() == Some(path) || self.name() == Some(path) || self.0.comment() == Some(path)
    }
}

/// A `PBXBuildFile`: a file reference included in a build phase.
#[derive(Debug, Clone, Copy)]
pub struct BuildFile<'a>(pub(crate) &'a Record);

impl<'a> BuildFile<'a> {
    pub fn id(&self) -> &'a ObjectId {
        self.0.id()
    }

    /// The referenced file, if the record has a `fileRef`.
    pub fn file_ref(&self) -> Option<&'a str> {
        self.0.get_str("fileRef")
    }

    pub fn display_name(&self) -> &'a str {
        self.0.comment().unwrap_or(self.0.id().as_str())
    }
}

/// A `PBXGroup`: a folder in the project navigator.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a>(&'a Record);

impl<'a> Group<'a> {
    pub fn id(&self) -> &'a ObjectId {
        self.0.id()
    }

    /// Name used to address the group: `name`, else `path`, else the comment.
    pub fn name(&self) -> Option<&'a str> {
        self.0
            .get_str("name")
            .or(self.0.get_str("path"))
            .or(self.0.comment())
    }

    pub fn children(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.0.list("children")
    }

    pub(crate) fn record(&self) -> &'a Record {
        self.0
    }
}

/// A build phase (`PBXSourcesBuildPhase`, `PBXResourcesBuildPhase`, …).
#[derive(Debug, Clone, Copy)]
pub struct BuildPhase<'a>(&'a Record);

impl<'a> BuildPhase<'a> {
    pub fn id(&self) -> &'a ObjectId {
        self.0.id()
    }

    pub fn is_sources(&self) -> bool {
        self.0.is(isa::SOURCES_BUILD_PHASE)
    }

    pub fn files(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.0.list("files")
    }
}

/// A buildable target and its build phases.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a>(&'a Record);

impl<'a> Target<'a> {
    pub fn id(&self) -> &'a ObjectId {
        self.0.id()
    }

    pub fn name(&self) -> &'a str {
        self.0
            .get_str("name")
            .or(self.0.comment())
            .unwrap_or(self.0.id().as_str())
    }

    pub fn build_phases(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.0.list("buildPhases")
    }
}

impl Document {
    pub fn file_references(&self) -> impl Iterator<Item = FileReference<'_>> {
        self.records_of(isa::FILE_REFERENCE).map(FileReference)
    }

    pub fn file_reference(&self, id: &str) -> Option<FileReference<'_>> {
        self.record(id)
            .filter(|r| r.is(isa::FILE_REFERENCE))
            .map(FileReference)
    }

    pub fn build_files(&self) -> impl Iterator<Item = BuildFile<'_>> {
        self.records_of(isa::BUILD_FILE).map(BuildFile)
    }

    pub fn build_file(&self, id: &str) -> Option<BuildFile<'_>> {
        self.record(id).filter(|r| r.is(isa::BUILD_FILE)).map(BuildFile)
    }

    pub fn groups(&self) -> impl Iterator<Item = Group<'_>> {
        self.records_of(isa::GROUP).map(Group)
    }

    pub fn group(&self, id: &str) -> Option<Group<'_>> {
        self.record(id).filter(|r| r.is(isa::GROUP)).map(Group)
    }

    pub fn build_phases(&self) -> impl Iterator<Item = BuildPhase<'_>> {
        self.records()
            .filter(|r| isa::is_build_phase(r.isa()))
            .map(BuildPhase)
    }

    pub fn build_phase(&self, id: &str) -> Option<BuildPhase<'_>> {
        self.record(id)
            .filter(|r| isa::is_build_phase(r.isa()))
            .map(BuildPhase)
    }

    pub fn targets(&self) -> impl Iterator<Item = Target<'_>> {
        self.records()
            .filter(|r| isa::TARGETS.iter().any(|kind| r.is(kind)))
            .map(Target)
    }
}

//! Object records: `ID /* comment */ = { isa = …; … };`

use crate::{
    ObjectId,
    value::{Dict, Value, write_block, write_inline},
};

/// Record kinds Xcode writes on a single line.
const INLINE_KINDS: &[&str] = &[crate::isa::BUILD_FILE, crate::isa::FILE_REFERENCE];

/// One object in the project's `objects` dictionary.
///
/// A record read from disk keeps its original text and is written back
/// verbatim until it is modified; modified and new records are rendered in
/// Xcode's canonical layout.
#[derive(Debug, Clone)]
pub struct Record {
    id: ObjectId,
    comment: Option<String>,
    body: Dict,
    depth: usize,
    raw: Option<String>,
}

impl Record {
    /// Create a new record at the standard indentation of the objects dictionary.
    pub fn new(id: ObjectId, comment: Option<String>, body: Dict) -> Self {
        Self {
            id,
            comment,
            body,
            depth: 2,
            raw: None,
        }
    }

    pub(crate) fn parsed(
        id: ObjectId,
        comment: Option<String>,
        body: Dict,
        depth: usize,
        raw: String,
    ) -> Self {
        Self {
            id,
            comment,
            body,
            depth,
            raw: Some(raw),
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// The `/* comment */` after the id, which Xcode uses for the display name.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn body(&self) -> &Dict {
        &self.body
    }

    /// The `isa` of this record, or `""` if it has none.
    pub fn isa(&self) -> &str {
        self.get_str("isa").unwrap_or("")
    }

    pub fn is(&self, isa: &str) -> bool {
        self.isa() == isa
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    /// String items of the array under `key` (object ids for `children`,
    /// `files`, `buildPhases`). Empty when the key is absent.
    pub fn list(&self, key: &str) -> impl Iterator<Item = &str> {
        self.body
            .get(key)
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
    }

    /// Whether this record has been created or changed since it was read.
    pub fn is_modified(&self) -> bool {
        self.raw.is_none()
    }

    /// Append `item` to the array under `key`, creating the array if needed.
    pub(crate) fn push_to_list(&mut self, key: &str, item: Value) {
        self.raw = None;
        match self.body.get_mut(key).and_then(Value::as_array_mut) {
            Some(items) => items.push(item),
            None => {
                self.body.insert(key.to_string(), Value::Array(vec![item]));
            }
        }
    }

    /// Remove every occurrence of `id` from the array under `key`.
    /// Returns how many were removed; the record is only touched if any were.
    pub(crate) fn remove_from_list(&mut self, key: &str, id: &str) -> usize {
        self.retain_in_list(key, |item| item.as_str() != Some(id))
    }

    /// Keep the items of the array under `key` for which `keep` returns true.
    /// Returns how many were dropped.
    pub(crate) fn retain_in_list(
        &mut self,
        key: &str,
        mut keep: impl FnMut(&Value) -> bool,
    ) -> usize {
        let Some(items) = self.body.get(key).and_then(Value::as_array) else {
            return 0;
        };
        let kept: Vec<Value> = items.iter().filter(|item| keep(*item)).cloned().collect();
        let dropped = items.len() - kept.len();
        if dropped > 0 {
            self.raw = None;
            self.body.insert(key.to_string(), Value::Array(kept));
        }
        dropped
    }

    /// Write this record, including its trailing newline.
    pub(crate) fn write(&self, out: &mut String) {
        if let Some(raw) = &self.raw {
            out.push_str(raw);
            return;
        }

        out.extend(std::iter::repeat_n('\t', self.depth));
        out.push_str(self.id.as_str());
        if let Some(comment) = &self.comment {
            out.push_str(" /* ");
            out.push_str(comment);
            out.push_str(" */");
        }
        out.push_str(" = ");
        let body = Value::Dict(self.body.clone());
        if INLINE_KINDS.iter().any(|kind| *kind == self.isa()) {
            write_inline(out, &body);
        } else {
            write_block(out, &body, self.depth);
        }
        out.push_str(";\n");
    }
}

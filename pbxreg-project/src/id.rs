//! Object identifiers and their allocation.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::Serialize;

use crate::{Error, Result};

/// Length of the identifiers Xcode generates (96 bits as hex).
pub const ID_LEN: usize = 24;

/// Identifier of an object record, e.g. `A10000040` or `8F3C1D2E4B5A69788796A5B4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Wrap `id` if it is a well-formed identifier (ASCII letters, digits, `_`).
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        is_valid_id(&id).then_some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn is_valid_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        ObjectId::new(s).ok_or_else(|| {
            Error::validation(format!(
                "'{s}' is not an object id (expected letters, digits and underscores)"
            ))
        })
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of candidate identifiers for new records.
///
/// Candidates are not trusted to be unique; [`IdAllocator`] checks each one
/// against the document.
pub trait IdSource {
    /// Produce the next candidate identifier.
    fn next_id(&mut self) -> ObjectId;
}

/// Random identifiers in Xcode's format: 24 uppercase hex digits from a v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> ObjectId {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        ObjectId(hex[..ID_LEN].to_ascii_uppercase())
    }
}

/// Deterministic identifiers `<prefix><counter>`, zero-padded to 24 characters.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> ObjectId {
        let width = ID_LEN.saturating_sub(self.prefix.len());
        let id = format!("{}{:0width$X}", self.prefix, self.next);
        self.next += 1;
        ObjectId(id)
    }
}

/// Hands out identifiers that are unique within one document.
pub(crate) struct IdAllocator<'a> {
    taken: HashSet<String>,
    source: &'a mut dyn IdSource,
}

impl<'a> IdAllocator<'a> {
    pub(crate) fn new<'d>(
        existing: impl IntoIterator<Item = &'d str>,
        source: &'a mut dyn IdSource,
    ) -> Self {
        Self {
            taken: existing.into_iter().map(str::to_owned).collect(),
            source,
        }
    }

    /// Draw one identifier. A candidate that is already taken is fatal.
    pub(crate) fn allocate(&mut self) -> Result<ObjectId> {
        let id = self.source.next_id();
        if !self.taken.insert(id.0.clone()) {
            return Err(Box::new(Error::IdentifierCollision { id }));
        }
        tracing::trace!(%id, "allocated object id");
        Ok(id)
    }
}

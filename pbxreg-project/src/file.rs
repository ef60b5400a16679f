use std::path::{Path, PathBuf};

use pbxreg_core::{WriteResult, write_atomic};

use crate::{DEFAULT_FILENAME, Document, Error, Result};

/// A `project.pbxproj` on disk with both its raw content and parsed document.
#[derive(Debug)]
pub struct ProjectFile {
    path: PathBuf,
    content: String,
    document: Document,
}

impl ProjectFile {
    /// Open and parse a project file.
    ///
    /// `path` may name the `project.pbxproj` itself or the `.xcodeproj`
    /// directory containing it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = if path.is_dir() {
            path.join(DEFAULT_FILENAME)
        } else {
            path.to_path_buf()
        };
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let filename = path.display().to_string();
        let document = Document::parse(&content, &filename)?;

        Ok(Self {
            path,
            content,
            document,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Whether the document no longer serializes to the content on disk.
    pub fn is_modified(&self) -> bool {
        self.document.to_string() != self.content
    }

    /// Replace the file on disk with the serialized document.
    pub fn save(&mut self) -> Result<WriteResult> {
        let content = self.document.to_string();
        let result = write_atomic(&self.path, &content).map_err(|e| Error::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), ?result, "saved project file");
        self.content = content;
        Ok(result)
    }
}

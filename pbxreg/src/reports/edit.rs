//! Report of an edit: the applied steps and what happened to the file.

use std::path::PathBuf;

use pbxreg_project::Change;

use super::output::{Output, Report};

/// What happened to the project file after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The file was replaced.
    Written,
    /// The edit produced the content already on disk.
    Unchanged,
    /// `--dry-run`: nothing was written.
    DryRun,
}

/// Report data from add, ensure, remove and dedupe.
#[derive(Debug)]
pub struct EditReport {
    /// Path to the project file.
    pub path: PathBuf,
    /// One-line description of the edit, e.g. "registered Bar.swift".
    pub summary: String,
    pub changes: Vec<Change>,
    /// Problems worth knowing about that did not stop the edit.
    pub warnings: Vec<String>,
    pub outcome: Outcome,
}

impl Report for EditReport {
    fn render(&self, out: &mut dyn Output) {
        for change in &self.changes {
            out.step(&change.to_string());
        }
        for warning in &self.warnings {
            out.warning(warning);
        }

        let path = self.path.display();
        match self.outcome {
            Outcome::Written => out.success(&format!("{}, wrote {}", self.summary, path)),
            Outcome::Unchanged => {
                out.success(&format!("{}, {} already up to date", self.summary, path))
            }
            Outcome::DryRun => out.success(&format!(
                "{} (dry run, {} not written)",
                self.summary, path
            )),
        }
    }
}

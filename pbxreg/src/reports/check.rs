//! Check command report data structures.

use std::path::PathBuf;

use pbxreg_project::Violation;

use super::output::{Output, Report};

/// Report data from project validation.
#[derive(Debug)]
pub struct CheckReport {
    /// Path to the project file.
    pub path: PathBuf,
    /// Number of object records in the project.
    pub records: usize,
    pub errors: Vec<Violation>,
    pub warnings: Vec<Violation>,
}

impl CheckReport {
    /// Whether the check passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        for error in &self.errors {
            out.error(&format!("{} (in {})", error.message, error.id));
        }
        for warning in &self.warnings {
            out.warning(&format!("{} (in {})", warning.message, warning.id));
        }

        let path = self.path.display();
        if self.is_valid() {
            let note = match self.warnings.len() {
                0 => String::new(),
                1 => ", 1 warning".to_string(),
                n => format!(", {n} warnings"),
            };
            out.success(&format!("{path} is valid ({} records{note})", self.records));
        } else {
            let count = self.errors.len();
            out.failure(&format!(
                "{path} has {count} error{}",
                if count == 1 { "" } else { "s" }
            ));
        }
    }
}

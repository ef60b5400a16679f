//! Dedupe operation.

use pbxreg_project::{ProjectFile, Result};

use super::finish;
use crate::reports::{EditReport, Outcome};

/// Execute the dedupe operation.
pub fn dedupe(project: &mut ProjectFile, dry_run: bool) -> Result<EditReport> {
    let changes = project.document_mut().dedupe();
    let (summary, outcome) = if changes.is_empty() {
        ("no duplicate entries".to_string(), Outcome::Unchanged)
    } else {
        (
            format!("applied {} repair(s)", changes.len()),
            finish(project, dry_run)?,
        )
    };

    Ok(EditReport {
        path: project.path().to_path_buf(),
        summary,
        changes,
        warnings: Vec::new(),
        outcome,
    })
}

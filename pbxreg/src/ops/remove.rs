//! Remove operation.

use pbxreg_project::{ObjectId, ProjectFile, Result};

use super::finish;
use crate::reports::EditReport;

/// Execute the remove operation for one or more file references.
///
/// All removals are applied before anything is written; if one fails the
/// file on disk is left as it was.
pub fn remove(project: &mut ProjectFile, file_refs: &[ObjectId], dry_run: bool) -> Result<EditReport> {
    let mut changes = Vec::new();
    let mut build_files = 0;
    for file_ref in file_refs {
        let removal = project.document_mut().remove_source_file(file_ref)?;
        build_files += removal.build_files.len();
        changes.extend(removal.changes);
    }

    let summary = match file_refs {
        [single] => format!("removed {single} and {build_files} build file(s)"),
        many => format!(
            "removed {} file references and {build_files} build file(s)",
            many.len()
        ),
    };
    let outcome = finish(project, dry_run)?;

    Ok(EditReport {
        path: project.path().to_path_buf(),
        summary,
        changes,
        warnings: Vec::new(),
        outcome,
    })
}

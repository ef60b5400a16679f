//! Check operation - project validation.

use pbxreg_project::ProjectFile;

use crate::reports::CheckReport;

/// Execute the check operation.
///
/// Validates every invariant of the loaded document and splits the
/// violations by severity.
pub fn check(project: &ProjectFile) -> CheckReport {
    let document = project.document();
    let (errors, warnings) = document
        .validate()
        .into_iter()
        .partition(|v| v.severity.is_error());

    CheckReport {
        path: project.path().to_path_buf(),
        records: document.records().count(),
        errors,
        warnings,
    }
}

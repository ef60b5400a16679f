//! Add and ensure operations.

use pbxreg_core::FileType;
use pbxreg_project::{AddSourceFile, IdSource, ProjectFile, Result};

use super::finish;
use crate::reports::{EditReport, Outcome};

/// Whether an existing registration of the same path is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Add,
    Ensure,
}

/// Execute the add or ensure operation.
pub fn register(
    project: &mut ProjectFile,
    request: &AddSourceFile,
    mode: Mode,
    ids: &mut dyn IdSource,
    dry_run: bool,
) -> Result<EditReport> {
    let document = project.document_mut();
    let registration = match mode {
        Mode::Add => document.add_source_file(request, ids)?,
        Mode::Ensure => document.ensure_source_file(request, ids)?,
    };

    let mut warnings = Vec::new();
    let file_type = FileType::from_path(&request.path);
    if !file_type.is_source() {
        tracing::warn!(path = %request.path, %file_type, "registering a file that is not compiled");
        warnings.push(format!(
            "{} is {file_type} and will not be compiled by a sources phase",
            request.path
        ));
    }

    let (summary, outcome) = if registration.created {
        (
            format!("registered {}", request.path),
            finish(project, dry_run)?,
        )
    } else {
        (
            format!("{} is already registered", request.path),
            Outcome::Unchanged,
        )
    };

    Ok(EditReport {
        path: project.path().to_path_buf(),
        summary,
        changes: registration.changes,
        warnings,
        outcome,
    })
}

//! Core operations.
//!
//! This module contains the business logic for pbxreg commands,
//! separated from CLI argument parsing and output rendering.

pub mod check;
pub mod dedupe;
pub mod list;
pub mod register;
pub mod remove;

pub use check::check;
pub use dedupe::dedupe;
pub use list::list;
pub use register::{Mode, register};
pub use remove::remove;

use pbxreg_core::WriteResult;
use pbxreg_project::{ProjectFile, Result};

use crate::reports::Outcome;

/// Persist an edited project unless this is a dry run.
fn finish(project: &mut ProjectFile, dry_run: bool) -> Result<Outcome> {
    if !project.is_modified() {
        return Ok(Outcome::Unchanged);
    }
    if dry_run {
        tracing::info!(path = %project.path().display(), "dry run, not writing");
        return Ok(Outcome::DryRun);
    }
    Ok(match project.save()? {
        WriteResult::Written => Outcome::Written,
        WriteResult::Unchanged => Outcome::Unchanged,
    })
}

//! Report data structures for commands.
//!
//! This module provides data structures that separate data collection from rendering.
//! Commands build reports, then render them to an Output target.

mod check;
mod edit;
mod list;
mod output;

pub use check::CheckReport;
pub use edit::{EditReport, Outcome};
pub use list::{GroupInfo, ListReport, TargetInfo};
pub use output::{Report, TerminalOutput};
#[cfg(test)]
pub use output::BufferOutput;

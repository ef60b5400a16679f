//! Core utilities and types for pbxreg.
//!
//! This crate provides the file-system and naming primitives shared by the
//! project editor and the command-line front end.

mod file;
mod file_type;

// File operations
pub use file::{WriteResult, write_atomic};
// Source file classification
pub use file_type::{FileType, display_name};

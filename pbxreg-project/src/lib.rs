//! Reading, editing and validating Xcode `project.pbxproj` files.
//!
//! A [`Document`] keeps every record it does not touch byte for byte, so
//! edits produce minimal diffs:
//!
//! ```no_run
//! use pbxreg_project::{AddSourceFile, ProjectFile, RandomIds};
//!
//! let mut project = ProjectFile::open("App.xcodeproj")?;
//! let request = AddSourceFile::new("LoginView.swift", "Views", ["App"]);
//! project.document_mut().add_source_file(&request, &mut RandomIds)?;
//! project.save()?;
//! # Ok::<(), Box<pbxreg_project::Error>>(())
//! ```

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod document;
mod edit;
mod error;
mod file;
mod id;
pub mod isa;
mod object;
mod parse;
mod record;
mod resolve;
mod validate;
mod value;

pub use document::{DEFAULT_FILENAME, Document};
pub use edit::{AddSourceFile, Change, Registration, Removal};
pub use error::{Error, Result, SourceContext};
pub use file::ProjectFile;
pub use id::{ID_LEN, IdSource, ObjectId, RandomIds, SequentialIds};
pub use object::{BuildFile, BuildPhase, FileReference, Group, Target};
pub use record::Record;
pub use resolve::ResolvedTarget;
pub use validate::{Severity, Violation, ViolationKind};
pub use value::{Dict, Scalar, Value};
pub use pbxreg_core::WriteResult;

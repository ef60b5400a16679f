use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ObjectId;

/// Result type for project operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Source context for error reporting.
///
/// Holds the document text and filename so parse errors can point at the
/// offending bytes.
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    /// Create a new source context.
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    /// Get the source content.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Get the filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    /// Create a parse error pointing at `span`.
    pub fn parse_error(&self, message: impl Into<String>, span: impl Into<SourceSpan>) -> Box<Error> {
        Box::new(Error::Parse {
            src: self.named_source(),
            span: span.into(),
            message: message.into(),
        })
    }

    /// Create an error for a required section or record that is absent.
    pub fn malformed_error(&self, missing: impl Into<String>) -> Box<Error> {
        Box::new(Error::MalformedDocument {
            filename: self.filename.clone(),
            missing: missing.into(),
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to access '{path}'")]
    #[diagnostic(
        code(pbxreg::io),
        help("pass the project with --project <path to .xcodeproj or project.pbxproj>")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse project file: {message}")]
    #[diagnostic(code(pbxreg::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("'{filename}' is not a usable project file: missing {missing}")]
    #[diagnostic(
        code(pbxreg::malformed_document),
        help(
            "a project needs PBXBuildFile and PBXFileReference sections, at least one PBXGroup and at least one PBXSourcesBuildPhase"
        )
    )]
    MalformedDocument { filename: String, missing: String },

    #[error("group '{name}' not found")]
    #[diagnostic(
        code(pbxreg::group_not_found),
        help("run 'pbxreg list' to see the groups in this project")
    )]
    GroupNotFound { name: String },

    #[error("group name '{name}' is ambiguous ({} matches: {})", .ids.len(), join_ids(.ids))]
    #[diagnostic(
        code(pbxreg::ambiguous_group),
        help("use a group path such as 'Parent/{name}' or the group id")
    )]
    AmbiguousGroup { name: String, ids: Vec<ObjectId> },

    #[error("{} not found", describe_targets(.names))]
    #[diagnostic(
        code(pbxreg::target_not_found),
        help("run 'pbxreg list' to see the targets in this project")
    )]
    TargetNotFound { names: Vec<String> },

    #[error("target '{name}' has no sources build phase")]
    #[diagnostic(code(pbxreg::no_sources_phase))]
    NoSourcesPhase { name: String },

    #[error("generated identifier {id} is already in use")]
    #[diagnostic(
        code(pbxreg::identifier_collision),
        help("nothing was written; run the command again to draw fresh identifiers")
    )]
    IdentifierCollision { id: ObjectId },

    #[error("no object with id {id}")]
    #[diagnostic(code(pbxreg::not_found))]
    NotFound { id: ObjectId },

    #[error("object {id} is a {found}, expected a {expected}")]
    #[diagnostic(code(pbxreg::wrong_kind))]
    WrongKind {
        id: ObjectId,
        expected: &'static str,
        found: String,
    },

    #[error("dangling reference: {message}")]
    #[diagnostic(
        code(pbxreg::dangling_reference),
        help("nothing was written; run 'pbxreg check' for the full list of problems")
    )]
    DanglingReference { message: String },

    #[error("invariant violated: {message}")]
    #[diagnostic(
        code(pbxreg::invariant_violation),
        help("nothing was written; 'pbxreg dedupe' repairs duplicate list entries")
    )]
    InvariantViolation { message: String },

    #[error("{message}")]
    #[diagnostic(code(pbxreg::validation_error))]
    Validation { message: String },
}

fn describe_targets(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| format!("'{name}'")).collect();
    match quoted.as_slice() {
        [single] => format!("target {single}"),
        _ => format!("targets {}", quoted.join(", ")),
    }
}

fn join_ids(ids: &[ObjectId]) -> String {
    ids.iter()
        .map(ObjectId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Box<Self> {
        Box::new(Error::Io {
            path: path.into(),
            source,
        })
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Box<Self> {
        Box::new(Error::Validation {
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_span() {
        let ctx = SourceContext::new("{ broken", "project.pbxproj");
        let err = ctx.parse_error("unexpected end of input", (2, 6));

        match *err {
            Error::Parse { span, .. } => {
                assert_eq!(span.offset(), 2);
                assert_eq!(span.len(), 6);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_group_lists_ids() {
        let err = Error::AmbiguousGroup {
            name: "Views".to_string(),
            ids: vec![ObjectId::new("A1").unwrap(), ObjectId::new("B2").unwrap()],
        };

        assert_eq!(
            err.to_string(),
            "group name 'Views' is ambiguous (2 matches: A1, B2)"
        );
    }

    #[test]
    fn test_malformed_names_missing_marker() {
        let ctx = SourceContext::new("", "App.pbxproj");
        let err = ctx.malformed_error("a PBXSourcesBuildPhase record");

        assert_eq!(
            err.to_string(),
            "'App.pbxproj' is not a usable project file: missing a PBXSourcesBuildPhase record"
        );
    }
}

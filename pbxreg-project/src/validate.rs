//! Checks of the registry invariants over a whole document.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{Document, Error, ObjectId, Result, isa, record::Record};

/// Keys whose string value is the id of another object.
const REFERENCE_KEYS: &[&str] = &[
    "baseConfigurationReference",
    "buildConfigurationList",
    "containerPortal",
    "currentVersion",
    "mainGroup",
    "productRef",
    "productRefGroup",
    "productReference",
    "remoteRef",
    "target",
    "targetProxy",
];

/// Keys whose array items are ids of other objects, besides `children` and
/// build phase `files`.
const REFERENCE_LIST_KEYS: &[&str] = &[
    "buildConfigurations",
    "buildPhases",
    "dependencies",
    "packageProductDependencies",
    "packageReferences",
    "targets",
];

/// Severity of a [`Violation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document is inconsistent; edits refuse to commit.
    Error,
    /// Redundant but harmless; `dedupe` or a manual fix cleans it up.
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateId,
    DanglingFileRef,
    DanglingChild,
    DanglingPhaseEntry,
    DanglingReference,
    NotABuildFile,
    MultipleGroups,
    DuplicateChild,
    DuplicatePhaseEntry,
}

impl ViolationKind {
    fn severity(&self) -> Severity {
        match self {
            ViolationKind::DuplicateId
            | ViolationKind::DanglingFileRef
            | ViolationKind::DanglingChild
            | ViolationKind::DanglingPhaseEntry
            | ViolationKind::DanglingReference
            | ViolationKind::NotABuildFile => Severity::Error,
            ViolationKind::MultipleGroups
            | ViolationKind::DuplicateChild
            | ViolationKind::DuplicatePhaseEntry => Severity::Warning,
        }
    }
}

/// One broken invariant found by [`Document::validate`].
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub severity: Severity,
    pub kind: ViolationKind,
    pub message: String,
    /// The record the problem was found in.
    pub id: ObjectId,
}

impl Violation {
    fn new(kind: ViolationKind, id: &ObjectId, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            message: message.into(),
            id: id.clone(),
        }
    }

    fn into_error(self) -> Box<Error> {
        let message = format!("{} (in {})", self.message, self.id);
        Box::new(match self.kind {
            ViolationKind::DanglingFileRef
            | ViolationKind::DanglingChild
            | ViolationKind::DanglingPhaseEntry
            | ViolationKind::DanglingReference => Error::DanglingReference { message },
            _ => Error::InvariantViolation { message },
        })
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} (in {})", self.severity, self.message, self.id)
    }
}

impl Document {
    /// Check every invariant and report all violations in document order.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for id in self.duplicate_ids() {
            violations.push(Violation::new(
                ViolationKind::DuplicateId,
                &id,
                format!("identifier {id} is used by more than one record"),
            ));
        }

        let index = self.index();
        let mut groups_of: IndexMap<&str, Vec<&ObjectId>> = IndexMap::new();
        for record in self.records() {
            let id = record.id();

            if record.is(isa::BUILD_FILE) {
                if let Some(file_ref) = record.get_str("fileRef") {
                    if !index.contains_key(file_ref) {
                        violations.push(Violation::new(
                            ViolationKind::DanglingFileRef,
                            id,
                            format!("build file refers to missing object {file_ref}"),
                        ));
                    }
                }
            }

            if record.get("children").is_some() {
                let mut seen = HashSet::new();
                for child in record.list("children") {
                    if !seen.insert(child) {
                        violations.push(Violation::new(
                            ViolationKind::DuplicateChild,
                            id,
                            format!("{child} is listed more than once in children"),
                        ));
                        continue;
                    }
                    match index.get(child) {
                        None => violations.push(Violation::new(
                            ViolationKind::DanglingChild,
                            id,
                            format!("children lists missing object {child}"),
                        )),
                        Some(r) if r.is(isa::FILE_REFERENCE) => {
                            groups_of.entry(child).or_default().push(id);
                        }
                        Some(_) => {}
                    }
                }
            }

            if isa::is_build_phase(record.isa()) {
                check_phase(&index, record, &mut violations);
            }
            check_references(&index, record, &mut violations);
        }

        for (file_ref, groups) in groups_of {
            if groups.len() > 1 {
                let owners: Vec<&str> = groups.iter().map(|g| g.as_str()).collect();
                violations.push(Violation::new(
                    ViolationKind::MultipleGroups,
                    groups[0],
                    format!(
                        "file reference {file_ref} belongs to {} groups ({})",
                        groups.len(),
                        owners.join(", ")
                    ),
                ));
            }
        }

        violations
    }

    /// Fail on the first error-severity violation anywhere in the document.
    pub(crate) fn verify_integrity(&self) -> Result<()> {
        match self.validate().into_iter().find(|v| v.severity.is_error()) {
            Some(violation) => Err(violation.into_error()),
            None => Ok(()),
        }
    }

    /// Check the exactly-once memberships of records an edit just staged.
    ///
    /// With `in_group` set, `file_ref` must appear exactly once across all
    /// group children. `build_file` must appear exactly once in each phase.
    pub(crate) fn verify_registration(
        &self,
        file_ref: &ObjectId,
        in_group: bool,
        build_file: &ObjectId,
        phases: &[ObjectId],
    ) -> Result<()> {
        if in_group {
            let memberships = self
                .records()
                .filter(|r| isa::CONTAINERS.iter().any(|kind| r.is(kind)))
                .flat_map(|r| r.list("children"))
                .filter(|child| *child == file_ref.as_str())
                .count();
            if memberships != 1 {
                return Err(Box::new(Error::InvariantViolation {
                    message: format!(
                        "file reference {file_ref} would be listed in groups {memberships} times"
                    ),
                }));
            }
        }

        let index = self.index();
        for phase in phases {
            let entries = index
                .get(phase.as_str())
                .map(|r| r.list("files").filter(|f| *f == build_file.as_str()).count())
                .unwrap_or(0);
            if entries != 1 {
                return Err(Box::new(Error::InvariantViolation {
                    message: format!(
                        "build file {build_file} would be listed {entries} times in phase {phase}"
                    ),
                }));
            }
        }
        Ok(())
    }
}

fn check_phase(index: &HashMap<&str, &Record>, phase: &Record, violations: &mut Vec<Violation>) {
    let id = phase.id();
    let mut entries = HashSet::new();
    let mut compiled: HashMap<&str, &str> = HashMap::new();
    for entry in phase.list("files") {
        if !entries.insert(entry) {
            violations.push(Violation::new(
                ViolationKind::DuplicatePhaseEntry,
                id,
                format!("build file {entry} is listed more than once"),
            ));
            continue;
        }
        let Some(record) = index.get(entry) else {
            violations.push(Violation::new(
                ViolationKind::DanglingPhaseEntry,
                id,
                format!("files lists missing object {entry}"),
            ));
            continue;
        };
        if !record.is(isa::BUILD_FILE) {
            violations.push(Violation::new(
                ViolationKind::NotABuildFile,
                id,
                format!("files lists {entry}, which is a {}", record.isa()),
            ));
            continue;
        }
        if let Some(file_ref) = record.get_str("fileRef") {
            if let Some(first) = compiled.insert(file_ref, entry) {
                violations.push(Violation::new(
                    ViolationKind::DuplicatePhaseEntry,
                    id,
                    format!("file reference {file_ref} is built by both {first} and {entry}"),
                ));
            }
        }
    }
}

/// Scalar and list references outside `children`, `files` and `fileRef`.
fn check_references(
    index: &HashMap<&str, &Record>,
    record: &Record,
    violations: &mut Vec<Violation>,
) {
    let scalars = REFERENCE_KEYS
        .iter()
        .filter_map(|key| Some((*key, record.get_str(key)?)));
    let lists = REFERENCE_LIST_KEYS
        .iter()
        .flat_map(|key| record.list(key).map(move |item| (*key, item)));
    for (key, target) in scalars.chain(lists) {
        if !index.contains_key(target) {
            violations.push(Violation::new(
                ViolationKind::DanglingReference,
                record.id(),
                format!("{key} refers to missing object {target}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(objects: &str) -> Document {
        format!(
            "// !$*UTF8*$!\n{{\n\tobjects = {{\n{objects}\t}};\n}}\n"
        )
        .parse()
        .unwrap()
    }

    const CLEAN: &str = "\
/* Begin PBXBuildFile section */
\t\tB1 /* a.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* a.swift */; };
/* End PBXBuildFile section */
/* Begin PBXFileReference section */
\t\tF1 /* a.swift */ = {isa = PBXFileReference; path = a.swift; sourceTree = \"<group>\"; };
/* End PBXFileReference section */
/* Begin PBXGroup section */
\t\tG1 = {isa = PBXGroup; children = (F1, ); sourceTree = \"<group>\"; };
/* End PBXGroup section */
/* Begin PBXSourcesBuildPhase section */
\t\tP1 = {isa = PBXSourcesBuildPhase; files = (B1, ); };
/* End PBXSourcesBuildPhase section */
";

    #[test]
    fn test_clean_document_has_no_violations() {
        let doc = doc(CLEAN);
        assert!(doc.validate().is_empty());
        assert!(doc.verify_integrity().is_ok());
    }

    #[test]
    fn test_dangling_references_are_errors() {
        let objects = CLEAN
            .replace("fileRef = F1", "fileRef = F9")
            .replace("children = (F1, )", "children = (F1, F8, )")
            .replace("files = (B1, )", "files = (B1, B7, )");
        let doc = doc(&objects);

        let kinds: Vec<_> = doc.validate().iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::DanglingFileRef,
                ViolationKind::DanglingChild,
                ViolationKind::DanglingPhaseEntry,
            ]
        );
        assert!(matches!(
            *doc.verify_integrity().unwrap_err(),
            Error::DanglingReference { .. }
        ));
    }

    #[test]
    fn test_object_references_must_resolve() {
        let objects = format!(
            "{CLEAN}\
/* Begin PBXNativeTarget section */
\t\tT1 = {{isa = PBXNativeTarget; buildPhases = (P1, P9, ); productReference = F1; buildConfigurationList = L1; }};
/* End PBXNativeTarget section */
"
        );
        let doc = doc(&objects);

        let messages: Vec<_> = doc.validate().into_iter().map(|v| v.message).collect();
        insta::assert_debug_snapshot!(messages, @r#"
        [
            "buildConfigurationList refers to missing object L1",
            "buildPhases refers to missing object P9",
        ]
        "#);
        assert!(matches!(
            *doc.verify_integrity().unwrap_err(),
            Error::DanglingReference { .. }
        ));
    }

    #[test]
    fn test_large_document_validates_cleanly() {
        let mut objects = String::from("/* Begin PBXBuildFile section */\n");
        for i in 0..5000 {
            objects.push_str(&format!(
                "\t\tB{i} = {{isa = PBXBuildFile; fileRef = F{i}; }};\n"
            ));
        }
        objects.push_str("/* End PBXBuildFile section */\n/* Begin PBXFileReference section */\n");
        for i in 0..5000 {
            objects.push_str(&format!(
                "\t\tF{i} = {{isa = PBXFileReference; path = f{i}.swift; }};\n"
            ));
        }
        let children: String = (0..5000).map(|i| format!("F{i}, ")).collect();
        let files: String = (0..5000).map(|i| format!("B{i}, ")).collect();
        objects.push_str(&format!(
            "/* End PBXFileReference section */\n\
/* Begin PBXGroup section */\n\t\tG1 = {{isa = PBXGroup; children = ({children}); }};\n/* End PBXGroup section */\n\
/* Begin PBXSourcesBuildPhase section */\n\t\tP1 = {{isa = PBXSourcesBuildPhase; files = ({files}); }};\n/* End PBXSourcesBuildPhase section */\n"
        ));

        assert!(doc(&objects).validate().is_empty());
    }

    #[test]
    fn test_duplicate_memberships_are_warnings() {
        let objects = CLEAN.replace("files = (B1, )", "files = (B1, B1, )");
        let doc = doc(&objects);

        let violations = doc.validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DuplicatePhaseEntry);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert!(doc.verify_integrity().is_ok());
    }

    #[test]
    fn test_phase_entry_must_be_build_file() {
        let objects = CLEAN.replace("files = (B1, )", "files = (F1, )");
        let violations = doc(&objects).validate();
        assert!(
            violations
                .iter()
                .any(|v| v.kind == ViolationKind::NotABuildFile)
        );
    }

    #[test]
    fn test_verify_registration_counts_memberships() {
        let doc = doc(CLEAN);
        let f1 = ObjectId::new("F1").unwrap();
        let b1 = ObjectId::new("B1").unwrap();
        let p1 = ObjectId::new("P1").unwrap();
        assert!(doc.verify_registration(&f1, true, &b1, &[p1.clone()]).is_ok());

        let doubled = self::doc(&CLEAN.replace("files = (B1, )", "files = (B1, B1, )"));
        assert!(matches!(
            *doubled.verify_registration(&f1, true, &b1, &[p1]).unwrap_err(),
            Error::InvariantViolation { .. }
        ));
    }

    #[test]
    fn test_violation_serializes_lowercase() {
        let doc = doc(&CLEAN.replace("files = (B1, )", "files = (B1, B1, )"));
        let json = serde_json::to_value(&doc.validate()[0]).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["kind"], "duplicate_phase_entry");
        assert_eq!(json["id"], "P1");
    }
}

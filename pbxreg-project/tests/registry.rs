//! End-to-end tests of loading, editing and serializing project documents.

use pbxreg_project::{
    AddSourceFile, Document, Error, IdSource, ObjectId, SequentialIds, Severity, ViolationKind,
};

const FIXTURE: &str = include_str!("fixtures/Main.pbxproj");

fn fixture() -> Document {
    Document::parse(FIXTURE, "Main.pbxproj").expect("fixture parses")
}

fn ids() -> SequentialIds {
    SequentialIds::new("AB")
}

fn id(s: &str) -> ObjectId {
    ObjectId::new(s).unwrap()
}

fn list<'a>(doc: &'a Document, record: &str, key: &str) -> Vec<&'a str> {
    doc.record(record).unwrap().list(key).collect()
}

fn lines(changes: &[pbxreg_project::Change]) -> String {
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap `objects` in the minimal text around an objects dictionary.
fn document(objects: &str) -> Document {
    format!("// !$*UTF8*$!\n{{\n\tobjects = {{\n{objects}\t}};\n}}\n")
        .parse()
        .unwrap()
}

#[test]
fn test_round_trip_is_identity() {
    let doc = fixture();
    assert_eq!(doc.to_string(), FIXTURE);
    assert!(!doc.is_modified());
    assert!(doc.validate().is_empty());
}

#[test]
fn test_add_appends_to_group_and_phase_in_order() {
    let mut doc = fixture();
    let request = AddSourceFile::new("Bar.swift", "Views", ["Main"]);
    let registration = doc.add_source_file(&request, &mut ids()).unwrap();

    assert!(registration.created);
    assert_eq!(registration.file_ref.as_str(), "AB0000000000000000000001");
    assert_eq!(registration.build_file.as_str(), "AB0000000000000000000002");
    assert_eq!(
        list(&doc, "G1", "children"),
        vec!["A1", "AB0000000000000000000001"]
    );
    assert_eq!(
        list(&doc, "P1", "files"),
        vec!["B1", "AB0000000000000000000002"]
    );
    assert!(doc.validate().is_empty());

    insta::assert_snapshot!(lines(&registration.changes), @r"
    + added PBXFileReference AB0000000000000000000001 (Bar.swift)
    + added to group 'Views'
    + added PBXBuildFile AB0000000000000000000002 (Bar.swift in Sources)
    + added to sources of target 'Main'
    ");
}

#[test]
fn test_add_renders_new_records_in_xcode_layout() {
    let mut doc = fixture();
    let request = AddSourceFile::new("Bar.swift", "Views", ["Main"]);
    doc.add_source_file(&request, &mut ids()).unwrap();
    let out = doc.to_string();

    let file_ref = "\t\tAB0000000000000000000001 /* Bar.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = Bar.swift; sourceTree = \"<group>\"; };\n";
    let build_file = "\t\tAB0000000000000000000002 /* Bar.swift in Sources */ = {isa = PBXBuildFile; fileRef = AB0000000000000000000001 /* Bar.swift */; };\n";
    let group = "\t\tG1 /* Views */ = {\n\t\t\tisa = PBXGroup;\n\t\t\tchildren = (\n\t\t\t\tA1 /* Foo.swift */,\n\t\t\t\tAB0000000000000000000001 /* Bar.swift */,\n\t\t\t);\n\t\t\tpath = Views;\n\t\t\tsourceTree = \"<group>\";\n\t\t};\n";
    assert!(out.contains(file_ref));
    assert!(out.contains(build_file));
    assert!(out.contains(group));

    // New records go last in their section.
    let file_ref_at = out.find(file_ref).unwrap();
    assert!(out.find("C20000000000000000000005 /* MainTests.xctest */").unwrap() < file_ref_at);
    assert!(file_ref_at < out.find("/* End PBXFileReference section */").unwrap());

    // Records the edit did not touch are unchanged.
    assert!(out.contains("\t\tP1 /* Sources */ = {\n\t\t\tisa = PBXSourcesBuildPhase;"));
    assert!(out.contains("\t\t\tLD_RUNPATH_SEARCH_PATHS = (\n\t\t\t\t\t\"$(inherited)\","));
}

#[test]
fn test_add_same_path_twice_creates_two_references() {
    let mut doc = fixture();
    let mut ids = ids();
    let request = AddSourceFile::new("Bar.swift", "Views", ["Main"]);
    let first = doc.add_source_file(&request, &mut ids).unwrap();
    let second = doc.add_source_file(&request, &mut ids).unwrap();

    assert_ne!(first.file_ref, second.file_ref);
    assert_eq!(doc.find_file_references("Bar.swift").len(), 2);
    assert_eq!(list(&doc, "G1", "children").len(), 3);
}

#[test]
fn test_ensure_does_not_duplicate() {
    let mut doc = fixture();
    let mut ids = ids();
    let request = AddSourceFile::new("Bar.swift", "Views", ["Main"]);

    let first = doc.ensure_source_file(&request, &mut ids).unwrap();
    assert!(first.created);
    let after_first = doc.to_string();

    let second = doc.ensure_source_file(&request, &mut ids).unwrap();
    assert!(!second.created);
    assert_eq!(second.file_ref, first.file_ref);
    assert_eq!(second.build_file, first.build_file);
    assert_eq!(doc.to_string(), after_first);
}

#[test]
fn test_ensure_adds_missing_target_membership() {
    let mut doc = fixture();
    let request = AddSourceFile::new("Foo.swift", "Views", ["Main", "MainTests"]);
    let registration = doc.ensure_source_file(&request, &mut ids()).unwrap();

    assert!(registration.created);
    assert_eq!(registration.file_ref.as_str(), "A1");
    assert_eq!(
        list(&doc, "C70000000000000000000001", "files"),
        vec!["C10000000000000000000003", "B1"]
    );
    assert_eq!(list(&doc, "P1", "files"), vec!["B1"]);
    insta::assert_snapshot!(lines(&registration.changes), @r"
    = reusing PBXFileReference A1 (Foo.swift)
    = reusing PBXBuildFile B1 (Foo.swift in Sources)
    + added to sources of target 'MainTests'
    ");
}

#[test]
fn test_remove_twice_is_not_found() {
    let mut doc = fixture();
    let removal = doc.remove_source_file(&id("A1")).unwrap();
    assert_eq!(removal.build_files, vec![id("B1")]);
    assert!(list(&doc, "G1", "children").is_empty());
    assert!(list(&doc, "P1", "files").is_empty());
    assert!(doc.validate().is_empty());

    let after_first = doc.to_string();
    let err = doc.remove_source_file(&id("A1")).unwrap_err();
    assert!(matches!(*err, Error::NotFound { .. }));
    assert_eq!(doc.to_string(), after_first);
}

#[test]
fn test_add_then_remove_restores_document() {
    let mut doc = fixture();
    let request = AddSourceFile::new("Bar.swift", "Views", ["Main", "MainTests"]);
    let registration = doc.add_source_file(&request, &mut ids()).unwrap();
    doc.remove_source_file(&registration.file_ref).unwrap();

    assert_eq!(doc.to_string(), FIXTURE);
}

#[test]
fn test_remove_clears_every_duplicate() {
    let mut doc = document(
        "\
/* Begin PBXBuildFile section */
\t\tB1 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
\t\tB2 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
\t\tB3 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
/* End PBXBuildFile section */
/* Begin PBXFileReference section */
\t\tF1 /* Foo.swift */ = {isa = PBXFileReference; path = Foo.swift; sourceTree = \"<group>\"; };
\t\tF2 /* Bar.swift */ = {isa = PBXFileReference; path = Bar.swift; sourceTree = \"<group>\"; };
/* End PBXFileReference section */
/* Begin PBXGroup section */
\t\tG1 /* Views */ = {isa = PBXGroup; children = (F1, F2, F1, F1, ); path = Views; sourceTree = \"<group>\"; };
/* End PBXGroup section */
/* Begin PBXSourcesBuildPhase section */
\t\tP1 = {isa = PBXSourcesBuildPhase; files = (B1, B2, B3, ); };
/* End PBXSourcesBuildPhase section */
",
    );

    let removal = doc.remove_source_file(&id("F1")).unwrap();
    assert_eq!(removal.build_files, vec![id("B1"), id("B2"), id("B3")]);
    assert_eq!(list(&doc, "G1", "children"), vec!["F2"]);
    assert!(list(&doc, "P1", "files").is_empty());
    assert_eq!(doc.ids().collect::<Vec<_>>(), vec!["F2", "G1", "P1"]);
    assert!(doc.validate().is_empty());
}

#[test]
fn test_remove_clears_duplicated_records() {
    let mut doc = document(
        "\
/* Begin PBXBuildFile section */
\t\tB1 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
\t\tB1 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
\t\tB1 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
/* End PBXBuildFile section */
/* Begin PBXFileReference section */
\t\tF1 /* Foo.swift */ = {isa = PBXFileReference; path = Foo.swift; sourceTree = \"<group>\"; };
/* End PBXFileReference section */
/* Begin PBXGroup section */
\t\tG1 /* Views */ = {isa = PBXGroup; children = (F1, F1, F1, ); path = Views; sourceTree = \"<group>\"; };
/* End PBXGroup section */
/* Begin PBXSourcesBuildPhase section */
\t\tP1 = {isa = PBXSourcesBuildPhase; files = (B1, B1, B1, ); };
/* End PBXSourcesBuildPhase section */
",
    );
    assert!(
        doc.validate()
            .iter()
            .any(|v| v.kind == ViolationKind::DuplicateId && v.severity == Severity::Error)
    );

    let removal = doc.remove_source_file(&id("F1")).unwrap();
    assert_eq!(removal.build_files, vec![id("B1")]);
    assert!(!doc.contains("B1"));
    assert!(list(&doc, "G1", "children").is_empty());
    assert!(list(&doc, "P1", "files").is_empty());
    assert!(doc.validate().is_empty());
}

#[test]
fn test_identifier_collision_leaves_document_unchanged() {
    struct Colliding;
    impl IdSource for Colliding {
        fn next_id(&mut self) -> ObjectId {
            ObjectId::new("A1").unwrap()
        }
    }

    let mut doc = fixture();
    let request = AddSourceFile::new("Bar.swift", "Views", ["Main"]);
    let err = doc.add_source_file(&request, &mut Colliding).unwrap_err();

    assert!(matches!(*err, Error::IdentifierCollision { ref id } if id.as_str() == "A1"));
    assert_eq!(doc.to_string(), FIXTURE);
}

#[test]
fn test_unresolved_inputs_leave_document_unchanged() {
    let mut doc = fixture();

    let err = doc
        .add_source_file(&AddSourceFile::new("Bar.swift", "Models", ["Main"]), &mut ids())
        .unwrap_err();
    assert!(matches!(*err, Error::GroupNotFound { ref name } if name == "Models"));

    let err = doc
        .add_source_file(
            &AddSourceFile::new("Bar.swift", "Views", ["Main", "Widget"]),
            &mut ids(),
        )
        .unwrap_err();
    assert!(matches!(*err, Error::TargetNotFound { ref names } if names == &["Widget"]));

    assert_eq!(doc.to_string(), FIXTURE);
}

#[test]
fn test_every_missing_target_is_reported() {
    let mut doc = fixture();
    let request = AddSourceFile::new("Bar.swift", "Views", ["Widget", "Main", "Watch"]);
    let err = doc.add_source_file(&request, &mut ids()).unwrap_err();

    assert!(matches!(*err, Error::TargetNotFound { ref names } if names == &["Widget", "Watch"]));
    assert_eq!(err.to_string(), "targets 'Widget', 'Watch' not found");
    assert_eq!(doc.to_string(), FIXTURE);
}

#[test]
fn test_remove_refuses_file_still_used_as_product() {
    let mut doc = fixture();
    let err = doc
        .remove_source_file(&id("C20000000000000000000004"))
        .unwrap_err();

    assert!(matches!(*err, Error::DanglingReference { .. }));
    assert!(err.to_string().contains("productReference"), "{err}");
    assert_eq!(doc.to_string(), FIXTURE);
}

#[test]
fn test_ensure_does_not_reuse_resources_build_file() {
    let mut doc = fixture();
    let request = AddSourceFile::new("Assets.xcassets", "Main", ["Main"]);
    let registration = doc.ensure_source_file(&request, &mut ids()).unwrap();

    assert!(registration.created);
    assert_eq!(registration.file_ref.as_str(), "C20000000000000000000002");
    assert_eq!(registration.build_file.as_str(), "AB0000000000000000000001");
    assert_eq!(
        list(&doc, "P1", "files"),
        vec!["B1", "AB0000000000000000000001"]
    );
    assert_eq!(
        list(&doc, "C60000000000000000000001", "files"),
        vec!["C10000000000000000000002"]
    );
    assert!(doc.validate().is_empty());
}

#[test]
fn test_rewritten_record_keeps_escapes_verbatim() {
    let text = FIXTURE.replace(
        "\t\t\tpath = Views;",
        "\t\t\tname = \"caf\\U00e9\";\n\t\t\tpath = Views;",
    );
    let mut doc = Document::parse(&text, "Main.pbxproj").unwrap();
    doc.add_source_file(&AddSourceFile::new("Bar.swift", "G1", ["Main"]), &mut ids())
        .unwrap();

    let output = doc.to_string();
    assert!(output.contains(r#"name = "caf\U00e9";"#), "{output}");
    assert!(!output.contains(r#"caf\\U00e9"#));
}

#[test]
fn test_add_to_nested_group_path() {
    let mut doc = fixture();
    let request = AddSourceFile::new("Bar.swift", "Main/Views", ["Main"]);
    doc.add_source_file(&request, &mut ids()).unwrap();
    assert_eq!(list(&doc, "G1", "children").len(), 2);
}

#[test]
fn test_operations_never_leave_dangling_references() {
    let mut doc = fixture();
    let mut ids = ids();
    let mut added = Vec::new();
    for name in ["One.swift", "Two.swift", "Three.swift"] {
        let request = AddSourceFile::new(name, "Views", ["Main", "MainTests"]);
        added.push(doc.add_source_file(&request, &mut ids).unwrap().file_ref);
    }
    doc.remove_source_file(&added[1]).unwrap();
    doc.remove_source_file(&id("A1")).unwrap();
    doc.remove_source_file(&id("C20000000000000000000003")).unwrap();

    let errors: Vec<_> = doc
        .validate()
        .into_iter()
        .filter(|v| v.severity.is_error())
        .collect();
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        list(&doc, "P1", "files"),
        vec!["AB0000000000000000000002", "AB0000000000000000000006"]
    );
}

#[test]
fn test_find_file_references() {
    let doc = fixture();
    assert_eq!(doc.find_file_references("Foo.swift"), vec![id("A1")]);
    assert!(doc.find_file_references("Missing.swift").is_empty());
}

#[test]
fn test_dedupe_triple_listed_build_file() {
    let mut doc = document(
        "\
/* Begin PBXBuildFile section */
\t\tB1 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
\t\tB2 /* Foo.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* Foo.swift */; };
/* End PBXBuildFile section */
/* Begin PBXFileReference section */
\t\tF1 /* Foo.swift */ = {isa = PBXFileReference; path = Foo.swift; sourceTree = \"<group>\"; };
/* End PBXFileReference section */
/* Begin PBXGroup section */
\t\tG1 /* Views */ = {isa = PBXGroup; children = (F1, F1, ); path = Views; sourceTree = \"<group>\"; };
/* End PBXGroup section */
/* Begin PBXSourcesBuildPhase section */
\t\tP1 /* Sources */ = {isa = PBXSourcesBuildPhase; files = (B1, B1, B2, B1, ); };
/* End PBXSourcesBuildPhase section */
",
    );

    let changes = doc.dedupe();
    insta::assert_snapshot!(lines(&changes), @r"
    - removed F1 from children of 'Views'
    - removed 2 entries of B1 from files of 'Sources'
    - removed B2 from files of 'Sources'
    - removed PBXBuildFile B2 (Foo.swift in Sources)
    ");
    assert_eq!(list(&doc, "G1", "children"), vec!["F1"]);
    assert_eq!(list(&doc, "P1", "files"), vec!["B1"]);
    assert!(!doc.contains("B2"));
    assert!(doc.validate().is_empty());

    assert!(doc.dedupe().is_empty());
}

#[test]
fn test_missing_sections_are_malformed() {
    let start = FIXTURE.find("/* Begin PBXBuildFile section */").unwrap();
    let end = FIXTURE.find("/* Begin PBXFileReference section */").unwrap();
    let text = format!("{}{}", &FIXTURE[..start], &FIXTURE[end..]);

    let err = Document::parse(&text, "Main.pbxproj").unwrap_err();
    assert_eq!(
        err.to_string(),
        "'Main.pbxproj' is not a usable project file: missing the PBXBuildFile section"
    );

    let text = FIXTURE.replace("isa = PBXSourcesBuildPhase;", "isa = PBXHeadersBuildPhase;");
    let err = Document::parse(&text, "Main.pbxproj").unwrap_err();
    assert!(matches!(*err, Error::MalformedDocument { ref missing, .. } if missing == "a PBXSourcesBuildPhase record"));
}

#[test]
fn test_unterminated_section_is_parse_error() {
    let text = FIXTURE.replace("/* End PBXGroup section */\n", "");
    let err = Document::parse(&text, "Main.pbxproj").unwrap_err();
    match *err {
        Error::Parse { message, span, .. } => {
            assert_eq!(message, "missing '/* End PBXGroup section */'");
            assert_eq!(
                span.offset(),
                FIXTURE.find("/* Begin PBXGroup section */").unwrap()
            );
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

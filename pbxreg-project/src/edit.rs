//! Transactional edits: registering, removing and deduplicating source files.
//!
//! Every operation resolves its inputs against the document first, then
//! stages the mutation on a copy, validates the copy and only then replaces
//! the document. A failed edit leaves the document untouched.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use pbxreg_core::{FileType, display_name};

use crate::{
    Document, Error, ObjectId, Result,
    id::{IdAllocator, IdSource},
    isa,
    object::BuildFile,
    record::Record,
    resolve::ResolvedTarget,
    value::{Dict, Value},
};

/// A request to register one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSourceFile {
    /// Path of the file relative to its group, e.g. `Views/LoginView.swift`.
    pub path: String,
    /// Group name, `Parent/Child` path or group id.
    pub group: String,
    /// Names of the targets that compile the file.
    pub targets: Vec<String>,
}

impl AddSourceFile {
    pub fn new(
        path: impl Into<String>,
        group: impl Into<String>,
        targets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            path: path.into(),
            group: group.into(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(Error::validation("file path must not be empty"));
        }
        if self.targets.is_empty() {
            return Err(Error::validation(format!(
                "no target given for '{}'; pass at least one target",
                self.path
            )));
        }
        Ok(())
    }
}

/// One applied step of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    AddedRecord {
        kind: &'static str,
        id: ObjectId,
        name: String,
    },
    ReusedRecord {
        kind: &'static str,
        id: ObjectId,
        name: String,
    },
    AddedToGroup {
        group: String,
        id: ObjectId,
    },
    AddedToPhase {
        target: String,
        id: ObjectId,
    },
    RemovedRecord {
        kind: String,
        id: ObjectId,
        name: String,
    },
    RemovedFromList {
        owner: String,
        key: &'static str,
        id: String,
        count: usize,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::AddedRecord { kind, id, name } => write!(f, "+ added {kind} {id} ({name})"),
            Change::ReusedRecord { kind, id, name } => {
                write!(f, "= reusing {kind} {id} ({name})")
            }
            Change::AddedToGroup { group, .. } => write!(f, "+ added to group '{group}'"),
            Change::AddedToPhase { target, .. } => {
                write!(f, "+ added to sources of target '{target}'")
            }
            Change::RemovedRecord { kind, id, name } => {
                write!(f, "- removed {kind} {id} ({name})")
            }
            Change::RemovedFromList {
                owner,
                key,
                id,
                count: 1,
            } => write!(f, "- removed {id} from {key} of '{owner}'"),
            Change::RemovedFromList {
                owner,
                key,
                id,
                count,
            } => write!(f, "- removed {count} entries of {id} from {key} of '{owner}'"),
        }
    }
}

/// Outcome of [`Document::add_source_file`] and [`Document::ensure_source_file`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub file_ref: ObjectId,
    pub build_file: ObjectId,
    /// Whether the edit changed the document at all.
    pub created: bool,
    pub changes: Vec<Change>,
}

/// Outcome of [`Document::remove_source_file`].
#[derive(Debug, Clone)]
pub struct Removal {
    pub file_ref: ObjectId,
    pub build_files: Vec<ObjectId>,
    pub changes: Vec<Change>,
}

/// Inputs of a registration, resolved against the unmodified document.
struct Plan {
    group: ObjectId,
    group_name: String,
    targets: Vec<ResolvedTarget>,
}

impl Document {
    fn plan(&self, request: &AddSourceFile) -> Result<Plan> {
        request.validate()?;
        let group = self.resolve_group(&request.group)?;
        let group_name = self
            .group(group.as_str())
            .and_then(|g| g.name())
            .unwrap_or(request.group.as_str())
            .to_string();

        let mut targets: Vec<ResolvedTarget> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        let mut first_error = None;
        for name in &request.targets {
            match self.resolve_target(name) {
                Ok(target) => {
                    if !targets.iter().any(|t| t.phase == target.phase) {
                        targets.push(target);
                    }
                }
                Err(err) => match *err {
                    Error::TargetNotFound { names } => missing.extend(names),
                    other => {
                        first_error.get_or_insert(other);
                    }
                },
            }
        }
        if !missing.is_empty() {
            return Err(Box::new(Error::TargetNotFound { names: missing }));
        }
        if let Some(err) = first_error {
            return Err(Box::new(err));
        }
        Ok(Plan {
            group,
            group_name,
            targets,
        })
    }

    /// Register `request.path` as a new file in a group and the sources phase
    /// of each target.
    ///
    /// Adding the same path twice creates two independent file references.
    pub fn add_source_file(
        &mut self,
        request: &AddSourceFile,
        ids: &mut dyn IdSource,
    ) -> Result<Registration> {
        let plan = self.plan(request)?;
        let mut alloc = IdAllocator::new(self.ids(), ids);
        let file_ref = alloc.allocate()?;
        let build_file = alloc.allocate()?;

        let mut working = self.clone();
        let mut changes = Vec::new();
        working.stage_file_reference(&file_ref, &request.path, &plan, &mut changes)?;
        working.stage_build_file(&build_file, &file_ref, &request.path, &mut changes)?;
        for target in &plan.targets {
            working.stage_phase_entry(&build_file, &request.path, target, &mut changes)?;
        }

        let phases: Vec<ObjectId> = plan.targets.iter().map(|t| t.phase.clone()).collect();
        working.verify_integrity()?;
        working.verify_registration(&file_ref, true, &build_file, &phases)?;
        *self = working;

        tracing::info!(
            path = %request.path,
            %file_ref,
            %build_file,
            steps = changes.len(),
            "registered source file"
        );
        Ok(Registration {
            file_ref,
            build_file,
            created: true,
            changes,
        })
    }

    /// Like [`Document::add_source_file`], but reuses a file reference the
    /// group already holds for `request.path` and only adds what is missing.
    pub fn ensure_source_file(
        &mut self,
        request: &AddSourceFile,
        ids: &mut dyn IdSource,
    ) -> Result<Registration> {
        let plan = self.plan(request)?;
        let existing = self
            .group(plan.group.as_str())
            .into_iter()
            .flat_map(|g| g.children())
            .filter_map(|child| self.file_reference(child))
            .find(|f| f.matches_path(&request.path))
            .map(|f| f.id().clone());
        let Some(existing) = existing else {
            return self.add_source_file(request, ids);
        };

        let mut alloc = IdAllocator::new(self.ids(), ids);
        let mut working = self.clone();
        let mut changes = vec![Change::ReusedRecord {
            kind: isa::FILE_REFERENCE,
            id: existing.clone(),
            name: display_name(&request.path).to_string(),
        }];

        let index = self.index();
        let needed: Vec<&ResolvedTarget> = plan
            .targets
            .iter()
            .filter(|t| phase_build_file(&index, &t.phase, &existing).is_none())
            .collect();
        let reusable = self.reusable_build_file(&existing).or_else(|| {
            plan.targets
                .iter()
                .find_map(|t| phase_build_file(&index, &t.phase, &existing))
                .filter(|_| needed.is_empty())
        });
        let build_file = match reusable {
            Some(found) => {
                changes.push(Change::ReusedRecord {
                    kind: isa::BUILD_FILE,
                    id: found.id().clone(),
                    name: found.display_name().to_string(),
                });
                found.id().clone()
            }
            None => {
                let id = alloc.allocate()?;
                working.stage_build_file(&id, &existing, &request.path, &mut changes)?;
                id
            }
        };

        let mut phases = Vec::new();
        for target in needed {
            working.stage_phase_entry(&build_file, &request.path, target, &mut changes)?;
            phases.push(target.phase.clone());
        }

        let created = changes
            .iter()
            .any(|c| !matches!(c, Change::ReusedRecord { .. }));
        if created {
            working.verify_integrity()?;
            working.verify_registration(&existing, false, &build_file, &phases)?;
            *self = working;
            tracing::info!(path = %request.path, file_ref = %existing, "completed registration");
        } else {
            tracing::info!(path = %request.path, file_ref = %existing, "already registered");
        }

        Ok(Registration {
            file_ref: existing,
            build_file,
            created,
            changes,
        })
    }

    /// The first build file of `file_ref` that no phase other than a sources
    /// phase lists. A build file shared with a resources or frameworks phase
    /// is never reused for compilation.
    fn reusable_build_file(&self, file_ref: &ObjectId) -> Option<BuildFile<'_>> {
        self.build_files()
            .filter(|b| b.file_ref() == Some(file_ref.as_str()))
            .find(|b| {
                self.build_phases()
                    .filter(|phase| phase.files().any(|entry| entry == b.id().as_str()))
                    .all(|phase| phase.is_sources())
            })
    }

    fn stage_file_reference(
        &mut self,
        id: &ObjectId,
        path: &str,
        plan: &Plan,
        changes: &mut Vec<Change>,
    ) -> Result<()> {
        let name = display_name(path);
        let mut body = Dict::new();
        body.insert("isa".into(), Value::string(isa::FILE_REFERENCE));
        body.insert(
            "lastKnownFileType".into(),
            Value::string(FileType::from_path(path).as_str()),
        );
        if name != path {
            body.insert("name".into(), Value::string(name));
        }
        body.insert("path".into(), Value::string(path));
        body.insert("sourceTree".into(), Value::string("<group>"));
        self.push_record(Record::new(id.clone(), Some(name.to_string()), body))?;
        changes.push(Change::AddedRecord {
            kind: isa::FILE_REFERENCE,
            id: id.clone(),
            name: name.to_string(),
        });

        let group = self
            .record_mut(plan.group.as_str())
            .ok_or_else(|| Error::validation(format!("group {} disappeared", plan.group)))?;
        group.push_to_list("children", Value::reference(id, Some(name)));
        tracing::debug!(%id, group = %plan.group, "staged group child");
        changes.push(Change::AddedToGroup {
            group: plan.group_name.clone(),
            id: id.clone(),
        });
        Ok(())
    }

    fn stage_build_file(
        &mut self,
        id: &ObjectId,
        file_ref: &ObjectId,
        path: &str,
        changes: &mut Vec<Change>,
    ) -> Result<()> {
        let name = display_name(path);
        let comment = format!("{name} in Sources");
        let mut body = Dict::new();
        body.insert("isa".into(), Value::string(isa::BUILD_FILE));
        body.insert("fileRef".into(), Value::reference(file_ref, Some(name)));
        self.push_record(Record::new(id.clone(), Some(comment.clone()), body))?;
        changes.push(Change::AddedRecord {
            kind: isa::BUILD_FILE,
            id: id.clone(),
            name: comment,
        });
        Ok(())
    }

    fn stage_phase_entry(
        &mut self,
        build_file: &ObjectId,
        path: &str,
        target: &ResolvedTarget,
        changes: &mut Vec<Change>,
    ) -> Result<()> {
        let comment = format!("{} in Sources", display_name(path));
        let phase = self
            .record_mut(target.phase.as_str())
            .ok_or_else(|| Error::validation(format!("phase {} disappeared", target.phase)))?;
        phase.push_to_list("files", Value::reference(build_file, Some(&comment)));
        tracing::debug!(%build_file, phase = %target.phase, "staged phase entry");
        changes.push(Change::AddedToPhase {
            target: target.name.clone(),
            id: build_file.clone(),
        });
        Ok(())
    }

    /// File references whose `path`, `name` or display name equals `path`.
    pub fn find_file_references(&self, path: &str) -> Vec<ObjectId> {
        let mut found: Vec<ObjectId> = Vec::new();
        for file in self.file_references() {
            if file.matches_path(path) && !found.contains(file.id()) {
                found.push(file.id().clone());
            }
        }
        found
    }

    /// Remove a file reference, every build file of it and every list entry
    /// mentioning any of them.
    ///
    /// Every record carrying the id is removed, so duplicated records go too.
    pub fn remove_source_file(&mut self, file_ref: &ObjectId) -> Result<Removal> {
        let record = self
            .record(file_ref.as_str())
            .ok_or_else(|| Box::new(Error::NotFound { id: file_ref.clone() }))?;
        if !record.is(isa::FILE_REFERENCE) {
            return Err(Box::new(Error::WrongKind {
                id: file_ref.clone(),
                expected: isa::FILE_REFERENCE,
                found: record.isa().to_string(),
            }));
        }

        let mut build_files: Vec<ObjectId> = Vec::new();
        for build_file in self.build_files() {
            if build_file.file_ref() == Some(file_ref.as_str())
                && !build_files.contains(build_file.id())
            {
                build_files.push(build_file.id().clone());
            }
        }
        let doomed: HashSet<&str> = std::iter::once(file_ref.as_str())
            .chain(build_files.iter().map(ObjectId::as_str))
            .collect();
        self.check_unreferenced(&doomed)?;

        let mut working = self.clone();
        let mut changes = Vec::new();
        for removed in working.remove_records(|r| doomed.contains(r.id().as_str())) {
            changes.push(Change::RemovedRecord {
                kind: removed.isa().to_string(),
                id: removed.id().clone(),
                name: removed.comment().unwrap_or_default().to_string(),
            });
        }
        for record in working.records_mut() {
            for key in list_keys(record) {
                let owner = owner_name(record);
                let mut dropped: Vec<(String, usize)> = Vec::new();
                for id in &doomed {
                    let count = record.remove_from_list(key, id);
                    if count > 0 {
                        dropped.push((id.to_string(), count));
                    }
                }
                dropped.sort();
                changes.extend(dropped.into_iter().map(|(id, count)| Change::RemovedFromList {
                    owner: owner.clone(),
                    key,
                    id,
                    count,
                }));
            }
        }

        working.verify_integrity()?;
        *self = working;
        tracing::info!(%file_ref, build_files = build_files.len(), "removed source file");
        Ok(Removal {
            file_ref: file_ref.clone(),
            build_files,
            changes,
        })
    }

    /// Fail if a record that survives the removal of `doomed` still points at
    /// one of them outside the `children` and `files` lists removal cleans.
    fn check_unreferenced(&self, doomed: &HashSet<&str>) -> Result<()> {
        for record in self.records() {
            if doomed.contains(record.id().as_str()) {
                continue;
            }
            let cleaned: Vec<&str> = list_keys(record).collect();
            for (key, value) in record.body() {
                if cleaned.contains(&key.as_str()) {
                    continue;
                }
                if let Some(id) = doomed.iter().find(|id| value.mentions(id)) {
                    return Err(Box::new(Error::DanglingReference {
                        message: format!(
                            "{id} is still referenced by {key} of '{}' ({})",
                            owner_name(record),
                            record.id()
                        ),
                    }));
                }
            }
        }
        Ok(())
    }

    /// Drop repeated list entries and redundant build files.
    ///
    /// Every `children` and `files` list keeps the first occurrence of each
    /// id. Within one build phase, a build file whose file reference is
    /// already built by an earlier entry is dropped, and its record deleted
    /// once nothing lists it.
    pub fn dedupe(&mut self) -> Vec<Change> {
        let file_refs: HashMap<String, String> = self
            .build_files()
            .filter_map(|b| Some((b.id().to_string(), b.file_ref()?.to_string())))
            .collect();

        let mut working = self.clone();
        let mut changes = Vec::new();
        let mut dropped_build_files: Vec<String> = Vec::new();

        for record in working.records_mut() {
            let is_phase = isa::is_build_phase(record.isa());
            for key in list_keys(record) {
                let owner = owner_name(record);
                let mut seen_ids = HashSet::new();
                let mut seen_refs = HashSet::new();
                let mut dropped: Vec<String> = Vec::new();
                record.retain_in_list(key, |item| {
                    let Some(id) = item.as_str() else {
                        return true;
                    };
                    let redundant_build = is_phase
                        && file_refs
                            .get(id)
                            .is_some_and(|file_ref| !seen_refs.insert(file_ref.clone()));
                    if !seen_ids.insert(id.to_string()) || redundant_build {
                        dropped.push(id.to_string());
                        return false;
                    }
                    true
                });

                let mut counts: Vec<(String, usize)> = Vec::new();
                for id in dropped {
                    match counts.iter_mut().find(|(seen, _)| *seen == id) {
                        Some((_, count)) => *count += 1,
                        None => counts.push((id, 1)),
                    }
                }
                for (id, count) in counts {
                    if is_phase && !dropped_build_files.contains(&id) {
                        dropped_build_files.push(id.clone());
                    }
                    changes.push(Change::RemovedFromList {
                        owner: owner.clone(),
                        key,
                        id,
                        count,
                    });
                }
            }
        }

        let still_listed: HashSet<String> = working
            .records()
            .flat_map(|r| list_keys(r).flat_map(move |key| r.list(key)))
            .map(str::to_string)
            .collect();
        let orphans: HashSet<String> = dropped_build_files
            .into_iter()
            .filter(|id| file_refs.contains_key(id) && !still_listed.contains(id))
            .collect();
        if !orphans.is_empty() {
            for removed in working.remove_records(|r| {
                r.is(isa::BUILD_FILE) && orphans.contains(r.id().as_str())
            }) {
                changes.push(Change::RemovedRecord {
                    kind: removed.isa().to_string(),
                    id: removed.id().clone(),
                    name: removed.comment().unwrap_or_default().to_string(),
                });
            }
        }

        if !changes.is_empty() {
            *self = working;
            tracing::info!(steps = changes.len(), "deduplicated project");
        }
        changes
    }
}

/// The build file through which `phase` already builds `file_ref`.
fn phase_build_file<'a>(
    index: &HashMap<&str, &'a Record>,
    phase: &ObjectId,
    file_ref: &ObjectId,
) -> Option<BuildFile<'a>> {
    let phase: &'a Record = index.get(phase.as_str()).copied()?;
    phase
        .list("files")
        .filter_map(|entry| index.get(entry).copied())
        .find(|b| b.is(isa::BUILD_FILE) && b.get_str("fileRef") == Some(file_ref.as_str()))
        .map(BuildFile)
}

/// List-valued keys of `record` that hold object ids.
fn list_keys(record: &Record) -> impl Iterator<Item = &'static str> + use<> {
    let children = record.get("children").is_some();
    let files = isa::is_build_phase(record.isa()) && record.get("files").is_some();
    [("children", children), ("files", files)]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
}

fn owner_name(record: &Record) -> String {
    record
        .get_str("name")
        .or(record.comment())
        .or(record.get_str("path"))
        .unwrap_or(record.id().as_str())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequentialIds;

    const DOC: &str = "\
// !$*UTF8*$!
{
\tobjects = {

/* Begin PBXBuildFile section */
\t\tB1 /* A.swift in Sources */ = {isa = PBXBuildFile; fileRef = A1 /* A.swift */; };
/* End PBXBuildFile section */

/* Begin PBXFileReference section */
\t\tA1 /* A.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = A.swift; sourceTree = \"<group>\"; };
/* End PBXFileReference section */

/* Begin PBXGroup section */
\t\tG1 /* Views */ = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\tA1 /* A.swift */,
\t\t\t);
\t\t\tpath = Views;
\t\t\tsourceTree = \"<group>\";
\t\t};
/* End PBXGroup section */

/* Begin PBXNativeTarget section */
\t\tT1 /* Main */ = {isa = PBXNativeTarget; buildPhases = (P1, ); name = Main; };
/* End PBXNativeTarget section */

/* Begin PBXSourcesBuildPhase section */
\t\tP1 /* Sources */ = {
\t\t\tisa = PBXSourcesBuildPhase;
\t\t\tfiles = (
\t\t\t\tB1 /* A.swift in Sources */,
\t\t\t);
\t\t};
/* End PBXSourcesBuildPhase section */
\t};
}
";

    fn doc() -> Document {
        DOC.parse().unwrap()
    }

    fn ids() -> SequentialIds {
        SequentialIds::new("NEW")
    }

    #[test]
    fn test_change_lines() {
        let id = ObjectId::new("X1").unwrap();
        let lines: Vec<String> = [
            Change::AddedToGroup {
                group: "Views".into(),
                id: id.clone(),
            },
            Change::AddedToPhase {
                target: "Main".into(),
                id: id.clone(),
            },
            Change::RemovedFromList {
                owner: "Sources".into(),
                key: "files",
                id: "X1".into(),
                count: 2,
            },
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(
            lines,
            vec![
                "+ added to group 'Views'",
                "+ added to sources of target 'Main'",
                "- removed 2 entries of X1 from files of 'Sources'",
            ]
        );
    }

    #[test]
    fn test_add_rejects_empty_target_list() {
        let mut doc = doc();
        let request = AddSourceFile::new("B.swift", "Views", Vec::<String>::new());
        let err = doc.add_source_file(&request, &mut ids()).unwrap_err();
        assert!(matches!(*err, Error::Validation { .. }));
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_add_nested_path_sets_name() {
        let mut doc = doc();
        let request = AddSourceFile::new("Login/LoginView.swift", "Views", ["Main"]);
        let registration = doc.add_source_file(&request, &mut ids()).unwrap();

        let file = doc.file_reference(registration.file_ref.as_str()).unwrap();
        assert_eq!(file.name(), Some("LoginView.swift"));
        assert_eq!(file.path(), Some("Login/LoginView.swift"));
        assert_eq!(file.display_name(), "LoginView.swift");
    }

    #[test]
    fn test_ensure_reuses_existing_registration() {
        let mut doc = doc();
        let before = doc.to_string();
        let request = AddSourceFile::new("A.swift", "Views", ["Main"]);
        let registration = doc.ensure_source_file(&request, &mut ids()).unwrap();

        assert!(!registration.created);
        assert_eq!(registration.file_ref.as_str(), "A1");
        assert_eq!(registration.build_file.as_str(), "B1");
        assert_eq!(doc.to_string(), before);
    }

    #[test]
    fn test_remove_rejects_wrong_kind() {
        let mut doc = doc();
        let err = doc
            .remove_source_file(&ObjectId::new("G1").unwrap())
            .unwrap_err();
        assert!(matches!(
            *err,
            Error::WrongKind { ref found, .. } if found == "PBXGroup"
        ));
    }

    #[test]
    fn test_dedupe_clean_document_is_noop() {
        let mut doc = doc();
        assert!(doc.dedupe().is_empty());
        assert!(!doc.is_modified());
    }
}

//! List operation.

use pbxreg_project::Document;

use crate::reports::{GroupInfo, ListReport, TargetInfo};

/// Collect targets with their compiled files and groups with their children.
pub fn list(document: &Document) -> ListReport {
    let targets = document
        .targets()
        .map(|target| {
            let sources = target
                .build_phases()
                .filter_map(|id| document.build_phase(id))
                .find(|phase| phase.is_sources())
                .into_iter()
                .flat_map(|phase| phase.files())
                .map(|entry| file_label(document, entry))
                .collect();
            TargetInfo {
                name: target.name().to_string(),
                id: target.id().to_string(),
                sources,
            }
        })
        .collect();

    let groups = document
        .groups()
        .map(|group| GroupInfo {
            name: group.name().unwrap_or("(unnamed)").to_string(),
            id: group.id().to_string(),
            children: group
                .children()
                .map(|child| child_label(document, child))
                .collect(),
        })
        .collect();

    ListReport { targets, groups }
}

/// Display name of the file a phase entry builds.
fn file_label(document: &Document, entry: &str) -> String {
    document
        .build_file(entry)
        .and_then(|build_file| build_file.file_ref())
        .and_then(|file_ref| document.file_reference(file_ref))
        .map(|file| file.display_name().to_string())
        .unwrap_or_else(|| format!("{entry} (unresolved)"))
}

fn child_label(document: &Document, child: &str) -> String {
    if let Some(file) = document.file_reference(child) {
        return file.display_name().to_string();
    }
    match document.group(child) {
        Some(group) => format!("{}/", group.name().unwrap_or(child)),
        None => match document.record(child) {
            Some(record) => record.comment().unwrap_or(child).to_string(),
            None => format!("{child} (unresolved)"),
        },
    }
}

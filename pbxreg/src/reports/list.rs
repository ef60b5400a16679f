//! List command report data structures.

use serde::Serialize;

use super::output::{Output, Report};

/// A target and the files its sources phase compiles.
#[derive(Debug, Serialize)]
pub struct TargetInfo {
    pub name: String,
    pub id: String,
    pub sources: Vec<String>,
}

/// A group and the display names of its children.
#[derive(Debug, Serialize)]
pub struct GroupInfo {
    pub name: String,
    pub id: String,
    pub children: Vec<String>,
}

/// Report data for `pbxreg list`.
#[derive(Debug, Serialize)]
pub struct ListReport {
    pub targets: Vec<TargetInfo>,
    pub groups: Vec<GroupInfo>,
}

impl Report for ListReport {
    fn render(&self, out: &mut dyn Output) {
        if self.targets.is_empty() {
            out.preformatted("No targets defined");
        } else {
            out.section("Targets");
            for target in &self.targets {
                out.list_item(&format!("{} ({})", target.name, target.id));
                for file in &target.sources {
                    out.nested_item(file);
                }
            }
        }

        out.newline();
        out.section("Groups");
        for group in &self.groups {
            out.list_item(&format!("{} ({})", group.name, group.id));
            for child in &group.children {
                out.nested_item(child);
            }
        }
    }
}

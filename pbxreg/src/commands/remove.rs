use std::io::IsTerminal;

use clap::Args;
use dialoguer::{Select, theme::ColorfulTheme};
use eyre::{Result, bail};
use pbxreg_project::{Document, ObjectId};

use super::{ProjectArgs, UnwrapOrExit};
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub(crate) struct RemoveCommand {
    /// Identifiers of the file references to remove
    #[arg(value_name = "ID", required_unless_present = "path", conflicts_with = "path")]
    pub ids: Vec<String>,

    /// Remove the file reference registered for this path instead
    #[arg(long, value_name = "FILE")]
    pub path: Option<String>,

    /// With --path, remove every matching file reference
    #[arg(long, requires = "path")]
    pub all: bool,

    /// Show the changes without writing the project
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub project: ProjectArgs,
}

impl RemoveCommand {
    pub fn run(&self) -> Result<()> {
        let mut file = self.project.open()?;
        let ids = self.select(file.document())?;

        let report = ops::remove(&mut file, &ids, self.dry_run).unwrap_or_exit();
        report.render(&mut TerminalOutput::new());
        Ok(())
    }

    /// The file references to remove.
    fn select(&self, document: &Document) -> Result<Vec<ObjectId>> {
        let Some(path) = &self.path else {
            return Ok(self
                .ids
                .iter()
                .map(|id| id.parse::<ObjectId>().unwrap_or_exit())
                .collect());
        };

        let matches = document.find_file_references(path);
        match matches.as_slice() {
            [] => bail!("No file reference matches '{path}'"),
            [_] => Ok(matches),
            _ if self.all => Ok(matches),
            _ if std::io::stdin().is_terminal() => {
                let labels: Vec<String> = matches
                    .iter()
                    .map(|id| describe(document, id))
                    .collect();
                let choice = Select::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("{} file references match '{path}'", matches.len()))
                    .items(&labels)
                    .default(0)
                    .interact()?;
                Ok(vec![matches[choice].clone()])
            }
            _ => bail!(
                "{} file references match '{path}'; pass an ID or --all",
                matches.len()
            ),
        }
    }
}

/// "ID (path) in group".
fn describe(document: &Document, id: &ObjectId) -> String {
    let path = document
        .file_reference(id.as_str())
        .and_then(|f| f.path())
        .unwrap_or_default();
    let group = document
        .groups()
        .find(|g| g.children().any(|child| child == id.as_str()))
        .and_then(|g| g.name());
    match group {
        Some(group) => format!("{id} ({path}) in {group}"),
        None => format!("{id} ({path})"),
    }
}

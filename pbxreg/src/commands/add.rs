use clap::Args;
use eyre::Result;
use pbxreg_project::{AddSourceFile, RandomIds};

use super::{ProjectArgs, UnwrapOrExit};
use crate::{
    ops::{self, Mode},
    reports::{Report, TerminalOutput},
};

/// Arguments shared by `add` and `ensure`.
#[derive(Args)]
pub(crate) struct RegistrationArgs {
    /// Path of the file, relative to the group
    pub file: String,

    /// Group to place the file in: a name, a slash-separated path or an id
    #[arg(short, long)]
    pub group: String,

    /// Target whose sources phase compiles the file (repeatable)
    #[arg(short = 't', long = "target", required = true)]
    pub targets: Vec<String>,

    /// Show the changes without writing the project
    #[arg(long)]
    pub dry_run: bool,
}

impl RegistrationArgs {
    pub fn to_request(&self) -> AddSourceFile {
        AddSourceFile::new(self.file.clone(), self.group.clone(), &self.targets)
    }

    /// Run a registration in the given mode and print its report.
    pub fn run(&self, project: &ProjectArgs, mode: Mode) -> Result<()> {
        let mut file = project.open()?;
        let request = self.to_request();
        let report =
            ops::register(&mut file, &request, mode, &mut RandomIds, self.dry_run).unwrap_or_exit();

        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}

#[derive(Args)]
pub(crate) struct AddCommand {
    #[command(flatten)]
    pub registration: RegistrationArgs,

    #[command(flatten)]
    pub project: ProjectArgs,
}

impl AddCommand {
    pub fn run(&self) -> Result<()> {
        self.registration.run(&self.project, Mode::Add)
    }
}

use clap::Args;
use eyre::Result;

use super::{ProjectArgs, UnwrapOrExit};
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub(crate) struct DedupeCommand {
    /// Show the repairs without writing the project
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub project: ProjectArgs,
}

impl DedupeCommand {
    pub fn run(&self) -> Result<()> {
        let mut file = self.project.open()?;
        let report = ops::dedupe(&mut file, self.dry_run).unwrap_or_exit();
        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}

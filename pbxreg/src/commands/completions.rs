use std::io;

use clap::{Args, CommandFactory};
use clap_complete::Shell;
use eyre::Result;

use super::Cli;

#[derive(Args)]
pub(crate) struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub fn run(&self) -> Result<()> {
        clap_complete::generate(self.shell, &mut Cli::command(), "pbxreg", &mut io::stdout());
        Ok(())
    }
}

use clap::Args;
use eyre::Result;

use super::{ProjectArgs, add::RegistrationArgs};
use crate::ops::Mode;

#[derive(Args)]
pub(crate) struct EnsureCommand {
    #[command(flatten)]
    pub registration: RegistrationArgs,

    #[command(flatten)]
    pub project: ProjectArgs,
}

impl EnsureCommand {
    pub fn run(&self) -> Result<()> {
        self.registration.run(&self.project, Mode::Ensure)
    }
}

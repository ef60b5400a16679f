mod add;
mod check;
mod completions;
mod dedupe;
mod ensure;
mod list;
mod remove;

use std::path::{Path, PathBuf};

use add::AddCommand;
use check::CheckCommand;
use clap::{ArgAction, Args, Parser, Subcommand};
use completions::CompletionsCommand;
use dedupe::DedupeCommand;
use ensure::EnsureCommand;
use eyre::{Context, Result, bail};
use list::ListCommand;
use pbxreg_project::ProjectFile;
use remove::RemoveCommand;

/// Extension trait for exiting on project errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for pbxreg_project::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "command failed");
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "pbxreg")]
#[command(version)]
#[command(about = "Register and unregister source files in Xcode projects")]
pub(crate) struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Add(cmd) => cmd.run(),
            Commands::Ensure(cmd) => cmd.run(),
            Commands::Remove(cmd) => cmd.run(),
            Commands::Dedupe(cmd) => cmd.run(),
            Commands::Check(cmd) => cmd.run(),
            Commands::List(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a source file to a group and the sources of one or more targets
    Add(AddCommand),

    /// Add a source file unless the group already holds it
    Ensure(EnsureCommand),

    /// Remove a file reference and everything that points at it
    Remove(RemoveCommand),

    /// Drop repeated group children and build phase entries
    Dedupe(DedupeCommand),

    /// Validate the project file
    Check(CheckCommand),

    /// List targets and groups with their files
    List(ListCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Selects the project file a command works on.
#[derive(Args)]
pub(crate) struct ProjectArgs {
    /// Path to an .xcodeproj directory or its project.pbxproj
    /// (defaults to the only .xcodeproj in the current directory)
    #[arg(short, long, env = "PBXREG_PROJECT")]
    pub project: Option<PathBuf>,
}

impl ProjectArgs {
    /// Resolve the project path, searching the current directory if needed.
    pub fn path(&self) -> Result<PathBuf> {
        match &self.project {
            Some(path) => Ok(path.clone()),
            None => {
                let cwd = std::env::current_dir().wrap_err("Failed to get current directory")?;
                find_xcodeproj(&cwd)
            }
        }
    }

    /// Open and parse the project, exiting with a diagnostic if it is unusable.
    pub fn open(&self) -> Result<ProjectFile> {
        let path = self.path()?;
        tracing::debug!(path = %path.display(), "opening project");
        Ok(ProjectFile::open(&path).unwrap_or_exit())
    }
}

/// The single `*.xcodeproj` directory inside `dir`.
fn find_xcodeproj(dir: &Path) -> Result<PathBuf> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)
        .wrap_err_with(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() && path.extension().is_some_and(|ext| ext == "xcodeproj") {
            found.push(path);
        }
    }
    found.sort();

    match found.as_slice() {
        [] => bail!(
            "No .xcodeproj found in {}; pass --project or set PBXREG_PROJECT",
            dir.display()
        ),
        [single] => Ok(single.clone()),
        many => bail!(
            "Found {} projects in {} ({}); pass --project to pick one",
            many.len(),
            dir.display(),
            many.iter()
                .filter_map(|p| p.file_name())
                .map(|name| name.to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use grind_core::config::load_config_from;
use grind_core::Config;

use commands::{CompletionsCommand, ConfigCommand, TestCommand};

/// grind - Distribute a Maven project's tests as remote tasks
#[derive(Debug, Parser)]
#[command(name = "grind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ~/.grind.toml)
    #[arg(long, global = true, env = "GRIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Package the project's tests and submit them
    Test(TestCommand),

    /// Show or generate the configuration file
    Config(ConfigCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Test(ref cmd) => cmd.execute(&self),
            Commands::Config(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }

    /// Load the configuration named by `--config`, or the default one
    pub fn load_config(&self) -> anyhow::Result<(Config, PathBuf)> {
        Ok(load_config_from(self.config.as_deref())?)
    }

    /// Configuration file location, without loading it
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(grind_core::config::default_config_path()?),
        }
    }
}

/// Resolve `path` against the current directory.
///
/// Existing paths are canonicalized; others only lose their `.` components
/// so the caller can still report them as missing.
pub fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(std::fs::canonicalize(&joined).unwrap_or_else(|_| joined.components().collect()))
}

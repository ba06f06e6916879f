//! CLI commands

mod completions;
mod config;

pub use completions::CompletionsCommand;
pub use config::ConfigCommand;
pub use test::TestCommand;

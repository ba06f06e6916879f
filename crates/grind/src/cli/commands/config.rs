//! Config command - Show or generate the configuration file

use std::path::Path;

use clap::Args;
use console::style;
use dialoguer::Confirm;
use tracing::info;

use grind_core::config::{config_to_toml, default_config_toml};

use crate::cli::output;
use crate::cli::Cli;

/// Show the loaded configuration, or generate a default one
#[derive(Debug, Args)]
pub struct ConfigCommand {
    /// Print a default configuration instead of the loaded one
    #[arg(short, long)]
    pub generate: bool,

    /// With --generate, write the default configuration to the config file
    #[arg(short, long, requires = "generate")]
    pub write: bool,

    /// Overwrite an existing configuration file without asking
    #[arg(short, long)]
    pub force: bool,
}

impl ConfigCommand {
    /// Execute the config command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            generate = self.generate,
            write = self.write,
            force = self.force,
            "executing config command"
        );

        if !self.generate {
            let (config, path) = cli.load_config()?;
            if !cli.quiet {
                println!("{}", output::header(&format!("Config from {}", path.display())));
            }
            print!("{}", config_to_toml(&config)?);
            return Ok(());
        }

        let content = default_config_toml();
        if !self.write {
            print!("{}", content);
            return Ok(());
        }

        let path = cli.config_path()?;
        if !self.confirm_overwrite(&path)? {
            println!("{}", style("Aborted.").yellow());
            return Ok(());
        }

        std::fs::write(&path, &content)?;
        if !cli.quiet {
            output::success(&format!(
                "Wrote default configuration to {}",
                output::path_style().apply_to(path.display())
            ));
        }
        Ok(())
    }

    fn confirm_overwrite(&self, path: &Path) -> anyhow::Result<bool> {
        if !path.exists() || self.force {
            return Ok(true);
        }

        let overwrite = Confirm::new()
            .with_prompt(format!(
                "Configuration file already exists at {}. Overwrite?",
                path.display()
            ))
            .default(false)
            .interact()?;
        Ok(overwrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use grind_core::config::load_config;
    use grind_core::Config;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["grind", "-q"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn command(cli: &Cli) -> &ConfigCommand {
        match &cli.command {
            crate::cli::Commands::Config(cmd) => cmd,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_write_generates_loadable_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("grind.toml");
        let path_arg = path.to_string_lossy().into_owned();
        let cli = cli(&["--config", &path_arg, "config", "--generate", "--write"]);

        command(&cli).execute(&cli).unwrap();
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_force_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("grind.toml");
        std::fs::write(&path, "task_timeout_secs = 5\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();
        let cli = cli(&["--config", &path_arg, "config", "-g", "-w", "-f"]);

        command(&cli).execute(&cli).unwrap();
        assert_eq!(load_config(&path).unwrap().task_timeout_secs, 300);
    }

    #[test]
    fn test_missing_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let path_arg = path.to_string_lossy().into_owned();
        let cli = cli(&["--config", &path_arg, "config"]);

        let err = command(&cli).execute(&cli).unwrap_err();
        assert!(err.to_string().contains("grind config --generate"));
    }

    #[test]
    fn test_write_requires_generate() {
        assert!(Cli::try_parse_from(["grind", "config", "--write"]).is_err());
    }
}

//! `config` - inspect or reset the translator config file

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::core::{all_option_sets, TranslatorConfig};
use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective config as JSON
    Show,
    /// Print the config file location
    Path,
    /// Overwrite the config file with defaults
    Reset,
    /// List the accepted values for each option
    Options,
}

pub fn run(args: ConfigArgs, config_override: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_override.unwrap_or_else(|| Settings::load().config_path());

    match args.command {
        ConfigCommand::Show => {
            let config = TranslatorConfig::load(&path);
            println!("{}", config.to_json_pretty()?);
        }
        ConfigCommand::Path => {
            let state = if path.exists() { "" } else { " (not created yet)" };
            println!("{}{}", path.display(), state);
        }
        ConfigCommand::Reset => {
            TranslatorConfig::default().save(&path)?;
            println!("Configuration reset: {}", path.display());
        }
        ConfigCommand::Options => {
            for set in all_option_sets() {
                println!("{:<16} {}", format!("{}:", set.name), set.values.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"translator": {"translator": "deepl"}}"#).unwrap();

        run(
            ConfigArgs {
                command: ConfigCommand::Reset,
            },
            Some(path.clone()),
        )
        .unwrap();

        assert_eq!(TranslatorConfig::load(&path), TranslatorConfig::default());
    }

    #[test]
    fn test_show_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        run(
            ConfigArgs {
                command: ConfigCommand::Show,
            },
            Some(path.clone()),
        )
        .unwrap();

        assert!(!path.exists());
    }
}

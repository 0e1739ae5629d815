//! Command-line interface

pub mod config;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::OptionSet;

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_FAILURE: i32 = 1;
    pub const INVALID_INPUT: i32 = 2;
    pub const TRANSLATOR_MISSING: i32 = 3;
    pub const TRANSLATOR_FAILED: i32 = 4;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Parser)]
#[command(
    name = "manga-translator-gui",
    version,
    about = "Configure and run the manga image translator"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Translator config file (defaults to config.json beside the executable)
    #[arg(long, global = true, env = "MANGA_TRANSLATOR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the desktop window (default)
    Gui,
    /// Run a translation without the window
    Run(run::RunArgs),
    /// Inspect or reset the translator config
    Config(config::ConfigArgs),
}

/// Value parser restricted to one option catalogue
pub(crate) fn choice(
    set: OptionSet,
) -> impl Fn(&str) -> Result<String, String> + Clone + Send + Sync + 'static {
    move |value: &str| {
        if set.contains(value) {
            Ok(value.to_string())
        } else {
            Err(format!(
                "unknown {} '{}', expected one of: {}",
                set.name.to_lowercase(),
                value,
                set.values.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TRANSLATORS;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["manga-translator-gui"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_choice_parser() {
        let parse = choice(TRANSLATORS);
        assert_eq!(parse("deepl"), Ok("deepl".to_string()));
        let err = parse("google").unwrap_err();
        assert!(err.contains("sugoi"));
    }
}

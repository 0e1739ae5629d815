//! manga-translator-gui - desktop front-end for the manga image translator
//!
//! - Window for choosing directories and translator options (default)
//! - Writes the translator's `config.json` and builds its command line
//! - Streams the translator's console output into the window and a run log
//! - Headless `run` and `config` subcommands for scripting

mod cli;
mod core;
mod host;
mod logging;
mod native_ui;
mod settings;

use clap::Parser;
use cli::{exit_codes, Cli, Commands};

use crate::core::JobError;
use crate::host::RunError;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    let gui_mode = matches!(cli.command, None | Some(Commands::Gui));

    // The window has no console to log to; keep a file next to the temp dir
    let log_file = gui_mode.then(|| std::env::temp_dir().join("manga-translator-gui.log"));
    if let Err(e) = logging::init(cli.verbose, cli.json_output, log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return exit_codes::UNEXPECTED_FAILURE;
    }

    tracing::debug!(?cli, "Starting");

    match cli.command {
        Some(Commands::Run(args)) => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to create runtime: {}", e);
                    return exit_codes::UNEXPECTED_FAILURE;
                }
            };

            rt.block_on(async {
                match cli::run::run(args, cli.config).await {
                    Ok(code) => code,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        categorize_error(&e)
                    }
                }
            })
        }
        Some(Commands::Config(args)) => match cli::config::run(args, cli.config) {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                categorize_error(&e)
            }
        },
        Some(Commands::Gui) | None => {
            #[cfg(windows)]
            hide_console_window();

            match native_ui::run(cli.config) {
                Ok(()) => exit_codes::SUCCESS,
                Err(e) => {
                    tracing::error!("Window failed: {:?}", e);
                    exit_codes::UNEXPECTED_FAILURE
                }
            }
        }
    }
}

/// Categorize an error into the appropriate exit code
fn categorize_error(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<JobError>().is_some() {
        return exit_codes::INVALID_INPUT;
    }

    match e.downcast_ref::<RunError>() {
        Some(RunError::BinaryNotFound(_)) => exit_codes::TRANSLATOR_MISSING,
        Some(_) => exit_codes::TRANSLATOR_FAILED,
        None => exit_codes::UNEXPECTED_FAILURE,
    }
}

/// Hide the console window on Windows (for GUI mode)
#[cfg(windows)]
fn hide_console_window() {
    use windows::Win32::System::Console::GetConsoleWindow;
    use windows::Win32::UI::WindowsAndMessaging::{ShowWindow, SW_HIDE};

    unsafe {
        let console = GetConsoleWindow();
        if !console.is_invalid() {
            let _ = ShowWindow(console, SW_HIDE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_error() {
        let missing = anyhow::Error::new(RunError::BinaryNotFound("uv".to_string()));
        assert_eq!(categorize_error(&missing), exit_codes::TRANSLATOR_MISSING);

        let input = anyhow::Error::new(JobError::MissingInputDir);
        assert_eq!(categorize_error(&input), exit_codes::INVALID_INPUT);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(categorize_error(&other), exit_codes::UNEXPECTED_FAILURE);
    }
}

//! `run` - headless translation with streamed output

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Args;

use super::{choice, exit_codes};
use crate::core::{
    TranslationJob, TranslationOptions, TranslatorConfig, ALIGNMENTS, DETECTORS, INPAINTERS,
    LANGUAGES, OCR_MODELS, RENDERERS, TRANSLATORS,
};
use crate::host::{CancelToken, CommandRunner, RunLog, RunOptions};
use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory with the images to translate (defaults to the last one used)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long, value_parser = choice(TRANSLATORS))]
    pub translator: Option<String>,

    #[arg(long, value_parser = choice(LANGUAGES))]
    pub target_lang: Option<String>,

    #[arg(long, value_parser = choice(DETECTORS))]
    pub detector: Option<String>,

    #[arg(long, value_parser = choice(INPAINTERS))]
    pub inpainter: Option<String>,

    #[arg(long, value_parser = choice(RENDERERS))]
    pub renderer: Option<String>,

    #[arg(long, value_parser = choice(ALIGNMENTS))]
    pub alignment: Option<String>,

    #[arg(long, value_parser = choice(OCR_MODELS))]
    pub ocr: Option<String>,

    /// Run on the CPU
    #[arg(long)]
    pub no_gpu: bool,

    /// Do not pass -v to the translator
    #[arg(long)]
    pub quiet: bool,

    #[arg(long)]
    pub ignore_errors: bool,

    #[arg(long)]
    pub overwrite: bool,

    #[arg(long)]
    pub skip_no_text: bool,

    /// Translator launch command, e.g. "python -m manga_translator"
    #[arg(long)]
    pub launcher: Option<String>,

    /// Working directory for the translator
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Directory for the run log
    #[arg(long, conflicts_with = "no_log")]
    pub log_dir: Option<PathBuf>,

    /// Do not write a run log
    #[arg(long)]
    pub no_log: bool,

    /// Print the command line and exit
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Overlay the command-line choices on the form
    fn apply(&self, options: &mut TranslationOptions) {
        let overrides = [
            (&self.input, &mut options.input_dir),
            (&self.output, &mut options.output_dir),
            (&self.translator, &mut options.translator),
            (&self.target_lang, &mut options.target_lang),
            (&self.detector, &mut options.detector),
            (&self.inpainter, &mut options.inpainter),
            (&self.renderer, &mut options.renderer),
            (&self.alignment, &mut options.alignment),
            (&self.ocr, &mut options.ocr),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value.clone();
            }
        }

        if self.no_gpu {
            options.use_gpu = false;
        }
        if self.quiet {
            options.verbose = false;
        }
        options.ignore_errors |= self.ignore_errors;
        options.overwrite |= self.overwrite;
        options.skip_no_text |= self.skip_no_text;
    }

    fn apply_settings(&self, settings: &mut Settings) {
        if let Some(line) = &self.launcher {
            settings.set_launcher_line(line);
        }
        if let Some(dir) = &self.working_dir {
            settings.working_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.log_dir {
            settings.log_dir = Some(dir.clone());
            settings.save_log = true;
        }
        if self.no_log {
            settings.save_log = false;
        }
    }
}

/// Run the translator and return the process exit code
pub async fn run(args: RunArgs, config_override: Option<PathBuf>) -> anyhow::Result<i32> {
    let mut settings = Settings::load();
    if config_override.is_some() {
        settings.config_path = config_override;
    }
    args.apply_settings(&mut settings);

    let config_path = settings.config_path();
    let mut config = TranslatorConfig::load(&config_path);

    let mut options = TranslationOptions::from_config(&config);
    settings.fill_options(&mut options);
    args.apply(&mut options);

    let invocation = TranslationJob::build(&settings.launcher, &options, &config_path)?;

    if args.dry_run {
        println!("{}", invocation.display());
        return Ok(exit_codes::SUCCESS);
    }

    options.apply_to(&mut config);
    config.save(&config_path)?;
    println!("Configuration saved to: {}", config_path.display());
    println!("Executing command: {}", invocation.display());
    println!("Starting translation...");
    println!();

    let log = if settings.save_log {
        match RunLog::create(&settings.log_dir(), &invocation.display()) {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::warn!("Run log disabled: {}", e);
                None
            }
        }
    } else {
        None
    };
    let log = Arc::new(Mutex::new(log));

    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Stopping translation...");
                cancel.cancel();
            }
        })
    };

    let options = RunOptions {
        working_directory: settings.working_dir.clone(),
        grace_period: settings.grace_period(),
        cancel: Some(cancel),
        notify: None,
    };

    let sink_log = Arc::clone(&log);
    let result = CommandRunner::new()
        .run_async(invocation, options, move |line| {
            println!("{}", line);
            if let Ok(mut log) = sink_log.lock() {
                if let Some(log) = log.as_mut() {
                    log.write_line(line);
                }
            }
        })
        .await;
    ctrl_c.abort();

    let outcome = result?;
    println!();
    println!("{}", outcome.summary());

    let finished_log = log.lock().ok().and_then(|mut log| log.take());
    if let Some(log) = finished_log {
        let path = log.path().to_path_buf();
        log.finish(&outcome);
        println!("Log written to: {}", path.display());
    }

    Ok(if outcome.cancelled {
        exit_codes::CANCELLED
    } else if outcome.exit_code == 0 {
        exit_codes::SUCCESS
    } else {
        exit_codes::TRANSLATOR_FAILED
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> RunArgs {
        let argv = std::iter::once("manga-translator-gui")
            .chain(std::iter::once("run"))
            .chain(args.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Run(args)) => args,
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_apply_to_form() {
        let args = parse(&[
            "-i",
            "/in",
            "--translator",
            "deepl",
            "--target-lang",
            "ENG",
            "--no-gpu",
            "--quiet",
            "--overwrite",
        ]);

        let mut options = TranslationOptions::default();
        args.apply(&mut options);

        assert_eq!(options.input_dir, "/in");
        assert_eq!(options.translator, "deepl");
        assert_eq!(options.target_lang, "ENG");
        assert!(!options.use_gpu);
        assert!(!options.verbose);
        assert!(options.overwrite);
        assert!(!options.skip_no_text);
        assert_eq!(options.output_dir, "");
    }

    #[test]
    fn test_rejects_unknown_choice() {
        let result = Cli::try_parse_from(["manga-translator-gui", "run", "--ocr", "64px"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_flags_conflict() {
        let result = Cli::try_parse_from([
            "manga-translator-gui",
            "run",
            "--no-log",
            "--log-dir",
            "/tmp/logs",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_overrides() {
        let args = parse(&["--launcher", "python -m manga_translator", "--no-log"]);
        let mut settings = Settings::default();
        args.apply_settings(&mut settings);

        assert_eq!(settings.launcher, vec!["python", "-m", "manga_translator"]);
        assert!(!settings.save_log);
    }
}

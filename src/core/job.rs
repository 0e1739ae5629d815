//! Translation job model - the form state and the command line built from it

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{
    DetectorSection, InpainterSection, OcrSection, RenderSection, TranslatorConfig,
    TranslatorSection, ALIGNMENTS, DETECTORS, INPAINTERS, LANGUAGES, OCR_MODELS, RENDERERS,
    TRANSLATORS,
};

/// Default command used to start the translator
pub const DEFAULT_LAUNCHER: &[&str] = &["uv", "run", "python", "-m", "manga_translator"];

/// Translator mode for batch translation of a directory
pub const LOCAL_MODE: &str = "local";

/// Errors building a translation job
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("Please select an input directory!")]
    MissingInputDir,

    #[error("Translator launch command is empty")]
    EmptyLauncher,
}

/// Everything the user can choose for one translation run
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOptions {
    pub input_dir: String,
    pub output_dir: String,
    pub target_lang: String,
    pub translator: String,
    pub use_gpu: bool,
    pub verbose: bool,
    pub detector: String,
    pub inpainter: String,
    pub renderer: String,
    pub alignment: String,
    pub ocr: String,
    pub ignore_errors: bool,
    pub overwrite: bool,
    pub skip_no_text: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self::from_config(&TranslatorConfig::default())
    }
}

impl TranslationOptions {
    /// Build the form from a loaded config. Unknown or missing values select
    /// the first choice of their catalogue.
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            input_dir: String::new(),
            output_dir: String::new(),
            target_lang: LANGUAGES.resolve(config.target_lang()).to_string(),
            translator: TRANSLATORS.resolve(config.translator_name()).to_string(),
            use_gpu: true,
            verbose: true,
            detector: DETECTORS.resolve(config.detector_name()).to_string(),
            inpainter: INPAINTERS.resolve(config.inpainter_name()).to_string(),
            renderer: RENDERERS.resolve(config.renderer_name()).to_string(),
            alignment: ALIGNMENTS.resolve(config.alignment()).to_string(),
            ocr: OCR_MODELS.resolve(config.ocr_model()).to_string(),
            ignore_errors: false,
            overwrite: false,
            skip_no_text: false,
        }
    }

    /// Write the managed keys back into the config, creating missing sections
    pub fn apply_to(&self, config: &mut TranslatorConfig) {
        let translator = config
            .translator
            .get_or_insert_with(TranslatorSection::default);
        translator.target_lang = Some(self.target_lang.clone());
        translator.translator = Some(self.translator.clone());

        config
            .detector
            .get_or_insert_with(DetectorSection::default)
            .detector = Some(self.detector.clone());

        config
            .inpainter
            .get_or_insert_with(InpainterSection::default)
            .inpainter = Some(self.inpainter.clone());

        let render = config.render.get_or_insert_with(RenderSection::default);
        render.renderer = Some(self.renderer.clone());
        render.alignment = Some(self.alignment.clone());

        config.ocr.get_or_insert_with(OcrSection::default).ocr = Some(self.ocr.clone());
    }
}

/// A fully built command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// The whole argv, program first
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Space-joined command line for display
    pub fn display(&self) -> String {
        self.argv().join(" ")
    }
}

/// Builds the translator command line for one run
pub struct TranslationJob;

impl TranslationJob {
    pub fn build(
        launcher: &[String],
        options: &TranslationOptions,
        config_path: &Path,
    ) -> Result<Invocation, JobError> {
        let input_dir = options.input_dir.trim();
        if input_dir.is_empty() {
            return Err(JobError::MissingInputDir);
        }

        let (program, launcher_args) = launcher.split_first().ok_or(JobError::EmptyLauncher)?;
        if program.trim().is_empty() {
            return Err(JobError::EmptyLauncher);
        }

        let mut args: Vec<String> = launcher_args.to_vec();
        args.extend([LOCAL_MODE.to_string(), "-i".to_string(), input_dir.to_string()]);

        let output_dir = options.output_dir.trim();
        if !output_dir.is_empty() {
            args.extend(["-o".to_string(), output_dir.to_string()]);
        }

        if options.verbose {
            args.push("-v".to_string());
        }

        if options.use_gpu {
            args.push("--use-gpu".to_string());
        }

        args.extend([
            "--config-file".to_string(),
            config_path.display().to_string(),
        ]);

        if options.ignore_errors {
            args.push("--ignore-errors".to_string());
        }
        if options.overwrite {
            args.push("--overwrite".to_string());
        }
        if options.skip_no_text {
            args.push("--skip-no-text".to_string());
        }

        Ok(Invocation {
            program: program.clone(),
            args,
        })
    }
}

/// Default launcher argv as owned strings
pub fn default_launcher() -> Vec<String> {
    DEFAULT_LAUNCHER.iter().map(|s| s.to_string()).collect()
}

/// Default config location: `config.json` beside the executable
pub fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(input: &str) -> TranslationOptions {
        TranslationOptions {
            input_dir: input.to_string(),
            ..TranslationOptions::default()
        }
    }

    #[test]
    fn test_missing_input_dir() {
        let launcher = default_launcher();
        let err = TranslationJob::build(&launcher, &options("   "), Path::new("c.json"));
        assert_eq!(err, Err(JobError::MissingInputDir));
    }

    #[test]
    fn test_empty_launcher() {
        let err = TranslationJob::build(&[], &options("/in"), Path::new("c.json"));
        assert_eq!(err, Err(JobError::EmptyLauncher));
    }

    #[test]
    fn test_default_command_line() {
        let launcher = default_launcher();
        let config_path = Path::new("/app/config.json");
        let inv = TranslationJob::build(&launcher, &options("/manga/in"), config_path).unwrap();

        assert_eq!(inv.program, "uv");
        assert_eq!(
            inv.display(),
            "uv run python -m manga_translator local -i /manga/in -v --use-gpu \
             --config-file /app/config.json"
        );
    }

    #[test]
    fn test_all_flags_in_order() {
        let launcher = default_launcher();
        let opts = TranslationOptions {
            input_dir: "/in".to_string(),
            output_dir: "/out".to_string(),
            use_gpu: false,
            verbose: false,
            ignore_errors: true,
            overwrite: true,
            skip_no_text: true,
            ..TranslationOptions::default()
        };

        let inv = TranslationJob::build(&launcher, &opts, Path::new("cfg.json")).unwrap();
        assert_eq!(
            inv.args[4..],
            [
                "local",
                "-i",
                "/in",
                "-o",
                "/out",
                "--config-file",
                "cfg.json",
                "--ignore-errors",
                "--overwrite",
                "--skip-no-text",
            ]
        );
    }

    #[test]
    fn test_from_config_falls_back_on_unknown_values() {
        let mut config = TranslatorConfig::default();
        config.translator = None;
        config.render.as_mut().unwrap().alignment = Some("justify".to_string());

        let opts = TranslationOptions::from_config(&config);
        assert_eq!(opts.translator, "sugoi");
        assert_eq!(opts.target_lang, "CHS");
        assert_eq!(opts.alignment, "auto");
        assert_eq!(opts.inpainter, "lama_large");
        assert!(opts.use_gpu);
        assert!(opts.verbose);
    }

    #[test]
    fn test_apply_to_creates_sections() {
        let mut config = TranslatorConfig {
            translator: None,
            detector: None,
            inpainter: None,
            render: None,
            ocr: None,
            extra: serde_json::Map::new(),
        };

        let opts = TranslationOptions {
            translator: "deepl".to_string(),
            target_lang: "ENG".to_string(),
            ocr: "mocr".to_string(),
            ..TranslationOptions::default()
        };
        opts.apply_to(&mut config);

        assert_eq!(config.translator_name(), Some("deepl"));
        assert_eq!(config.target_lang(), Some("ENG"));
        assert_eq!(config.ocr_model(), Some("mocr"));
        assert_eq!(config.detector_name(), Some("default"));
        assert_eq!(config.alignment(), Some("auto"));
    }
}

//! Launcher settings
//!
//! Remembers the form state and launcher preferences between sessions. This
//! is separate from the translator's own `config.json`, which is handed to the
//! child process.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{default_config_path, default_launcher, TranslationOptions};

/// Errors loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No settings directory available on this platform")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Persistent launcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Last used input directory
    pub input_dir: String,
    /// Last used output directory
    pub output_dir: String,
    pub use_gpu: bool,
    pub verbose: bool,
    pub ignore_errors: bool,
    pub overwrite: bool,
    pub skip_no_text: bool,

    /// Write each run's output to a log file
    pub save_log: bool,
    /// Where run logs go; app data dir when unset
    pub log_dir: Option<PathBuf>,

    /// Command that starts the translator, before the `local` mode argument
    pub launcher: Vec<String>,
    /// Working directory for the translator; inherited when unset
    pub working_dir: Option<PathBuf>,
    /// Translator config location; `config.json` beside the executable when unset
    pub config_path: Option<PathBuf>,

    /// Console panel line limit
    pub max_console_lines: usize,
    /// Seconds between the termination request and the forced kill
    pub termination_grace_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: String::new(),
            output_dir: String::new(),
            use_gpu: true,
            verbose: true,
            ignore_errors: false,
            overwrite: false,
            skip_no_text: false,
            save_log: true,
            log_dir: None,
            launcher: default_launcher(),
            working_dir: None,
            config_path: None,
            max_console_lines: 5000,
            termination_grace_secs: 5,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "manga-translator-gui")
}

impl Settings {
    /// Location of the settings file
    pub fn settings_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("No settings directory; using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Effective translator config path
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(default_config_path)
    }

    /// Effective log directory
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join("logs"))
                .unwrap_or_else(|| std::env::temp_dir().join("manga-translator-gui").join("logs"))
        })
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.termination_grace_secs)
    }

    /// Launcher command as one editable line
    pub fn launcher_line(&self) -> String {
        self.launcher.join(" ")
    }

    /// Replace the launcher from an edited line. Arguments are split on whitespace.
    pub fn set_launcher_line(&mut self, line: &str) {
        self.launcher = line.split_whitespace().map(str::to_string).collect();
    }

    /// Copy the remembered directories and flags into the form
    pub fn fill_options(&self, options: &mut TranslationOptions) {
        options.input_dir = self.input_dir.clone();
        options.output_dir = self.output_dir.clone();
        options.use_gpu = self.use_gpu;
        options.verbose = self.verbose;
        options.ignore_errors = self.ignore_errors;
        options.overwrite = self.overwrite;
        options.skip_no_text = self.skip_no_text;
    }

    /// Remember the form's directories and flags
    pub fn remember(&mut self, options: &TranslationOptions) {
        self.input_dir = options.input_dir.clone();
        self.output_dir = options.output_dir.clone();
        self.use_gpu = options.use_gpu;
        self.verbose = options.verbose;
        self.ignore_errors = options.ignore_errors;
        self.overwrite = options.overwrite;
        self.skip_no_text = options.skip_no_text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.use_gpu);
        assert!(settings.verbose);
        assert_eq!(settings.launcher_line(), "uv run python -m manga_translator");
        assert_eq!(settings.grace_period(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_round_trip_and_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("settings.toml");

        let mut settings = Settings::default();
        settings.input_dir = "/manga/raw".to_string();
        settings.save_log = false;
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);

        fs::write(&path, "overwrite = true\n").unwrap();
        let partial = Settings::load_from(&path).unwrap();
        assert!(partial.overwrite);
        assert_eq!(partial.max_console_lines, 5000);
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "use_gpu = \"maybe\"").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_launcher_line_edit() {
        let mut settings = Settings::default();
        settings.set_launcher_line("  python   -m manga_translator ");
        assert_eq!(settings.launcher, vec!["python", "-m", "manga_translator"]);
    }

    #[test]
    fn test_remember_and_fill() {
        let mut settings = Settings::default();
        let options = TranslationOptions {
            input_dir: "/in".to_string(),
            overwrite: true,
            use_gpu: false,
            ..TranslationOptions::default()
        };
        settings.remember(&options);

        let mut restored = TranslationOptions::default();
        settings.fill_options(&mut restored);
        assert_eq!(restored.input_dir, "/in");
        assert!(restored.overwrite);
        assert!(!restored.use_gpu);
    }
}

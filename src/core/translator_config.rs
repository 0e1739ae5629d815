//! The JSON configuration file handed to the translator via `--config-file`
//!
//! Only a handful of keys are managed here. Everything else in the file is
//! carried through untouched so hand edits survive a save from the GUI.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors reading or writing the translator config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config format in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslatorSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InpainterSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inpainter: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Translator configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translator: Option<TranslatorSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector: Option<DetectorSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inpainter: Option<InpainterSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrSection>,
    /// Keys this front-end does not manage
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            translator: Some(TranslatorSection {
                translator: Some("sugoi".to_string()),
                target_lang: Some("CHS".to_string()),
                extra: Map::new(),
            }),
            detector: Some(DetectorSection {
                detector: Some("default".to_string()),
                extra: Map::new(),
            }),
            inpainter: Some(InpainterSection {
                inpainter: Some("lama_large".to_string()),
                extra: Map::new(),
            }),
            render: Some(RenderSection {
                renderer: Some("default".to_string()),
                alignment: Some("auto".to_string()),
                extra: Map::new(),
            }),
            ocr: Some(OcrSection {
                ocr: Some("48px".to_string()),
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }
}

impl TranslatorConfig {
    /// Read the config file. `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Load the config file, falling back to defaults when it is missing or broken
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => {
                tracing::debug!("Loaded translator config from {}", path.display());
                config
            }
            Ok(None) => {
                tracing::debug!("No translator config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Serialize as pretty JSON with 4-space indentation
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        write_pretty(&serde_json::to_value(self)?)
    }

    /// Like `to_json_pretty`, but keys that also appear in `existing` keep
    /// that document's order. New keys follow in their serialized order.
    pub fn to_json_pretty_ordered_like(
        &self,
        existing: &Map<String, Value>,
    ) -> Result<String, ConfigError> {
        let value = match serde_json::to_value(self)? {
            Value::Object(map) => Value::Object(ordered_like(existing, map)),
            other => other,
        };
        write_pretty(&value)
    }

    /// Write the config file, creating parent directories as needed.
    /// Top-level and section key order of an existing file is kept.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let existing = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Map<String, Value>>(&content).ok());
        let json = match &existing {
            Some(existing) => self.to_json_pretty_ordered_like(existing)?,
            None => self.to_json_pretty()?,
        };
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut file = fs::File::create(path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;

        tracing::info!("Saved translator config to {}", path.display());
        Ok(())
    }

    // Section accessors used by the form

    pub fn translator_name(&self) -> Option<&str> {
        self.translator.as_ref()?.translator.as_deref()
    }

    pub fn target_lang(&self) -> Option<&str> {
        self.translator.as_ref()?.target_lang.as_deref()
    }

    pub fn detector_name(&self) -> Option<&str> {
        self.detector.as_ref()?.detector.as_deref()
    }

    pub fn inpainter_name(&self) -> Option<&str> {
        self.inpainter.as_ref()?.inpainter.as_deref()
    }

    pub fn renderer_name(&self) -> Option<&str> {
        self.render.as_ref()?.renderer.as_deref()
    }

    pub fn alignment(&self) -> Option<&str> {
        self.render.as_ref()?.alignment.as_deref()
    }

    pub fn ocr_model(&self) -> Option<&str> {
        self.ocr.as_ref()?.ocr.as_deref()
    }
}

fn write_pretty(value: &Value) -> Result<String, ConfigError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Reorder `updated` to follow `reference`, recursing into nested objects
fn ordered_like(
    reference: &Map<String, Value>,
    mut updated: Map<String, Value>,
) -> Map<String, Value> {
    let mut ordered = Map::new();
    for (key, old) in reference {
        let Some(value) = updated.shift_remove(key) else {
            continue;
        };
        let value = match (old, value) {
            (Value::Object(old), Value::Object(new)) => Value::Object(ordered_like(old, new)),
            (_, value) => value,
        };
        ordered.insert(key.clone(), value);
    }
    ordered.extend(updated);
    ordered
}

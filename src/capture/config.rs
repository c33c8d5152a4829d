//! Capture and storage configuration.
//!
//! Loaded from a TOML file; every section and field is optional and falls
//! back to its default.

use crate::seed::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the capture cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index (native camera only).
    pub device_id: u32,
    /// Frames discarded before the kept frame (native camera only).
    pub warmup_frames: u32,
    /// Length of the processing phase shown before a result, in milliseconds.
    pub processing_delay_ms: u64,
    /// Largest digit count accepted by the lucky digits mode.
    pub max_lucky_digits: u32,
    /// Longest annotation accepted when saving or editing, in characters.
    pub max_annotation_chars: usize,
    /// Digest used to seed the generator.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            warmup_frames: 5,
            processing_delay_ms: 1200,
            max_lucky_digits: 12,
            max_annotation_chars: 140,
            hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

impl CaptureConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lucky_digits == 0 {
            return Err(ConfigError::InvalidDigitLimit);
        }
        if self.max_annotation_chars == 0 {
            return Err(ConfigError::InvalidAnnotationLimit);
        }
        Ok(())
    }
}

/// Where photos and the moment history live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory. Relative paths resolve against the working directory.
    pub data_dir: PathBuf,
    /// File name prefix shared by transient and saved photos.
    pub photo_prefix: String,
    /// File name of the moment history inside `data_dir`.
    pub moments_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("photo-seed-data"),
            photo_prefix: "CAMRNG_".to_string(),
            moments_file: "saved_moments.json".to_string(),
        }
    }
}

impl StorageConfig {
    /// Creates a configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.photo_prefix.is_empty() || self.photo_prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidPrefix(self.photo_prefix.clone()));
        }
        if self.moments_file.is_empty() || self.moments_file.contains(['/', '\\']) {
            return Err(ConfigError::InvalidMomentsFile(self.moments_file.clone()));
        }
        Ok(())
    }

    /// Returns `data_dir` as an absolute path.
    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        if self.data_dir.is_absolute() {
            return Ok(self.data_dir.clone());
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&self.data_dir))
            .map_err(|e| ConfigError::FileReadError(e.to_string()))
    }

    /// Transient capture area.
    pub fn temp_dir(root: &Path) -> PathBuf {
        root.join("captures")
    }

    /// Durable photo area owned by the moment store.
    pub fn saved_dir(root: &Path) -> PathBuf {
        root.join("saved")
    }

    /// Moment history file.
    pub fn moments_path(&self, root: &Path) -> PathBuf {
        root.join(&self.moments_file)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("max_lucky_digits must be at least 1")]
    InvalidDigitLimit,
    #[error("max_annotation_chars must be at least 1")]
    InvalidAnnotationLimit,
    #[error("invalid photo prefix: {0:?}")]
    InvalidPrefix(String),
    #[error("invalid moments file name: {0:?}")]
    InvalidMomentsFile(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.storage.validate()
    }
}

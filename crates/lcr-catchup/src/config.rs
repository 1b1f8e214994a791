use std::path::{Path, PathBuf};

use lcr_archive::{CheckpointSchedule, DEFAULT_CHECKPOINT_FREQUENCY};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a ledger chain replay.
///
/// The checkpoint frequency is a policy constant of the surrounding network;
/// the orchestrator supplies it rather than the replayer hard-coding it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Root of the downloaded, decompressed archive.
    pub download_dir: PathBuf,
    /// Number of ledgers per checkpoint.
    pub checkpoint_frequency: u32,
    /// Name of the work, used in the status string when not running.
    pub work_name: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            checkpoint_frequency: DEFAULT_CHECKPOINT_FREQUENCY,
            work_name: "apply-ledger-chain".into(),
        }
    }
}

impl ReplayConfig {
    /// Default configuration reading archives under `download_dir`.
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_checkpoint_frequency(mut self, frequency: u32) -> Self {
        self.checkpoint_frequency = frequency;
        self
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule().map(|_| ())
    }

    /// Checkpoint arithmetic for the configured frequency.
    pub fn schedule(&self) -> Result<CheckpointSchedule, ConfigError> {
        Ok(CheckpointSchedule::new(self.checkpoint_frequency)?)
    }
}

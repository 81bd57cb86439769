//! Error taxonomy for Pitlane.
//!
//! Per-record problems (a malformed lap time, a missing teammate, an absent
//! reserve) are never errors: they degrade the affected bonus and are noted
//! on the outcome. The variants here cover whole-run failures only.

use std::path::PathBuf;

/// League configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Pitlane engine errors.
#[derive(Debug, thiserror::Error)]
pub enum PitlaneError {
    #[error("results not yet available for race {race_id}")]
    ResultsUnavailable { race_id: String },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] pitlane_state::StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Pitlane operations.
pub type Result<T> = std::result::Result<T, PitlaneError>;

//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of the command-line driver so
//! `main` can propagate with `?`.

use pedigree_sim::{ConfigError, ModelError, SimError};

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Command-line arguments were out of range or malformed.
    #[error("invalid arguments: {reason}")]
    InvalidArguments {
        /// What was wrong with the arguments.
        reason: String,
    },

    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The simulation rejected its configuration or failed mid-run.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimError,
    },

    /// Writing the report failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization of the report failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl From<ModelError> for EngineError {
    fn from(source: ModelError) -> Self {
        Self::Simulation {
            source: source.into(),
        }
    }
}

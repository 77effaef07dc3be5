//! Configuration loading and typed config structures.
//!
//! The optional configuration file is `pedigree-config.yaml`. Every section
//! and key may be omitted; missing values take the documented defaults, so an
//! empty document is a valid configuration.
//!
//! ```yaml
//! model:
//!   death_rate: 12.5
//!   accident_rate: 0.01
//!   loyalty_factor: 0.9
//!   avg_lifetime_offspring: 2.0
//!   age_scale: 100.0
//! mating:
//!   female: { min: 16.0, max: 50.0 }
//!   male: { min: 16.0, max: 73.0 }
//! sampling:
//!   interval: 100.0
//! run:
//!   seed: 42
//! logging:
//!   level: info
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::individual::MatingAges;
use crate::lifespan::{ModelError, ModelParams};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Lifespan and fertility model parameters.
    #[serde(default)]
    pub model: ModelParams,

    /// Sex-specific mating-age bands.
    #[serde(default)]
    pub mating: MatingAges,

    /// Population-size sampling.
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Per-run settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Logging settings for the binary.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Empty or whitespace-only input yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Check every section against its domain.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.model.validate()?;
        self.mating.validate()?;
        self.sampling.validate()
    }
}

/// Population-size sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SamplingConfig {
    /// Simulated time between population-size samples (default: 100).
    #[serde(default = "default_sampling_interval")]
    pub interval: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: default_sampling_interval(),
        }
    }
}

impl SamplingConfig {
    /// Require a positive, finite interval.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.interval.is_finite() && self.interval > 0.0 {
            Ok(())
        } else {
            Err(ModelError::InvalidConfiguration {
                reason: format!(
                    "sampling interval must be a positive finite number, got {}",
                    self.interval
                ),
            })
        }
    }
}

/// Per-run settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// RNG seed. Absent means seed from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_sampling_interval() -> f64 {
    100.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.run.seed, None);
        assert_eq!(config.logging.level, "info");
        assert!((config.sampling.interval - 100.0).abs() < f64::EPSILON);
        assert!((config.mating.male.max - 73.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(SimulationConfig::parse("").unwrap(), SimulationConfig::default());
        assert_eq!(
            SimulationConfig::parse("   \n").unwrap(),
            SimulationConfig::default()
        );
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
model:
  death_rate: 10.0
  accident_rate: 0.02
  loyalty_factor: 0.5
  avg_lifetime_offspring: 3.0
  age_scale: 90.0
mating:
  female: { min: 18.0, max: 45.0 }
  male: { min: 20.0, max: 70.0 }
sampling:
  interval: 25.0
run:
  seed: 7
logging:
  level: debug
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!((config.model.death_rate - 10.0).abs() < f64::EPSILON);
        assert!((config.model.loyalty_factor - 0.5).abs() < f64::EPSILON);
        assert!((config.mating.female.min - 18.0).abs() < f64::EPSILON);
        assert!((config.mating.male.max - 70.0).abs() < f64::EPSILON);
        assert!((config.sampling.interval - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.run.seed, Some(7));
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let yaml = r"
model:
  loyalty_factor: 1.0
mating:
  male: { min: 18.0, max: 60.0 }
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!((config.model.loyalty_factor - 1.0).abs() < f64::EPSILON);
        assert!((config.model.death_rate - 12.5).abs() < f64::EPSILON);
        assert!((config.mating.female.max - 50.0).abs() < f64::EPSILON);
        assert!((config.mating.male.max - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.run.seed, None);
    }

    #[test]
    fn shipped_config_file_matches_defaults() {
        let config = SimulationConfig::parse(include_str!("../../../pedigree-config.yaml")).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn invalid_yaml_is_a_yaml_error() {
        let result = SimulationConfig::parse("model: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/pedigree-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn out_of_domain_values_fail_validation() {
        let yaml = "sampling:\n  interval: 0.0\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!(config.validate().is_err());

        let yaml = "model:\n  loyalty_factor: 2.0\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!(config.validate().is_err());

        let yaml = "mating:\n  female: { min: 50.0, max: 16.0 }\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}

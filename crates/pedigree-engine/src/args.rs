//! Command-line arguments.
//!
//! clap checks the syntax; the `validate` methods check the values before
//! anything reaches the simulation core.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::EngineError;

/// Pedigree: founder-population genealogy simulator
///
/// Simulates births, matings, and deaths in a population grown from a set
/// of founders, then traces the maternal and paternal lineages of the
/// survivors back to where they coalesce.
#[derive(Parser, Debug)]
#[command(name = "pedigree-engine")]
#[command(author, version, about = "Simulates a founder population's genealogy", long_about = None)]
pub struct Cli {
    /// Configuration file (default: `pedigree-config.yaml` if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the random seed (default: configured seed, else random)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation and print the population and coalescence series.
    Run(RunArgs),

    /// Sample lifespans and compare them with the survival function.
    Lifespans(LifespanArgs),
}

/// Arguments of `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of founders born at time 0
    #[arg(allow_negative_numbers = true)]
    pub founders: i64,

    /// Simulated time (years) at which the run stops
    #[arg(allow_negative_numbers = true)]
    pub horizon: f64,

    /// Print the result as JSON instead of a text report
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Return `(founders, horizon)` once both are in range.
    pub fn validate(&self) -> Result<(usize, f64), EngineError> {
        let founders = usize::try_from(self.founders).map_err(|_| EngineError::InvalidArguments {
            reason: format!("founder count must be non-negative, got {}", self.founders),
        })?;
        if !(self.horizon.is_finite() && self.horizon >= 0.0) {
            return Err(EngineError::InvalidArguments {
                reason: format!(
                    "horizon must be a non-negative finite number, got {}",
                    self.horizon
                ),
            });
        }
        Ok((founders, self.horizon))
    }
}

/// Arguments of `lifespans`.
#[derive(Args, Debug)]
pub struct LifespanArgs {
    /// Number of lifespans to draw
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub samples: usize,
}

impl LifespanArgs {
    /// Return the sample count once it is positive.
    pub fn validate(&self) -> Result<usize, EngineError> {
        if self.samples == 0 {
            return Err(EngineError::InvalidArguments {
                reason: "at least one lifespan sample is required".to_owned(),
            });
        }
        Ok(self.samples)
    }
}

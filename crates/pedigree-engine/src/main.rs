//! Pedigree engine binary.
//!
//! Command-line driver for the pedigree simulation: runs a simulation and
//! prints its series, or tabulates sampled lifespans against the model.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line arguments
//! 2. Load configuration from `--config` or `pedigree-config.yaml`
//! 3. Initialize structured logging (tracing) to stderr
//! 4. Validate arguments and dispatch the subcommand
//! 5. Write the report to stdout

mod args;
mod error;
mod printing;

use std::io::Write;
use std::path::Path;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pedigree_sim::{AgeModel, Simulation, SimulationConfig};

use crate::args::{Cli, Command, LifespanArgs, RunArgs};
use crate::error::EngineError;

/// Configuration file looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "pedigree-config.yaml";

/// Application entry point for the pedigree engine.
///
/// # Errors
///
/// Returns an error if the arguments or configuration are invalid, or if the
/// simulation or report output fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (mut config, source) = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.run.seed = Some(seed);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        config = %source,
        seed = config.run.seed,
        "pedigree-engine starting"
    );

    match &cli.command {
        Command::Run(args) => run(&config, args)?,
        Command::Lifespans(args) => lifespans(&config, args)?,
    }
    Ok(())
}

/// Load configuration from `path`, or from `pedigree-config.yaml` when
/// present, or fall back to defaults.
///
/// Returns the configuration and a description of where it came from.
fn load_config(path: Option<&Path>) -> Result<(SimulationConfig, String), EngineError> {
    if let Some(path) = path {
        return Ok((SimulationConfig::from_file(path)?, path.display().to_string()));
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok((
            SimulationConfig::from_file(default_path)?,
            DEFAULT_CONFIG_PATH.to_owned(),
        ))
    } else {
        Ok((SimulationConfig::default(), "defaults".to_owned()))
    }
}

/// `run`: simulate and print the result.
fn run(config: &SimulationConfig, args: &RunArgs) -> Result<(), EngineError> {
    let (founders, horizon) = args.validate()?;
    let mut simulation = Simulation::from_config(config)?;
    let result = simulation.run(founders, horizon)?;

    if result.stats.survivors == 0 && founders > 0 {
        warn!(founders, horizon, "Population went extinct before the horizon");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        printing::write_json(&mut out, &result)?;
    } else {
        printing::write_report(&mut out, &result)?;
    }
    out.flush()?;
    Ok(())
}

/// `lifespans`: sample lifespans and print the tabulation.
fn lifespans(config: &SimulationConfig, args: &LifespanArgs) -> Result<(), EngineError> {
    let samples = args.validate()?;
    config.validate()?;
    let model = AgeModel::new(&config.model)?;
    let mut rng = config
        .run
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    let band = config.mating.female;
    let table = model.tabulate(&mut rng, samples, band.min, band.max);
    info!(
        samples,
        mean = table.mean,
        ks_statistic = table.ks_statistic,
        "Lifespans tabulated"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    printing::write_lifespans(&mut out, &model, &table)?;
    out.flush()?;
    Ok(())
}

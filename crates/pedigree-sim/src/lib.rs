//! Discrete-event pedigree simulation with post-run coalescent analysis.
//!
//! A founder population is seeded at time 0. Individuals are born, look for
//! mates, reproduce, and die according to a Gompertz–Makeham lifespan model
//! and a Poisson fertility process. When the run stops, the maternal and
//! paternal lineages of the survivors are traced back until they merge or
//! reach the founders.
//!
//! # Modules
//!
//! - [`queue`] -- Resizable binary-heap priority queue with pluggable ordering
//! - [`lifespan`] -- Survival, lifespan sampling, and fertility rate
//! - [`individual`] -- Individuals, mating-age bands, and the pedigree arena
//! - [`event`] -- Scheduled events and the event queue
//! - [`mating`] -- Mate selection over the living population
//! - [`coalescence`] -- Ancestry walks over single-sex lineages
//! - [`config`] -- YAML configuration
//! - [`engine`] -- The simulation loop and the [`simulate`] entry point
//! - [`error`] -- Crate-level error type

pub mod coalescence;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod individual;
pub mod lifespan;
pub mod mating;
pub mod queue;

pub use config::{ConfigError, SimulationConfig};
pub use engine::{RunOutput, Simulation, simulate};
pub use error::SimError;
pub use individual::{AgeBand, Individual, Lineage, MatingAges, Pedigree};
pub use lifespan::{AgeModel, ModelError, ModelParams};
pub use queue::{PriorityQueue, QueueError};

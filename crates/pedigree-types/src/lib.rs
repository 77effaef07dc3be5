//! Shared type definitions for the Pedigree simulation.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: identifiers, the `Sex` enum, and the result structures the
//! engine hands to reporting collaborators.
//!
//! # Modules
//!
//! - [`ids`] -- Arena identifiers for individuals
//! - [`enums`] -- Enumeration types ([`Sex`], [`EndReason`])
//! - [`structs`] -- Time series, run statistics, and the simulation result

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EndReason, Sex};
pub use ids::IndividualId;
pub use structs::{RunStats, SeriesPoint, SimulationResult, TimeSeries};

//! Error types for the pedigree-sim crate.
//!
//! Every fallible operation in a run returns [`SimError`]. Subsystem errors
//! (queue, model) convert into it with `?`.

use pedigree_types::IndividualId;

use crate::lifespan::ModelError;
use crate::queue::QueueError;

/// Errors that can abort a simulation run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// A queue was peeked or popped while empty.
    #[error("queue error: {source}")]
    QueueUnderflow {
        /// The underlying queue error.
        #[from]
        source: QueueError,
    },

    /// Model or mating parameters were rejected.
    #[error("model error: {source}")]
    InvalidConfiguration {
        /// The underlying model error.
        #[from]
        source: ModelError,
    },

    /// An identifier did not resolve to an individual in the pedigree.
    #[error("unknown individual: {0}")]
    UnknownIndividual(IndividualId),

    /// A death time was assigned to an individual that already had one.
    #[error("death time already assigned: {0}")]
    DeathAlreadyAssigned(IndividualId),

    /// A sampled death time did not fall strictly after the birth time.
    #[error("death time {death_time} of {id} is not after its birth time {birth_time}")]
    DeathBeforeBirth {
        /// The individual concerned.
        id: IndividualId,
        /// Its birth time.
        birth_time: f64,
        /// The rejected death time.
        death_time: f64,
    },
}

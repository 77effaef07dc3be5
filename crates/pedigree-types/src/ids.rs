//! Type-safe identifier wrappers for arena-allocated entities.
//!
//! Individuals live in an append-only arena for the duration of a run, so
//! their identifiers are dense indices rather than globally unique values.
//! Wrapping the index in a newtype keeps identifiers from being mixed with
//! counts or sequence numbers at compile time.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a dense `usize` index with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl $name {
            /// Wrap a raw arena index.
            pub const fn from_index(index: usize) -> Self {
                Self(index)
            }

            /// Return the raw arena index.
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}.{}", $prefix, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of an individual (pedigree node) within one simulation run.
    IndividualId, "ind"
}

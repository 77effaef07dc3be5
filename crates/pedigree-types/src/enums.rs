//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Biological sex of an individual.
///
/// Sex is fixed at creation. It selects the mating-age band, decides who
/// schedules reproduction events (females), and splits survivors into the
/// maternal and paternal ancestry walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    /// Female. Carries the reproduction schedule.
    #[serde(rename = "F")]
    Female,
    /// Male.
    #[serde(rename = "M")]
    Male,
}

impl Sex {
    /// Return the other sex.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Female => Self::Male,
            Self::Male => Self::Female,
        }
    }

    /// Single-letter code used in reports.
    pub const fn code(self) -> char {
        match self {
            Self::Female => 'F',
            Self::Male => 'M',
        }
    }
}

impl core::fmt::Display for Sex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why an event loop stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The event queue ran dry (the population went extinct, or nobody
    /// was ever born).
    #[default]
    EventsExhausted,
    /// The next event lay beyond the horizon.
    HorizonReached,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        assert_eq!(Sex::Female.opposite(), Sex::Male);
        assert_eq!(Sex::Male.opposite().opposite(), Sex::Male);
    }

    #[test]
    fn serde_uses_letter_codes() {
        assert_eq!(serde_json::to_string(&Sex::Female).unwrap(), "\"F\"");
        let back: Sex = serde_json::from_str("\"M\"").unwrap();
        assert_eq!(back, Sex::Male);
    }

    #[test]
    fn end_reason_serializes_snake_case() {
        let json = serde_json::to_string(&EndReason::HorizonReached).unwrap();
        assert_eq!(json, "\"horizon_reached\"");
        assert_eq!(EndReason::default(), EndReason::EventsExhausted);
    }
}

//! Result structures handed to reporting and rendering collaborators.
//!
//! Everything here is plain data: the engine fills it in, and outer layers
//! (report printer, JSON export, charting) only read it.

use serde::{Deserialize, Serialize};

use crate::enums::EndReason;

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// One sample of a time series: a simulated time and a count observed then.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Simulated time of the observation (years).
    pub time: f64,
    /// Observed count (population size, or remaining lineages).
    pub count: usize,
}

/// A series of observations kept in ascending time order.
///
/// Floating-point times are not `Ord`, so the series is a sorted vector
/// rather than a map. Producers append in time order (or reverse once at the
/// end); [`TimeSeries::push`] does not re-sort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Observations in ascending time order.
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Create an empty series.
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Append an observation.
    pub fn push(&mut self, time: f64, count: usize) {
        self.points.push(SeriesPoint { time, count });
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the observations in order.
    pub fn iter(&self) -> core::slice::Iter<'_, SeriesPoint> {
        self.points.iter()
    }

    /// The earliest observation, if any.
    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    /// The latest observation, if any.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Whether observation times never decrease.
    pub fn is_time_ordered(&self) -> bool {
        self.points.windows(2).all(|pair| match pair {
            [a, b] => a.time <= b.time,
            _ => true,
        })
    }

    /// Reverse the observation order in place.
    ///
    /// Used by producers that naturally walk backward in time.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a SeriesPoint;
    type IntoIter = core::slice::Iter<'a, SeriesPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

// ---------------------------------------------------------------------------
// Run statistics
// ---------------------------------------------------------------------------

/// Bookkeeping counters for one simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Events popped and acted upon (including Death events).
    pub events_processed: u64,
    /// Events dropped because their subject was already dead.
    pub stale_events_dropped: u64,
    /// Birth events processed (founders included).
    pub births: u64,
    /// Death events processed.
    pub deaths: u64,
    /// Reproduction events that ran mate selection.
    pub mating_attempts: u64,
    /// Reproduction events that ended with a scheduled offspring.
    pub offspring_scheduled: u64,
    /// Individuals created in the pedigree (founders and offspring).
    pub individuals_created: usize,
    /// Individuals alive when the loop stopped.
    pub survivors: usize,
    /// Time of the last event that was processed, if any.
    pub last_event_time: Option<f64>,
    /// Why the event loop stopped.
    pub end_reason: EndReason,
}

// ---------------------------------------------------------------------------
// Simulation result
// ---------------------------------------------------------------------------

/// Everything a finished run reports to its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Population size sampled at fixed intervals of simulated time.
    pub population: TimeSeries,
    /// Maternal-line coalescences: birth time to lineages remaining.
    pub female_coalescence: TimeSeries,
    /// Paternal-line coalescences: birth time to lineages remaining.
    pub male_coalescence: TimeSeries,
    /// Run counters.
    pub stats: RunStats,
}

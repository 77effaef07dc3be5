//! Scheduled events and the event queue.
//!
//! An [`Event`] is consumed exactly once. Events for an individual who has
//! died in the meantime are not removed from the queue; the engine drops
//! them when they surface (see `engine`).
//!
//! Events at the same time are processed in the order they were scheduled.
//! [`EventQueue`] stamps each event with a monotonically increasing sequence
//! number that breaks time ties.

use core::cmp::Ordering;

use pedigree_types::IndividualId;

use crate::queue::{PriorityQueue, QueueError};

/// What happens to the subject of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The subject enters the living population.
    Birth,
    /// The subject leaves the living population.
    Death,
    /// The subject (a female) is due to look for a mate and conceive.
    Reproduction,
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Birth => f.write_str("birth"),
            Self::Death => f.write_str("death"),
            Self::Reproduction => f.write_str("reproduction"),
        }
    }
}

/// A scheduled event.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    /// Event variant.
    pub kind: EventKind,
    /// The individual the event concerns.
    pub subject: IndividualId,
    /// Simulated time at which the event fires.
    pub time: f64,
    /// Scheduling order, used only to break time ties.
    pub seq: u64,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

/// Min-queue of events, earliest first.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: PriorityQueue<Event>,
    next_seq: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event.
    pub fn schedule(&mut self, kind: EventKind, subject: IndividualId, time: f64) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.heap.insert(Event {
            kind,
            subject,
            time,
            seq,
        });
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Result<Event, QueueError> {
        self.heap.extract_top()
    }

    /// The earliest event without removing it.
    pub fn peek(&self) -> Result<&Event, QueueError> {
        self.heap.peek_top()
    }

    /// Number of pending events.
    pub const fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no event is pending.
    pub const fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Events scheduled so far, popped or not.
    pub const fn scheduled(&self) -> u64 {
        self.next_seq
    }
}

//! Pending-event queue ordered by relative delay.
//!
//! The schedule stores each event keyed by the delay until it fires,
//! relative to "now". Popping the head rebases every remaining delay by
//! subtracting the popped amount, so stored delays always read as "time
//! until this event" and never accumulate into absolute timestamps.

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

/// Popping from a schedule with no pending events.
///
/// Every live episode keeps at least the recurring arrival events
/// scheduled, so hitting this is a logic error rather than a recoverable
/// condition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("popped from an empty event schedule")]
pub struct EmptyScheduleError;

/// A scheduled occurrence in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A new task arrives from the distribution component at this index.
    Arrival(usize),
    /// The robot at this index completes its assigned task.
    Completion(usize),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Arrival(c) => write!(f, "arrival(component {})", c),
            Event::Completion(r) => write!(f, "completion(robot {})", r),
        }
    }
}

/// Time-ordered queue of `(delay, Event)` pairs.
///
/// Delays are clamped into `[0, max_delay]` on insertion, which bounds the
/// observation space and the simulated horizon between decision points.
#[derive(Debug, Clone)]
pub struct EventSchedule {
    entries: VecDeque<(u64, Event)>,
    max_delay: u64,
}

impl EventSchedule {
    /// Creates an empty schedule with the given delay horizon.
    pub fn new(max_delay: u64) -> Self {
        Self {
            entries: VecDeque::new(),
            max_delay,
        }
    }

    /// Inserts `event` to fire after `delay` time units.
    ///
    /// The delay is clamped into `[0, max_delay]`. Insertion keeps the
    /// queue sorted ascending by delay; equal delays keep insertion order.
    pub fn add(&mut self, delay: u64, event: Event) {
        let delay = delay.min(self.max_delay);
        let index = self.entries.partition_point(|(d, _)| *d <= delay);
        self.entries.insert(index, (delay, event));
    }

    /// Removes and returns the earliest `(delay, event)` pair.
    ///
    /// Every remaining delay is rebased by subtracting the popped delay,
    /// so it stays relative to the just-popped instant. Rebasing cannot
    /// underflow: the popped delay is the minimum.
    pub fn pop(&mut self) -> Result<(u64, Event), EmptyScheduleError> {
        let (delay, event) = self.entries.pop_front().ok_or(EmptyScheduleError)?;
        for (d, _) in self.entries.iter_mut() {
            *d -= delay;
        }
        Ok((delay, event))
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no events are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over pending `(delay, event)` pairs in firing order.
    pub fn iter(&self) -> impl Iterator<Item = &(u64, Event)> {
        self.entries.iter()
    }
}

impl fmt::Display for EventSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (delay, event)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "+{} {}", delay, event)?;
        }
        write!(f, "]")
    }
}

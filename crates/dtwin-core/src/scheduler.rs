//! Time-ordered wake-up queue for the simulation processes.
//!
//! Every logical process (a machine lane or a conveyor) is identified by a
//! [`ProcessRef`]. The scheduler stores wake-ups keyed by
//! `(time, sequence)`; `sequence` is a monotonically increasing insertion
//! counter, so wake-ups at the same instant run first-scheduled-first-run.

use crate::fixed::SimTime;
use crate::id::{ConveyorKey, MachineKey};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// ---------------------------------------------------------------------------
// Process references
// ---------------------------------------------------------------------------

/// A schedulable process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessRef {
    /// One worker lane of a machine.
    Lane { machine: MachineKey, lane: usize },
    /// A conveyor.
    Conveyor(ConveyorKey),
}

// ---------------------------------------------------------------------------
// Scheduled wake-ups
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ScheduledWake {
    pub time: SimTime,
    pub sequence: u64,
    pub process: ProcessRef,
}

impl PartialEq for ScheduledWake {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.sequence == other.sequence
    }
}

impl Eq for ScheduledWake {}

impl PartialOrd for ScheduledWake {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledWake {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct EventScheduler {
    queue: BinaryHeap<ScheduledWake>,
    sequence: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `process` to wake at absolute time `time`.
    pub fn schedule(&mut self, time: SimTime, process: ProcessRef) {
        self.queue.push(ScheduledWake {
            time,
            sequence: self.sequence,
            process,
        });
        self.sequence += 1;
    }

    /// Remove and return the earliest wake-up.
    pub fn pop(&mut self) -> Option<ScheduledWake> {
        self.queue.pop()
    }

    /// Time of the earliest pending wake-up.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|w| w.time)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total number of wake-ups ever scheduled.
    pub fn scheduled_total(&self) -> u64 {
        self.sequence
    }
}

//! Queues: bounded FIFO buffers between machines.
//!
//! [`Queue`] is the static description held by the topology. Its run-time
//! counterpart, [`QueueBuffer`], owns the parts currently waiting and the
//! processes blocked on the queue becoming non-empty or non-full.

use crate::fixed::{Fixed64, SimTime};
use crate::part::Part;
use crate::scheduler::ProcessRef;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Static description
// ---------------------------------------------------------------------------

/// A queue in a layout or a frozen topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub(crate) id: u32,
    pub(crate) capacity: u32,
    pub(crate) transport_time: SimTime,
    pub(crate) frequency: Fixed64,
    pub(crate) cluster: Option<u32>,
    /// `(from, to)` 0-indexed machine positions of every arc this queue
    /// carries. One entry for a declared queue, several after a merge.
    pub(crate) arc_links: Vec<(usize, usize)>,
}

impl Queue {
    pub(crate) fn from_arc(
        id: u32,
        capacity: u32,
        transport_time: SimTime,
        frequency: Fixed64,
        link: (usize, usize),
    ) -> Self {
        Self {
            id,
            capacity,
            transport_time,
            frequency,
            cluster: None,
            arc_links: vec![link],
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn transport_time(&self) -> SimTime {
        self.transport_time
    }

    pub fn frequency(&self) -> Fixed64 {
        self.frequency
    }

    /// Cluster assigned by discovery; `None` if the queue is unreachable
    /// from the first machine.
    pub fn cluster(&self) -> Option<u32> {
        self.cluster
    }

    pub fn arc_links(&self) -> &[(usize, usize)] {
        &self.arc_links
    }

    /// Whether this queue replaced several declared queues.
    pub fn is_merged(&self) -> bool {
        self.arc_links.len() > 1
    }
}

// ---------------------------------------------------------------------------
// Run-time buffer
// ---------------------------------------------------------------------------

/// Contents and waiters of one queue during a run.
#[derive(Debug)]
pub struct QueueBuffer {
    id: u32,
    capacity: usize,
    parts: VecDeque<Part>,
    getters: VecDeque<ProcessRef>,
    putters: VecDeque<ProcessRef>,
}

impl QueueBuffer {
    pub fn new(queue: &Queue) -> Self {
        Self {
            id: queue.id,
            capacity: queue.capacity as usize,
            parts: VecDeque::with_capacity(queue.capacity as usize),
            getters: VecDeque::new(),
            putters: VecDeque::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.parts.len() >= self.capacity
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Append a part at the tail.
    ///
    /// # Panics
    ///
    /// Panics if the queue is already at capacity.
    pub fn push(&mut self, part: Part) {
        assert!(
            !self.is_full(),
            "queue {} over capacity {} while pushing {}",
            self.id,
            self.capacity,
            part.id()
        );
        self.parts.push_back(part);
    }

    /// Remove the part at the head.
    pub fn pop(&mut self) -> Option<Part> {
        self.parts.pop_front()
    }

    /// Block `process` until the queue gains a part.
    pub fn wait_for_part(&mut self, process: ProcessRef) {
        self.getters.push_back(process);
    }

    /// Block `process` until the queue frees a slot.
    pub fn wait_for_space(&mut self, process: ProcessRef) {
        self.putters.push_back(process);
    }

    /// Drain the not-empty waiters in registration order.
    pub fn take_getters(&mut self) -> impl Iterator<Item = ProcessRef> + '_ {
        self.getters.drain(..)
    }

    /// Drain the not-full waiters in registration order.
    pub fn take_putters(&mut self) -> impl Iterator<Item = ProcessRef> + '_ {
        self.putters.drain(..)
    }
}

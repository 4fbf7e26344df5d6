//! Conveyors: timed links that carry one part from a machine into a queue.

use crate::fixed::SimTime;
use crate::id::QueueKey;
use crate::part::Part;
use crate::scheduler::ProcessRef;
use std::collections::VecDeque;

/// A conveyor in a wired layout or frozen topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Conveyor {
    pub(crate) id: u32,
    pub(crate) transport_time: SimTime,
    pub(crate) queue_out: QueueKey,
}

impl Conveyor {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn transport_time(&self) -> SimTime {
        self.transport_time
    }

    pub fn queue_out(&self) -> QueueKey {
        self.queue_out
    }
}

/// Where a conveyor is in its carry cycle.
#[derive(Debug, Default)]
pub enum ConveyorPhase {
    #[default]
    Idle,
    /// Moving a part until `until`. Wake-ups before then are stale.
    Carrying { part: Part, until: SimTime },
    /// Arrived but blocked on a full destination queue.
    Delivering { part: Part },
}

/// Run-time state of a conveyor plus the lanes waiting to load it.
#[derive(Debug, Default)]
pub struct ConveyorState {
    pub phase: ConveyorPhase,
    waiters: VecDeque<ProcessRef>,
}

impl ConveyorState {
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, ConveyorPhase::Idle)
    }

    pub fn part(&self) -> Option<&Part> {
        match &self.phase {
            ConveyorPhase::Carrying { part, .. } | ConveyorPhase::Delivering { part } => Some(part),
            ConveyorPhase::Idle => None,
        }
    }

    pub fn wait_until_idle(&mut self, process: ProcessRef) {
        self.waiters.push_back(process);
    }

    pub fn take_waiters(&mut self) -> impl Iterator<Item = ProcessRef> + '_ {
        self.waiters.drain(..)
    }
}

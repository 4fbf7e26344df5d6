//! Machines: processing nodes with one input queue and one or more outputs.

use crate::fixed::{Fixed64, SimTime};
use crate::id::{BranchId, ConveyorKey, QueueKey};
use crate::part::Part;

// ---------------------------------------------------------------------------
// Static description
// ---------------------------------------------------------------------------

/// A machine in a layout or a frozen topology.
#[derive(Debug)]
pub struct Machine {
    pub(crate) id: u32,
    pub(crate) capacity: u32,
    pub(crate) process_time: SimTime,
    pub(crate) frequency: Fixed64,
    pub(crate) cluster: u32,
    pub(crate) queue_in: Option<QueueKey>,
    pub(crate) queue_out: Vec<QueueKey>,
    pub(crate) conveyors_in: Vec<ConveyorKey>,
    pub(crate) conveyors_out: Vec<ConveyorKey>,
    pub(crate) branch: Option<BranchId>,
    pub(crate) last_part_id: u64,
    pub(crate) worked_time: SimTime,
    pub(crate) initial_part: Option<Part>,
    pub(crate) final_machine: bool,
}

impl Machine {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of independent worker lanes.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn process_time(&self) -> SimTime {
        self.process_time
    }

    pub fn frequency(&self) -> Fixed64 {
        self.frequency
    }

    pub fn cluster(&self) -> u32 {
        self.cluster
    }

    pub fn queue_in(&self) -> Option<QueueKey> {
        self.queue_in
    }

    pub fn queue_out(&self) -> &[QueueKey] {
        &self.queue_out
    }

    pub fn conveyors_in(&self) -> &[ConveyorKey] {
        &self.conveyors_in
    }

    pub fn conveyors_out(&self) -> &[ConveyorKey] {
        &self.conveyors_out
    }

    pub fn branch(&self) -> Option<BranchId> {
        self.branch
    }

    /// Highest part id assigned when this machine was built.
    pub fn last_part_id(&self) -> u64 {
        self.last_part_id
    }

    pub fn worked_time(&self) -> SimTime {
        self.worked_time
    }

    /// The part already in process at t = 0, if `worked_time` was nonzero.
    pub fn initial_part(&self) -> Option<&Part> {
        self.initial_part.as_ref()
    }

    pub fn is_final(&self) -> bool {
        self.final_machine
    }

    /// Time the initial part still needs: `max(process_time - worked_time, 0)`.
    pub fn remaining_initial_time(&self) -> SimTime {
        self.process_time
            .saturating_sub(self.worked_time)
            .max(SimTime::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Run-time lane state
// ---------------------------------------------------------------------------

/// State of one worker lane.
#[derive(Debug, Default)]
pub enum LaneState {
    #[default]
    Idle,
    /// Waiting for the input queue to gain a part.
    Fetching,
    /// Holding a part until its process time elapses.
    Processing { part: Part },
    /// Holding a finished part until `conveyor` and its queue can take it.
    Pushing { part: Part, conveyor: ConveyorKey },
}

impl LaneState {
    pub fn part(&self) -> Option<&Part> {
        match self {
            LaneState::Processing { part } | LaneState::Pushing { part, .. } => Some(part),
            LaneState::Idle | LaneState::Fetching => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.part().is_some()
    }
}

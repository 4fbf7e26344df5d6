//! Branch points: machines with more than one outbound conveyor.
//!
//! A [`Branch`] is discovered once while building the topology and never
//! mutated afterwards. The routing cursor that changes during a run lives
//! in [`BranchState`], owned by the engine.

use crate::id::{BranchId, ConveyorKey, MachineKey, QueueKey};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Routing policy
// ---------------------------------------------------------------------------

/// How a branch picks the conveyor for the next finished part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Cycle through the conveyors in wiring order.
    #[default]
    RoundRobin,
    /// Conveyor whose destination queue holds the fewest parts; ties go to
    /// the earliest conveyor.
    LeastLoaded,
    /// Uniform choice from the run's seeded PRNG.
    Random,
}

// ---------------------------------------------------------------------------
// Branch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub(crate) id: BranchId,
    pub(crate) machine: MachineKey,
    pub(crate) conveyors: Vec<ConveyorKey>,
    pub(crate) queue_in: Option<QueueKey>,
}

impl Branch {
    pub fn id(&self) -> BranchId {
        self.id
    }

    pub fn machine(&self) -> MachineKey {
        self.machine
    }

    pub fn conveyors(&self) -> &[ConveyorKey] {
        &self.conveyors
    }

    pub fn queue_in(&self) -> Option<QueueKey> {
        self.queue_in
    }
}

/// Per-branch routing state, persisted across decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchState {
    /// Next conveyor index for `RoundRobin`.
    pub cursor: usize,
}

/// Pick the conveyor for the next part leaving `branch`.
///
/// `load` reports the number of parts in a conveyor's destination queue.
pub fn select_conveyor(
    policy: RoutingPolicy,
    branch: &Branch,
    state: &mut BranchState,
    rng: &mut SimRng,
    load: impl Fn(ConveyorKey) -> usize,
) -> ConveyorKey {
    let conveyors = &branch.conveyors;
    assert!(!conveyors.is_empty(), "branch {:?} has no conveyors", branch.id);
    let idx = match policy {
        RoutingPolicy::RoundRobin => {
            let idx = state.cursor % conveyors.len();
            state.cursor = (idx + 1) % conveyors.len();
            idx
        }
        RoutingPolicy::LeastLoaded => conveyors
            .iter()
            .enumerate()
            .min_by_key(|&(i, c)| (load(*c), i))
            .map(|(i, _)| i)
            .unwrap_or(0),
        RoutingPolicy::Random => rng.index(conveyors.len()),
    };
    conveyors[idx]
}

//! Topology construction: from a [`ModelSpec`] to a frozen [`Topology`].
//!
//! Construction is a chain of consuming stages, each owning its arenas:
//!
//! ```text
//! TopologyBuilder::build  -> BuiltLayout      machines, raw queues
//! BuiltLayout::merge_queues -> MergedLayout   one queue_in per machine
//! MergedLayout::discover_clusters -> ClusteredLayout
//! ClusteredLayout::assign_conveyors -> WiredLayout
//! WiredLayout::discover_branches -> Topology  read-only
//! ```
//!
//! Objects reference each other through slotmap keys, so a queue replaced
//! during the merge pass can never leave a dangling reference behind.

mod branch;
mod builder;
mod cluster;
mod merge;
mod wiring;

pub use builder::{BuiltLayout, TopologyBuilder};
pub use cluster::ClusteredLayout;
pub use merge::MergedLayout;
pub use wiring::WiredLayout;

use crate::branch::Branch;
use crate::conveyor::Conveyor;
use crate::fixed::SimTime;
use crate::generator::Generator;
use crate::id::{BranchId, ConveyorKey, MachineKey, QueueKey};
use crate::machine::Machine;
use crate::model::ModelSpec;
use crate::queue::Queue;
use crate::sim::RunConfig;
use slotmap::{SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that reject a model before any simulation starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("arc {arc} references node {node}, but the model has {nodes} nodes")]
    UnknownNode { arc: usize, node: usize, nodes: usize },
    #[error("model declares no nodes")]
    EmptyModel,
    #[error("{what} {id} has zero capacity")]
    ZeroCapacity { what: &'static str, id: u32 },
    #[error(
        "machine {machine}: merged input queues disagree on transport time ({first} vs {second})"
    )]
    TransportTimeMismatch {
        machine: u32,
        first: SimTime,
        second: SimTime,
    },
    #[error("queue {queue} is not the input of any machine")]
    DanglingQueue { queue: u32 },
    #[error("branch {branch} routes into queue {queue}, which no machine consumes")]
    BranchOutsideGraph { branch: u32, queue: u32 },
    #[error("machine {machine} is not final but has no output queue")]
    MissingOutput { machine: u32 },
    #[error("initial WIP of {requested} parts exceeds capacity {capacity} of queue {queue}")]
    InitialOverCapacity {
        queue: u32,
        requested: u32,
        capacity: u32,
    },
    #[error("initial WIP has {entries} entries but the model has only {arcs} arcs")]
    TooManyInitialEntries { entries: usize, arcs: usize },
    #[error("exit stop condition sets neither maxparts nor targeted_part_id")]
    UnboundedExit,
}

// ---------------------------------------------------------------------------
// Shared arena layout
// ---------------------------------------------------------------------------

/// Arenas shared by every stage. Each stage wraps one of these and adds
/// the guarantees it established.
#[derive(Debug)]
pub(crate) struct Layout {
    pub(crate) machines: SlotMap<MachineKey, Machine>,
    /// Machines in declaration order.
    pub(crate) machine_order: Vec<MachineKey>,
    pub(crate) queues: SlotMap<QueueKey, Queue>,
    /// Queue each declared arc resolves to. Follows merges.
    pub(crate) arc_queues: Vec<QueueKey>,
    /// Initial WIP counts per arc, empty when initial WIP is disabled.
    pub(crate) initial: Vec<u32>,
    /// Highest part id handed out during construction.
    pub(crate) last_part_id: u64,
}

impl Layout {
    /// The machine consuming each queue. After the merge pass every queue
    /// has at most one.
    pub(crate) fn consumers(&self) -> SecondaryMap<QueueKey, MachineKey> {
        self.machine_order
            .iter()
            .filter_map(|&m| self.machines[m].queue_in.map(|q| (q, m)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Frozen topology
// ---------------------------------------------------------------------------

/// A fully built, validated model. Read-only.
#[derive(Debug)]
pub struct Topology {
    machines: SlotMap<MachineKey, Machine>,
    machine_order: Vec<MachineKey>,
    queues: SlotMap<QueueKey, Queue>,
    queue_order: Vec<QueueKey>,
    conveyors: SlotMap<ConveyorKey, Conveyor>,
    conveyor_order: Vec<ConveyorKey>,
    branches: Vec<Branch>,
    arc_queues: Vec<QueueKey>,
    generator: Generator,
    last_part_id: u64,
}

impl Topology {
    /// Run the full construction pipeline.
    pub fn from_spec(spec: &ModelSpec, config: &RunConfig) -> Result<Self, TopologyError> {
        TopologyBuilder::new(spec, config)
            .build()?
            .merge_queues()?
            .discover_clusters()
            .assign_conveyors()
            .discover_branches()
    }

    pub fn machine(&self, key: MachineKey) -> &Machine {
        &self.machines[key]
    }

    /// Machines in declaration order.
    pub fn machines(&self) -> impl Iterator<Item = (MachineKey, &Machine)> + '_ {
        self.machine_order.iter().map(|&k| (k, &self.machines[k]))
    }

    pub fn machine_keys(&self) -> &[MachineKey] {
        &self.machine_order
    }

    pub fn machine_count(&self) -> usize {
        self.machine_order.len()
    }

    /// Look a machine up by its public id (the node's `activity`).
    pub fn machine_by_id(&self, id: u32) -> Option<MachineKey> {
        self.machines().find(|(_, m)| m.id == id).map(|(k, _)| k)
    }

    pub fn first_machine(&self) -> MachineKey {
        self.machine_order[0]
    }

    /// The machine flagged `final_machine`.
    pub fn final_machine(&self) -> MachineKey {
        self.machine_order[self.machine_order.len() - 1]
    }

    pub fn queue(&self, key: QueueKey) -> &Queue {
        &self.queues[key]
    }

    /// Queues in id order (1..=N).
    pub fn queues(&self) -> impl Iterator<Item = (QueueKey, &Queue)> + '_ {
        self.queue_order.iter().map(|&k| (k, &self.queues[k]))
    }

    pub fn queue_keys(&self) -> &[QueueKey] {
        &self.queue_order
    }

    pub fn queue_by_id(&self, id: u32) -> Option<QueueKey> {
        let idx = (id as usize).checked_sub(1)?;
        self.queue_order.get(idx).copied()
    }

    /// The queue a declared arc (0-indexed) resolved to after merging.
    pub fn arc_queue(&self, arc: usize) -> Option<QueueKey> {
        self.arc_queues.get(arc).copied()
    }

    pub fn conveyor(&self, key: ConveyorKey) -> &Conveyor {
        &self.conveyors[key]
    }

    /// Conveyors in id order.
    pub fn conveyors(&self) -> impl Iterator<Item = (ConveyorKey, &Conveyor)> + '_ {
        self.conveyor_order.iter().map(|&k| (k, &self.conveyors[k]))
    }

    pub fn conveyor_keys(&self) -> &[ConveyorKey] {
        &self.conveyor_order
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, id: BranchId) -> &Branch {
        &self.branches[id.index()]
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Highest part id assigned during construction; runs continue from
    /// the next id.
    pub fn last_part_id(&self) -> u64 {
        self.last_part_id
    }
}

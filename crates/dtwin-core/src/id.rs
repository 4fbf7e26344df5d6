use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Arena key of a machine in a layout or topology.
    pub struct MachineKey;

    /// Arena key of a queue. Stable across the merge pass, unlike the
    /// numeric queue id which is reassigned afterwards.
    pub struct QueueKey;

    /// Arena key of a conveyor.
    pub struct ConveyorKey;
}

/// Identifies a part. Assigned monotonically, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PartId(pub u64);

/// Identifies a branch point. Dense, starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BranchId(pub u32);

impl BranchId {
    /// Zero-based position in the topology's branch list.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Part {}", self.0)
    }
}

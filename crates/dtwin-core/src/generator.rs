//! Initial work-in-progress.
//!
//! The generator is planned while the topology is built, so capacity
//! problems surface as [`TopologyError`]s, and materialized into parts when
//! a run starts.

use crate::fixed::SimTime;
use crate::id::{PartId, QueueKey};
use crate::part::{Location, Part};
use crate::topology::{Layout, TopologyError};
use slotmap::SecondaryMap;

/// One batch of initial parts destined for a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub arc: usize,
    pub queue: QueueKey,
    pub queue_id: u32,
    pub count: u32,
}

/// Places initial parts into queues in arc declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generator {
    allocations: Vec<Allocation>,
}

impl Generator {
    /// Resolve each `initial` entry to its (possibly merged) queue and
    /// check that no queue is filled past capacity.
    pub(crate) fn plan(layout: &Layout) -> Result<Self, TopologyError> {
        let mut per_queue: SecondaryMap<QueueKey, u32> = SecondaryMap::new();
        let mut allocations = Vec::new();
        for (arc, &count) in layout.initial.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let queue = layout.arc_queues[arc];
            let q = &layout.queues[queue];
            let total = per_queue.get(queue).copied().unwrap_or(0) + count;
            if total > q.capacity {
                return Err(TopologyError::InitialOverCapacity {
                    queue: q.id,
                    requested: total,
                    capacity: q.capacity,
                });
            }
            per_queue.insert(queue, total);
            allocations.push(Allocation {
                arc,
                queue,
                queue_id: q.id,
                count,
            });
        }
        Ok(Self { allocations })
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Number of parts the generator creates.
    pub fn total(&self) -> u64 {
        self.allocations.iter().map(|a| u64::from(a.count)).sum()
    }

    /// Create the initial parts with ids `1..=total()`, paired with the
    /// queue each belongs in.
    pub fn generate(&self, part_type: &str) -> Vec<(QueueKey, Part)> {
        let mut next = 0u64;
        let mut parts = Vec::with_capacity(self.total() as usize);
        for a in &self.allocations {
            for _ in 0..a.count {
                next += 1;
                let part = Part::new(
                    PartId(next),
                    part_type,
                    Location::Queue(a.queue_id),
                    SimTime::ZERO,
                );
                parts.push((a.queue, part));
            }
        }
        parts
    }
}

#[cfg(test)]
mod tests {
    use crate::id::PartId;
    use crate::model::ModelSpec;
    use crate::part::Location;
    use crate::sim::RunConfig;
    use crate::test_utils::*;
    use crate::topology::{Topology, TopologyError};

    #[test]
    fn parts_fill_queues_in_arc_order() {
        let mut spec = line_model(3, 1, 3);
        spec.initial = vec![2, 1];
        let topo = Topology::from_spec(&spec, &RunConfig::default()).unwrap();
        let generator = topo.generator();
        assert_eq!(generator.total(), 3);

        let parts = generator.generate("A");
        let placed: Vec<_> = parts
            .iter()
            .map(|(_, p)| (p.id(), p.location()))
            .collect();
        assert_eq!(
            placed,
            vec![
                (PartId(1), Location::Queue(1)),
                (PartId(2), Location::Queue(1)),
                (PartId(3), Location::Queue(2)),
            ]
        );
        assert_eq!(parts[0].0, topo.arc_queue(0).unwrap());
        assert_eq!(parts[2].0, topo.arc_queue(1).unwrap());
    }

    #[test]
    fn zero_entries_are_skipped() {
        let mut spec = line_model(3, 1, 1);
        spec.initial = vec![0, 1];
        let topo = Topology::from_spec(&spec, &RunConfig::default()).unwrap();
        assert_eq!(topo.generator().allocations().len(), 1);
        assert_eq!(topo.generator().generate("A")[0].1.location(), Location::Queue(2));
    }

    #[test]
    fn over_capacity_is_rejected() {
        let mut spec = line_model(2, 1, 2);
        spec.initial = vec![3];
        let err = Topology::from_spec(&spec, &RunConfig::default()).unwrap_err();
        assert_eq!(
            err,
            TopologyError::InitialOverCapacity { queue: 1, requested: 3, capacity: 2 }
        );
    }

    #[test]
    fn merged_queue_counts_every_source_arc() {
        // Both arcs end up in M3's merged queue of capacity 2.
        let spec = ModelSpec {
            nodes: vec![node(1, 1), node(2, 1), node(3, 1)],
            arcs: vec![arc(1, 3, 1, 1), arc(2, 3, 1, 1)],
            initial: vec![1, 1],
        };
        let topo = Topology::from_spec(&spec, &RunConfig::default()).unwrap();
        let parts = topo.generator().generate("A");
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|(q, _)| Some(*q) == topo.arc_queue(0)));

        let mut spec = spec;
        spec.initial = vec![2, 1];
        assert!(matches!(
            Topology::from_spec(&spec, &RunConfig::default()),
            Err(TopologyError::InitialOverCapacity { requested: 3, .. })
        ));
    }

    #[test]
    fn disabled_initial_wip_generates_nothing() {
        let mut spec = line_model(2, 1, 1);
        spec.initial = vec![1];
        let config = RunConfig::default().with_initial_wip(false);
        let topo = Topology::from_spec(&spec, &config).unwrap();
        assert_eq!(topo.generator().total(), 0);
    }
}

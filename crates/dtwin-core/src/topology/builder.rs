use super::{Layout, TopologyError};
use crate::fixed::SimTime;
use crate::id::{MachineKey, PartId, QueueKey};
use crate::machine::Machine;
use crate::model::ModelSpec;
use crate::part::{Location, Part};
use crate::queue::Queue;
use crate::sim::RunConfig;
use slotmap::{SecondaryMap, SlotMap};
use tracing::debug;

/// Creates machines and raw queues from a model.
pub struct TopologyBuilder<'a> {
    spec: &'a ModelSpec,
    config: &'a RunConfig,
}

/// Output of [`TopologyBuilder::build`]: one queue per declared arc, so a
/// machine may still have several input queues.
#[derive(Debug)]
pub struct BuiltLayout {
    pub(crate) layout: Layout,
    pub(crate) inbound: SecondaryMap<MachineKey, Vec<QueueKey>>,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(spec: &'a ModelSpec, config: &'a RunConfig) -> Self {
        Self { spec, config }
    }

    pub fn build(self) -> Result<BuiltLayout, TopologyError> {
        let spec = self.spec;
        if spec.nodes.is_empty() {
            return Err(TopologyError::EmptyModel);
        }
        if !self.config.stop.is_bounded() {
            return Err(TopologyError::UnboundedExit);
        }

        let initial = if self.config.initial_wip {
            if spec.initial.len() > spec.arcs.len() {
                return Err(TopologyError::TooManyInitialEntries {
                    entries: spec.initial.len(),
                    arcs: spec.arcs.len(),
                });
            }
            spec.initial.clone()
        } else {
            Vec::new()
        };

        // Generator parts take ids 1..=sum(initial); worked-time parts follow.
        let mut last_part_id: u64 = initial.iter().map(|&n| u64::from(n)).sum();

        let mut machines = SlotMap::with_capacity_and_key(spec.nodes.len());
        let mut machine_order = Vec::with_capacity(spec.nodes.len());
        let last = spec.nodes.len() - 1;
        for (pos, node) in spec.nodes.iter().enumerate() {
            if node.capacity == 0 {
                return Err(TopologyError::ZeroCapacity {
                    what: "machine",
                    id: node.activity,
                });
            }
            let initial_part = (node.worked_time != SimTime::ZERO).then(|| {
                last_part_id += 1;
                Part::new(
                    PartId(last_part_id),
                    self.config.part_type.clone(),
                    Location::Machine(node.activity),
                    SimTime::ZERO,
                )
            });
            let key = machines.insert(Machine {
                id: node.activity,
                capacity: node.capacity,
                process_time: node.process_time,
                frequency: node.frequency,
                cluster: node.cluster,
                queue_in: None,
                queue_out: Vec::new(),
                conveyors_in: Vec::new(),
                conveyors_out: Vec::new(),
                branch: None,
                last_part_id,
                worked_time: node.worked_time,
                initial_part,
                final_machine: pos == last,
            });
            machine_order.push(key);
        }

        let mut queues = SlotMap::with_capacity_and_key(spec.arcs.len());
        let mut arc_queues = Vec::with_capacity(spec.arcs.len());
        let mut inbound: SecondaryMap<MachineKey, Vec<QueueKey>> = machine_order
            .iter()
            .map(|&m| (m, Vec::new()))
            .collect();
        for (idx, arc) in spec.arcs.iter().enumerate() {
            for node in arc.arc {
                if node == 0 || node > spec.nodes.len() {
                    return Err(TopologyError::UnknownNode {
                        arc: idx + 1,
                        node,
                        nodes: spec.nodes.len(),
                    });
                }
            }
            let id = idx as u32 + 1;
            if arc.capacity == 0 {
                return Err(TopologyError::ZeroCapacity { what: "queue", id });
            }
            let (from, to) = (arc.from() - 1, arc.to() - 1);
            let key = queues.insert(Queue::from_arc(
                id,
                arc.capacity,
                arc.transport_time,
                arc.frequency,
                (from, to),
            ));
            machines[machine_order[from]].queue_out.push(key);
            inbound[machine_order[to]].push(key);
            arc_queues.push(key);
        }

        for &key in &machine_order {
            let m = &machines[key];
            if !m.final_machine && m.queue_out.is_empty() {
                return Err(TopologyError::MissingOutput { machine: m.id });
            }
        }

        debug!(
            machines = machine_order.len(),
            queues = arc_queues.len(),
            last_part_id,
            "built layout"
        );

        Ok(BuiltLayout {
            layout: Layout {
                machines,
                machine_order,
                queues,
                arc_queues,
                initial,
                last_part_id,
            },
            inbound,
        })
    }
}

impl BuiltLayout {
    pub fn machine_keys(&self) -> &[MachineKey] {
        &self.layout.machine_order
    }

    pub fn machine(&self, key: MachineKey) -> &Machine {
        &self.layout.machines[key]
    }

    pub fn queue(&self, key: QueueKey) -> &Queue {
        &self.layout.queues[key]
    }

    /// Every queue feeding `machine`, in arc declaration order.
    pub fn inbound(&self, machine: MachineKey) -> &[QueueKey] {
        self.inbound.get(machine).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn last_part_id(&self) -> u64 {
        self.layout.last_part_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArcSpec, NodeSpec};
    use crate::test_utils::*;

    fn build(spec: &ModelSpec) -> Result<BuiltLayout, TopologyError> {
        TopologyBuilder::new(spec, &RunConfig::default()).build()
    }

    // -----------------------------------------------------------------------
    // Test 1: one machine per node, one queue per arc
    // -----------------------------------------------------------------------
    #[test]
    fn creates_machines_and_queues() {
        let built = build(&line_model(3, 5, 2)).unwrap();
        let keys = built.machine_keys();
        assert_eq!(keys.len(), 3);

        let m1 = built.machine(keys[0]);
        assert_eq!(m1.id(), 1);
        assert_eq!(m1.queue_out().len(), 1);
        assert!(built.inbound(keys[0]).is_empty());

        let q = built.queue(m1.queue_out()[0]);
        assert_eq!(q.id(), 1);
        assert_eq!(q.capacity(), 2);
        assert_eq!(q.arc_links(), &[(0, 1)]);
        assert_eq!(built.inbound(keys[1]), m1.queue_out());
    }

    // -----------------------------------------------------------------------
    // Test 2: only the last node is final
    // -----------------------------------------------------------------------
    #[test]
    fn last_node_is_final() {
        let built = build(&line_model(4, 1, 1)).unwrap();
        let finals: Vec<_> = built
            .machine_keys()
            .iter()
            .filter(|&&k| built.machine(k).is_final())
            .collect();
        assert_eq!(finals, vec![&built.machine_keys()[3]]);
    }

    // -----------------------------------------------------------------------
    // Test 3: worked-time parts take ids after the generator's
    // -----------------------------------------------------------------------
    #[test]
    fn worked_time_parts_follow_initial_ids() {
        let mut spec = line_model(3, 5, 4);
        spec.nodes[1] = spec.nodes[1].clone().with_worked_time(SimTime::from_num(2));
        spec.nodes[2] = spec.nodes[2].clone().with_worked_time(SimTime::from_num(1));
        spec.initial = vec![2, 1];

        let built = build(&spec).unwrap();
        let keys = built.machine_keys();
        assert!(built.machine(keys[0]).initial_part().is_none());

        let p2 = built.machine(keys[1]).initial_part().unwrap();
        assert_eq!(p2.id(), PartId(4));
        assert_eq!(p2.location(), Location::Machine(2));
        assert_eq!(p2.creation_time(), SimTime::ZERO);

        let p3 = built.machine(keys[2]).initial_part().unwrap();
        assert_eq!(p3.id(), PartId(5));
        assert_eq!(built.last_part_id(), 5);
        assert_eq!(built.machine(keys[2]).last_part_id(), 5);
    }

    #[test]
    fn disabled_initial_wip_starts_ids_at_one() {
        let mut spec = line_model(2, 5, 4);
        spec.nodes[0] = spec.nodes[0].clone().with_worked_time(SimTime::ONE);
        spec.initial = vec![3];
        let config = RunConfig::default().with_initial_wip(false);
        let built = TopologyBuilder::new(&spec, &config).build().unwrap();
        let p = built.machine(built.machine_keys()[0]).initial_part().unwrap();
        assert_eq!(p.id(), PartId(1));
    }

    // -----------------------------------------------------------------------
    // Test 4: construction errors
    // -----------------------------------------------------------------------
    #[test]
    fn unknown_node_is_rejected() {
        let mut spec = line_model(2, 5, 1);
        spec.arcs.push(ArcSpec::new(2, 7, 1, SimTime::ONE));
        assert_eq!(
            build(&spec).unwrap_err(),
            TopologyError::UnknownNode { arc: 2, node: 7, nodes: 2 }
        );

        let mut spec = line_model(2, 5, 1);
        spec.arcs[0].arc = [0, 2];
        assert!(matches!(build(&spec), Err(TopologyError::UnknownNode { node: 0, .. })));
    }

    #[test]
    fn empty_model_is_rejected() {
        let spec = ModelSpec { nodes: vec![], arcs: vec![], initial: vec![] };
        assert_eq!(build(&spec).unwrap_err(), TopologyError::EmptyModel);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut spec = line_model(2, 5, 1);
        spec.nodes[1] = NodeSpec::new(2, 0, SimTime::ONE);
        assert_eq!(
            build(&spec).unwrap_err(),
            TopologyError::ZeroCapacity { what: "machine", id: 2 }
        );

        let mut spec = line_model(2, 5, 1);
        spec.arcs[0].capacity = 0;
        assert_eq!(
            build(&spec).unwrap_err(),
            TopologyError::ZeroCapacity { what: "queue", id: 1 }
        );
    }

    #[test]
    fn non_final_machine_without_output_is_rejected() {
        let spec = ModelSpec {
            nodes: vec![node(1, 5), node(2, 5)],
            arcs: vec![],
            initial: vec![],
        };
        assert_eq!(
            build(&spec).unwrap_err(),
            TopologyError::MissingOutput { machine: 1 }
        );
    }

    #[test]
    fn too_many_initial_entries_is_rejected() {
        let mut spec = line_model(2, 5, 1);
        spec.initial = vec![1, 1];
        assert_eq!(
            build(&spec).unwrap_err(),
            TopologyError::TooManyInitialEntries { entries: 2, arcs: 1 }
        );
    }
}

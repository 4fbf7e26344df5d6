use super::wiring::WiredLayout;
use super::{Topology, TopologyError};
use crate::branch::Branch;
use crate::generator::Generator;
use crate::id::{BranchId, QueueKey};
use tracing::debug;

impl WiredLayout {
    /// Flag every machine with more than one outbound conveyor as a branch
    /// point, plan the initial WIP, and freeze the result.
    pub fn discover_branches(self) -> Result<Topology, TopologyError> {
        let WiredLayout {
            mut layout,
            conveyors,
            conveyor_order,
        } = self;

        let consumers = layout.consumers();

        let mut branches: Vec<Branch> = Vec::new();
        for &mkey in &layout.machine_order {
            let machine = &mut layout.machines[mkey];
            if machine.conveyors_out.len() <= 1 {
                continue;
            }
            let id = BranchId(branches.len() as u32 + 1);
            for &c in &machine.conveyors_out {
                let queue = conveyors[c].queue_out;
                if !consumers.contains_key(queue) {
                    return Err(TopologyError::BranchOutsideGraph {
                        branch: id.0,
                        queue: layout.queues[queue].id,
                    });
                }
            }
            machine.branch = Some(id);
            branches.push(Branch {
                id,
                machine: mkey,
                conveyors: machine.conveyors_out.clone(),
                queue_in: machine.queue_in,
            });
        }
        debug!(branches = branches.len(), "branch discovery complete");

        let generator = Generator::plan(&layout)?;

        let mut queue_order: Vec<QueueKey> = layout.queues.keys().collect();
        queue_order.sort_by_key(|&q| layout.queues[q].id);

        Ok(Topology {
            machines: layout.machines,
            machine_order: layout.machine_order,
            queues: layout.queues,
            queue_order,
            conveyors,
            conveyor_order,
            branches,
            arc_queues: layout.arc_queues,
            generator,
            last_part_id: layout.last_part_id,
        })
    }
}

use super::Layout;
use super::cluster::ClusteredLayout;
use crate::conveyor::Conveyor;
use crate::id::{ConveyorKey, MachineKey};
use crate::machine::Machine;
use slotmap::SlotMap;
use tracing::debug;

/// Every output queue is reached through exactly one conveyor.
#[derive(Debug)]
pub struct WiredLayout {
    pub(crate) layout: Layout,
    pub(crate) conveyors: SlotMap<ConveyorKey, Conveyor>,
    pub(crate) conveyor_order: Vec<ConveyorKey>,
}

impl ClusteredLayout {
    /// Create one conveyor per machine output queue, then attach to each
    /// machine the conveyors that deliver into its input queue.
    pub fn assign_conveyors(self) -> WiredLayout {
        let ClusteredLayout { mut layout } = self;
        let mut conveyors: SlotMap<ConveyorKey, Conveyor> = SlotMap::with_key();
        let mut conveyor_order = Vec::new();

        for &mkey in &layout.machine_order {
            let machine = &mut layout.machines[mkey];
            machine.conveyors_out = machine
                .queue_out
                .iter()
                .map(|&q| {
                    let key = conveyors.insert(Conveyor {
                        id: conveyor_order.len() as u32 + 1,
                        transport_time: layout.queues[q].transport_time,
                        queue_out: q,
                    });
                    conveyor_order.push(key);
                    key
                })
                .collect();
        }

        for &mkey in &layout.machine_order {
            let machine = &mut layout.machines[mkey];
            machine.conveyors_in = match machine.queue_in {
                Some(q) => conveyor_order
                    .iter()
                    .copied()
                    .filter(|&c| conveyors[c].queue_out == q)
                    .collect(),
                None => Vec::new(),
            };
        }

        debug!(conveyors = conveyor_order.len(), "conveyor assignment complete");
        WiredLayout {
            layout,
            conveyors,
            conveyor_order,
        }
    }
}

impl WiredLayout {
    pub fn machine_keys(&self) -> &[MachineKey] {
        &self.layout.machine_order
    }

    pub fn machine(&self, key: MachineKey) -> &Machine {
        &self.layout.machines[key]
    }

    pub fn conveyor(&self, key: ConveyorKey) -> &Conveyor {
        &self.conveyors[key]
    }

    pub fn conveyor_count(&self) -> usize {
        self.conveyor_order.len()
    }
}

use super::builder::BuiltLayout;
use super::{Layout, TopologyError};
use crate::id::{MachineKey, QueueKey};
use crate::machine::Machine;
use crate::queue::Queue;
use slotmap::SecondaryMap;
use tracing::debug;

/// Every machine with inbound arcs now has exactly one `queue_in`, and
/// queue ids are dense `1..=N`.
#[derive(Debug)]
pub struct MergedLayout {
    pub(crate) layout: Layout,
    pub(crate) merges: usize,
}

impl BuiltLayout {
    /// Collapse the input queues of every multi-input machine into one.
    ///
    /// The merged queue's capacity is the sum of its sources' and its
    /// transport time is theirs, which must agree. References in other
    /// machines' `queue_out` and in the arc table are rewritten by key.
    pub fn merge_queues(self) -> Result<MergedLayout, TopologyError> {
        let BuiltLayout { mut layout, inbound } = self;
        let mut replaced: SecondaryMap<QueueKey, QueueKey> = SecondaryMap::new();
        let mut merges = 0;

        for &mkey in &layout.machine_order {
            let sources = &inbound[mkey];
            let queue_in = match sources.as_slice() {
                [] => None,
                [only] => Some(*only),
                [first, rest @ ..] => {
                    let machine_id = layout.machines[mkey].id;
                    let base = layout.queues[*first].clone();
                    let mut merged = Queue {
                        id: 0,
                        capacity: base.capacity,
                        transport_time: base.transport_time,
                        frequency: base.frequency,
                        cluster: None,
                        arc_links: base.arc_links,
                    };
                    for &src in rest {
                        let q = &layout.queues[src];
                        if q.transport_time != merged.transport_time {
                            return Err(TopologyError::TransportTimeMismatch {
                                machine: machine_id,
                                first: merged.transport_time,
                                second: q.transport_time,
                            });
                        }
                        merged.capacity += q.capacity;
                        merged.arc_links.extend_from_slice(&q.arc_links);
                    }
                    let merged_key = layout.queues.insert(merged);
                    for &src in sources {
                        layout.queues.remove(src);
                        replaced.insert(src, merged_key);
                    }
                    merges += 1;
                    debug!(
                        machine = machine_id,
                        sources = sources.len(),
                        capacity = layout.queues[merged_key].capacity,
                        "merged input queues"
                    );
                    Some(merged_key)
                }
            };
            layout.machines[mkey].queue_in = queue_in;
        }

        if !replaced.is_empty() {
            for &mkey in &layout.machine_order {
                rewrite_outputs(&mut layout.machines[mkey], &replaced);
            }
            for q in &mut layout.arc_queues {
                if let Some(&merged) = replaced.get(*q) {
                    *q = merged;
                }
            }
        }

        renumber(&mut layout)?;
        debug!(merges, queues = layout.queues.len(), "queue merge complete");
        Ok(MergedLayout { layout, merges })
    }
}

/// Point `queue_out` at merged queues. Parallel arcs stay parallel: each
/// keeps its own output slot, and later its own conveyor.
fn rewrite_outputs(machine: &mut Machine, replaced: &SecondaryMap<QueueKey, QueueKey>) {
    for q in &mut machine.queue_out {
        if let Some(&merged) = replaced.get(*q) {
            *q = merged;
        }
    }
}

/// Assign dense ids in machine visiting order.
fn renumber(layout: &mut Layout) -> Result<(), TopologyError> {
    let mut numbered: SecondaryMap<QueueKey, ()> = SecondaryMap::new();
    let mut next = 1;
    for &mkey in &layout.machine_order {
        if let Some(q) = layout.machines[mkey].queue_in
            && numbered.insert(q, ()).is_none()
        {
            layout.queues[q].id = next;
            next += 1;
        }
    }
    if let Some((_, q)) = layout.queues.iter().find(|(k, _)| !numbered.contains_key(*k)) {
        return Err(TopologyError::DanglingQueue { queue: q.id });
    }
    Ok(())
}

impl MergedLayout {
    pub fn machine_keys(&self) -> &[MachineKey] {
        &self.layout.machine_order
    }

    pub fn machine(&self, key: MachineKey) -> &Machine {
        &self.layout.machines[key]
    }

    pub fn queue(&self, key: QueueKey) -> &Queue {
        &self.layout.queues[key]
    }

    pub fn queue_count(&self) -> usize {
        self.layout.queues.len()
    }

    /// Number of machines whose inputs were merged.
    pub fn merges(&self) -> usize {
        self.merges
    }
}

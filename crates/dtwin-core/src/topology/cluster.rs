use super::Layout;
use super::merge::MergedLayout;
use crate::id::{MachineKey, QueueKey};
use crate::machine::Machine;
use crate::queue::Queue;
use slotmap::SecondaryMap;
use tracing::debug;

/// Machines and queues reachable from the first machine carry a cluster
/// number equal to their stage depth.
#[derive(Debug)]
pub struct ClusteredLayout {
    pub(crate) layout: Layout,
}

impl MergedLayout {
    /// Forward-propagate cluster numbers from the first machine.
    ///
    /// The first machine is cluster 1. Every other reachable machine sits
    /// one stage below its deepest upstream producer, and its input queue
    /// carries the same number. Edges that close a loop back into a machine
    /// already on the current path do not renumber it; the queue they feed
    /// is stamped with the producer's cluster plus one unless a downstream
    /// edge already numbered it. Unreachable machines keep their configured
    /// cluster.
    pub fn discover_clusters(self) -> ClusteredLayout {
        let MergedLayout { mut layout, .. } = self;
        let consumers = layout.consumers();
        let first = layout.machine_order[0];

        // Depth-first walk in build order. Reverse postorder ranks every
        // machine after all of its non-loop producers.
        let mut seen: SecondaryMap<MachineKey, ()> = SecondaryMap::new();
        let mut on_path: SecondaryMap<MachineKey, ()> = SecondaryMap::new();
        let mut postorder: Vec<MachineKey> = Vec::new();
        let mut stack: Vec<(MachineKey, usize)> = vec![(first, 0)];
        seen.insert(first, ());
        on_path.insert(first, ());
        while let Some(top) = stack.last_mut() {
            let (mkey, next_out) = *top;
            let Some(&qkey) = layout.machines[mkey].queue_out.get(next_out) else {
                stack.pop();
                on_path.remove(mkey);
                postorder.push(mkey);
                continue;
            };
            top.1 += 1;
            if let Some(&next) = consumers.get(qkey)
                && !on_path.contains_key(next)
                && seen.insert(next, ()).is_none()
            {
                on_path.insert(next, ());
                stack.push((next, 0));
            }
        }
        postorder.reverse();
        let order = postorder;
        let rank: SecondaryMap<MachineKey, usize> =
            order.iter().enumerate().map(|(i, &m)| (m, i)).collect();
        let downstream = |from: MachineKey, to: MachineKey| rank[to] > rank[from];

        // Longest path over the downstream edges.
        let mut depth: SecondaryMap<MachineKey, u32> = SecondaryMap::new();
        depth.insert(first, 1);
        for &mkey in &order {
            let stamp = depth.get(mkey).copied().unwrap_or(1) + 1;
            for &qkey in &layout.machines[mkey].queue_out {
                if let Some(&next) = consumers.get(qkey)
                    && downstream(mkey, next)
                {
                    if let Some(entry) = depth.entry(next) {
                        let d = entry.or_insert(stamp);
                        *d = (*d).max(stamp);
                    }
                }
            }
        }

        let mut numbered: SecondaryMap<QueueKey, ()> = SecondaryMap::new();
        for &mkey in &order {
            let cluster = depth.get(mkey).copied().unwrap_or(1);
            layout.machines[mkey].cluster = cluster;
            for qi in 0..layout.machines[mkey].queue_out.len() {
                let qkey = layout.machines[mkey].queue_out[qi];
                let Some(&next) = consumers.get(qkey) else {
                    continue;
                };
                if downstream(mkey, next) {
                    layout.queues[qkey].cluster = depth.get(next).copied();
                    numbered.insert(qkey, ());
                }
            }
        }
        for &mkey in &order {
            let stamp = layout.machines[mkey].cluster + 1;
            for qi in 0..layout.machines[mkey].queue_out.len() {
                let qkey = layout.machines[mkey].queue_out[qi];
                if numbered.contains_key(qkey) {
                    continue;
                }
                let queue = &mut layout.queues[qkey];
                queue.cluster = Some(queue.cluster.map_or(stamp, |c| c.max(stamp)));
            }
        }

        debug!(
            reached = order.len(),
            machines = layout.machine_order.len(),
            "cluster discovery complete"
        );
        ClusteredLayout { layout }
    }
}

impl ClusteredLayout {
    pub fn machine_keys(&self) -> &[MachineKey] {
        &self.layout.machine_order
    }

    pub fn machine(&self, key: MachineKey) -> &Machine {
        &self.layout.machines[key]
    }

    pub fn queue(&self, key: QueueKey) -> &Queue {
        &self.layout.queues[key]
    }
}

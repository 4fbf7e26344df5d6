//! Structural checks of a frozen topology, consistency checks of a running
//! engine, and a determinism check that runs a model twice.

use crate::engine::{PartCensus, SimulationEngine};
use crate::event::EventSink;
use crate::id::{MachineKey, QueueKey};
use crate::machine::LaneState;
use crate::model::ModelSpec;
use crate::part::Location;
use crate::sim::{RunConfig, RunSummary};
use crate::topology::{Topology, TopologyError};
use slotmap::SecondaryMap;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Queue ids are not exactly `1..=N` in order.
    QueueIdNotDense { position: usize, id: u32 },
    /// A queue feeds no machine.
    OrphanQueue { queue: u32 },
    /// A queue is the input of more than one machine.
    SharedInputQueue { queue: u32 },
    /// The first machine is not in cluster 1.
    FirstMachineCluster { cluster: u32 },
    /// A reachable machine's cluster differs from its input queue's.
    ClusterMismatch { machine: u32, machine_cluster: u32, queue_cluster: Option<u32> },
    /// No reachable producer of a machine's input sits one stage upstream.
    ClusterGap { machine: u32, cluster: u32 },
    /// Not exactly one machine is flagged final.
    FinalMachineCount { count: usize },
    /// `branch` is set iff there is more than one outbound conveyor.
    BranchMismatch { machine: u32 },
    /// Outbound conveyor `i` does not deliver into output queue `i`, or
    /// does not copy its transport time.
    ConveyorMismatch { machine: u32, conveyor: u32 },
    /// `conveyors_in` is not the set of conveyors delivering to `queue_in`.
    InboundConveyorMismatch { machine: u32 },
    /// A part's location disagrees with the container holding it.
    PartMisplaced { part: u64, expected: Location, found: Location },
    /// queued + in machines + in conveyors + terminated != created.
    PartsNotConserved { census: PartCensus },
}

// ---------------------------------------------------------------------------
// Topology checks
// ---------------------------------------------------------------------------

/// Check every structural invariant of a built topology.
pub fn validate_topology(topology: &Topology) -> Vec<Violation> {
    let mut violations = Vec::new();

    // Dense queue ids and single consumers.
    let mut consumers: SecondaryMap<QueueKey, Vec<MachineKey>> = SecondaryMap::new();
    for (key, m) in topology.machines() {
        if let Some(q) = m.queue_in()
            && let Some(entry) = consumers.entry(q)
        {
            entry.or_insert_with(Vec::new).push(key);
        }
    }
    for (position, (qkey, q)) in topology.queues().enumerate() {
        if q.id() as usize != position + 1 {
            violations.push(Violation::QueueIdNotDense { position, id: q.id() });
        }
        match consumers.get(qkey).map(Vec::len).unwrap_or(0) {
            0 => violations.push(Violation::OrphanQueue { queue: q.id() }),
            1 => {}
            _ => violations.push(Violation::SharedInputQueue { queue: q.id() }),
        }
    }

    check_clusters(topology, &consumers, &mut violations);

    let finals = topology.machines().filter(|(_, m)| m.is_final()).count();
    if finals != 1 {
        violations.push(Violation::FinalMachineCount { count: finals });
    }

    for (_, m) in topology.machines() {
        if m.branch().is_some() != (m.conveyors_out().len() > 1) {
            violations.push(Violation::BranchMismatch { machine: m.id() });
        }
        if m.conveyors_out().len() != m.queue_out().len() {
            violations.push(Violation::ConveyorMismatch { machine: m.id(), conveyor: 0 });
        }
        for (&c, &q) in m.conveyors_out().iter().zip(m.queue_out()) {
            let conveyor = topology.conveyor(c);
            if conveyor.queue_out() != q
                || conveyor.transport_time() != topology.queue(q).transport_time()
            {
                violations.push(Violation::ConveyorMismatch {
                    machine: m.id(),
                    conveyor: conveyor.id(),
                });
            }
        }
        let expected: Vec<_> = match m.queue_in() {
            Some(q) => topology
                .conveyors()
                .filter(|(_, c)| c.queue_out() == q)
                .map(|(k, _)| k)
                .collect(),
            None => Vec::new(),
        };
        if m.conveyors_in() != expected.as_slice() {
            violations.push(Violation::InboundConveyorMismatch { machine: m.id() });
        }
    }

    violations
}

fn check_clusters(
    topology: &Topology,
    consumers: &SecondaryMap<QueueKey, Vec<MachineKey>>,
    violations: &mut Vec<Violation>,
) {
    let first = topology.first_machine();
    let first_cluster = topology.machine(first).cluster();
    if first_cluster != 1 {
        violations.push(Violation::FirstMachineCluster {
            cluster: first_cluster,
        });
    }

    // Machines reachable from the first one.
    let mut reached: SecondaryMap<MachineKey, ()> = SecondaryMap::new();
    reached.insert(first, ());
    let mut worklist = VecDeque::from([first]);
    while let Some(m) = worklist.pop_front() {
        for &q in topology.machine(m).queue_out() {
            for &next in consumers.get(q).into_iter().flatten() {
                if reached.insert(next, ()).is_none() {
                    worklist.push_back(next);
                }
            }
        }
    }

    for (key, m) in topology.machines() {
        if key == first || !reached.contains_key(key) {
            continue;
        }
        let Some(q) = m.queue_in() else { continue };
        let queue_cluster = topology.queue(q).cluster();
        if queue_cluster != Some(m.cluster()) {
            violations.push(Violation::ClusterMismatch {
                machine: m.id(),
                machine_cluster: m.cluster(),
                queue_cluster,
            });
            continue;
        }
        let has_upstream_stage = topology.machines().any(|(k, up)| {
            reached.contains_key(k) && up.queue_out().contains(&q) && up.cluster() + 1 == m.cluster()
        });
        if !has_upstream_stage {
            violations.push(Violation::ClusterGap {
                machine: m.id(),
                cluster: m.cluster(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Engine checks
// ---------------------------------------------------------------------------

/// Check part conservation and that every part's location names the
/// container holding it.
pub fn validate_engine_state<S: EventSink>(engine: &SimulationEngine<S>) -> Vec<Violation> {
    let mut violations = Vec::new();
    let topology = engine.topology();

    let census = engine.census();
    if !census.is_conserved() {
        violations.push(Violation::PartsNotConserved { census });
    }

    let mut expect = |expected: Location, found: Location, part: u64| {
        if expected != found {
            violations.push(Violation::PartMisplaced { part, expected, found });
        }
    };

    for (qkey, q) in topology.queues() {
        for part in engine.queue_buffer(qkey).parts() {
            expect(Location::Queue(q.id()), part.location(), part.id().0);
        }
    }
    for (mkey, m) in topology.machines() {
        for lane in engine.lanes(mkey) {
            if let LaneState::Processing { part } | LaneState::Pushing { part, .. } = lane {
                expect(Location::Machine(m.id()), part.location(), part.id().0);
            }
        }
    }
    for (ckey, c) in topology.conveyors() {
        if let Some(part) = engine.conveyor_state(ckey).part() {
            expect(Location::Conveyor(c.id()), part.location(), part.id().0);
        }
    }
    for part in engine.terminator().all_items() {
        expect(Location::Terminator, part.location(), part.id().0);
    }

    violations
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

/// Result of running the same model twice.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    pub is_deterministic: bool,
    pub digest_a: u64,
    pub digest_b: u64,
    /// Index of the first differing event record, if any.
    pub divergence_index: Option<usize>,
    pub summary: RunSummary,
}

/// Build and run `spec` twice under `config` and compare event logs.
pub fn validate_determinism(
    spec: &ModelSpec,
    config: &RunConfig,
) -> Result<DeterminismResult, TopologyError> {
    let mut engine_a = SimulationEngine::from_spec(spec, config.clone())?;
    let mut engine_b = SimulationEngine::from_spec(spec, config.clone())?;

    let summary = engine_a.run();
    let summary_b = engine_b.run();

    let (log_a, log_b) = (engine_a.event_log(), engine_b.event_log());
    let divergence_index = log_a.first_divergence(log_b);
    let (digest_a, digest_b) = (log_a.digest(), log_b.digest());

    Ok(DeterminismResult {
        is_deterministic: divergence_index.is_none() && digest_a == digest_b && summary == summary_b,
        digest_a,
        digest_b,
        divergence_index,
        summary,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

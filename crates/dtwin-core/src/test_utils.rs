//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::engine::SimulationEngine;
use crate::fixed::SimTime;
use crate::model::{ArcSpec, ModelSpec, NodeSpec};
use crate::sim::RunConfig;

// ===========================================================================
// Time helper
// ===========================================================================

pub fn t(v: i32) -> SimTime {
    SimTime::from_num(v)
}

// ===========================================================================
// Node and arc constructors
// ===========================================================================

/// Capacity-1 machine with the given process time.
pub fn node(activity: u32, process_time: i32) -> NodeSpec {
    NodeSpec::new(activity, 1, t(process_time))
}

pub fn arc(from: usize, to: usize, capacity: u32, transport_time: i32) -> ArcSpec {
    ArcSpec::new(from, to, capacity, t(transport_time))
}

// ===========================================================================
// Model builders
// ===========================================================================

/// `M1 -> M2 -> ... -> Mn`, transport time 1 on every arc.
pub fn line_model(n: u32, process_time: i32, queue_capacity: u32) -> ModelSpec {
    let nodes = (1..=n).map(|i| node(i, process_time)).collect();
    let arcs = (1..n as usize)
        .map(|i| arc(i, i + 1, queue_capacity, 1))
        .collect();
    ModelSpec {
        nodes,
        arcs,
        initial: Vec::new(),
    }
}

/// A line whose last machine feeds the first again.
pub fn closed_loop_model(n: u32, process_time: i32, queue_capacity: u32) -> ModelSpec {
    let mut spec = line_model(n, process_time, queue_capacity);
    spec.arcs.push(arc(n as usize, 1, queue_capacity, 1));
    spec
}

/// `M1 -> {M2, M3} -> M4`. M1 is a branch point and M4 merges.
pub fn branch_model() -> ModelSpec {
    ModelSpec {
        nodes: (1..=4).map(|i| node(i, 1)).collect(),
        arcs: vec![
            arc(1, 2, 2, 1),
            arc(1, 3, 2, 1),
            arc(2, 4, 2, 1),
            arc(3, 4, 2, 1),
        ],
        initial: Vec::new(),
    }
}

/// [`branch_model`] with M4 feeding M1, so parts recirculate.
pub fn branch_loop_model() -> ModelSpec {
    let mut spec = branch_model();
    spec.arcs.push(arc(4, 1, 2, 1));
    spec
}

/// `stages` parallel lines of `width` machines joined at both ends:
/// a source machine fans out to every line and a sink merges them, with
/// a loop back to the source. Used for load and benchmark runs.
pub fn grid_model(stages: u32, width: u32, process_time: i32) -> ModelSpec {
    let source = 1usize;
    let sink = (stages * width + 2) as usize;
    let mut nodes = vec![node(1, process_time)];
    let mut arcs = Vec::new();
    for lane in 0..width {
        for stage in 0..stages {
            let id = 2 + (lane * stages + stage);
            nodes.push(node(id, process_time));
            let from = if stage == 0 { source } else { id as usize - 1 };
            arcs.push(arc(from, id as usize, 2, 1));
        }
        arcs.push(arc((1 + (lane + 1) * stages) as usize, sink, 2, 1));
    }
    nodes.push(node(sink as u32, process_time));
    arcs.push(arc(sink, source, 4, 1));
    let initial = {
        let mut v = vec![0; arcs.len()];
        if let Some(last) = v.last_mut() {
            *last = 4;
        }
        v
    };
    ModelSpec {
        nodes,
        arcs,
        initial,
    }
}

// ===========================================================================
// Engine helpers
// ===========================================================================

pub fn build_engine(spec: &ModelSpec, config: RunConfig) -> SimulationEngine {
    SimulationEngine::from_spec(spec, config).expect("test model should build")
}

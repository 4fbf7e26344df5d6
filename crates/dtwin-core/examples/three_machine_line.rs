//! Three-machine line example: M1 -> M2 -> M3 with one part seeded.
//!
//! Builds the topology, runs it to a fixed horizon, and prints every event
//! of the digital log followed by the finished parts.
//!
//! Run with: `RUST_LOG=dtwin_core=debug cargo run -p dtwin-core --example three_machine_line`

use dtwin_core::engine::SimulationEngine;
use dtwin_core::fixed::SimTime;
use dtwin_core::model::{ArcSpec, ModelSpec, NodeSpec};
use dtwin_core::sim::{LoopType, RunConfig, StopCondition};
use dtwin_core::topology::Topology;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Step 1: Describe the line ---

    let spec = ModelSpec {
        nodes: (1..=3).map(|i| NodeSpec::new(i, 1, SimTime::from_num(5))).collect(),
        arcs: vec![
            ArcSpec::new(1, 2, 1, SimTime::from_num(2)),
            ArcSpec::new(2, 3, 1, SimTime::from_num(2)),
        ],
        initial: vec![1, 0],
    };

    // --- Step 2: Build and run ---

    let config = RunConfig::default()
        .with_loop_type(LoopType::Open)
        .with_stop(StopCondition::until(SimTime::from_num(50)));
    let topology = Topology::from_spec(&spec, &config).expect("line model is valid");
    for (_, m) in topology.machines() {
        println!(
            "machine {}: cluster {}, {} output(s){}",
            m.id(),
            m.cluster(),
            m.queue_out().len(),
            if m.is_final() { ", final" } else { "" }
        );
    }

    let mut engine = SimulationEngine::new(topology, config);
    let summary = engine.run();

    // --- Step 3: Inspect the log ---

    for record in engine.event_log().records() {
        println!(
            "{:>6}  {}  {:?}  {:?}",
            record.time.to_string(),
            record.part_id,
            record.location,
            record.kind
        );
    }
    for part in engine.finished_parts() {
        println!("{} cycle time {}", part.id, part.cycle_time());
    }
    println!("{summary:?}");
}

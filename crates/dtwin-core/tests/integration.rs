//! Integration tests for the dtwin simulation engine.
//!
//! These tests exercise end-to-end behavior across the full pipeline:
//! model loading, topology construction, the run loop, routing, closed-loop
//! replacement, and the event log.

use dtwin_core::branch::RoutingPolicy;
use dtwin_core::data_loader::load_model_json;
use dtwin_core::engine::SimulationEngine;
use dtwin_core::event::{EventKind, EventLog, EventRecord, EventSink};
use dtwin_core::id::PartId;
use dtwin_core::model::NodeSpec;
use dtwin_core::part::Location;
use dtwin_core::sim::{LoopType, RunConfig, StopCondition, StopReason};
use dtwin_core::test_utils::*;
use dtwin_core::topology::{Topology, TopologyError};

const THREE_LINE: &str = r#"{
    "nodes": [
        {"activity": 1, "frequency": 1, "capacity": 1, "contemp": 5, "cluster": 1, "worked_time": 0},
        {"activity": 2, "frequency": 1, "capacity": 1, "contemp": 5, "cluster": 2, "worked_time": 0},
        {"activity": 3, "frequency": 1, "capacity": 1, "contemp": 5, "cluster": 3, "worked_time": 0}
    ],
    "arcs": [
        {"arc": [1, 2], "capacity": 1, "frequency": 1, "contemp": 2},
        {"arc": [2, 3], "capacity": 1, "frequency": 1, "contemp": 3}
    ],
    "initial": [1, 0]
}"#;

// ===========================================================================
// Test 1: three-machine line loaded from JSON
// ===========================================================================
//
// M1 -> Q1 -> M2 -> Q2 -> M3. One part seeded in Q1 at t = 0 is processed
// by M2 for 5, carried to Q2 for 3, processed by M3 for 5.

#[test]
fn three_machine_line_from_json() {
    let spec = load_model_json(THREE_LINE).unwrap();
    let config = RunConfig::default()
        .with_loop_type(LoopType::Open)
        .with_stop(StopCondition::until(t(50)));
    let mut engine = build_engine(&spec, config);
    let summary = engine.run();

    assert_eq!(summary.reason, StopReason::HorizonReached);
    assert_eq!(summary.end_time, t(50));
    assert_eq!(summary.parts_created, 1);
    assert_eq!(summary.parts_finished, 1);

    let finished = engine.finished_parts();
    assert_eq!(finished[0].creation_time, t(0));
    assert_eq!(finished[0].termination_time, t(13));
    assert_eq!(finished[0].cycle_time(), t(13));

    let delivered: Vec<&EventRecord> = engine
        .event_log()
        .of_kind(EventKind::ConveyorDelivered)
        .collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].time, t(8));
    assert_eq!(delivered[0].location, Location::Conveyor(2));
}

// ===========================================================================
// Test 2: conflicting transport times on a merge
// ===========================================================================

#[test]
fn merge_with_conflicting_transport_times_fails() {
    let mut spec = branch_model();
    spec.arcs[2].transport_time = t(3);
    spec.arcs[3].transport_time = t(5);

    let err = Topology::from_spec(&spec, &RunConfig::default()).unwrap_err();
    assert_eq!(
        err,
        TopologyError::TransportTimeMismatch {
            machine: 4,
            first: t(3),
            second: t(5),
        }
    );
}

#[test]
fn merge_with_equal_transport_times_succeeds() {
    let spec = branch_model();
    let topo = Topology::from_spec(&spec, &RunConfig::default()).unwrap();
    let m4 = topo.machine_by_id(4).unwrap();
    let q = topo.machine(m4).queue_in().unwrap();
    assert_eq!(topo.queue(q).capacity(), 4);
    assert!(topo.queue(q).is_merged());
    assert_eq!(topo.machine(m4).conveyors_in().len(), 2);
}

// ===========================================================================
// Test 3: closed loop keeps work-in-progress constant
// ===========================================================================

#[test]
fn closed_loop_wip_is_constant() {
    let mut spec = closed_loop_model(4, 2, 2);
    spec.initial = vec![1, 1, 1, 1];
    let config = RunConfig::default().with_stop(StopCondition::until(t(60)));
    let mut engine = build_engine(&spec, config);

    let mut steps = 0;
    while engine.now() < t(60) && engine.step() {
        let census = engine.census();
        assert!(census.is_conserved(), "{census:?}");
        let wip = census.queued + census.in_machines + census.in_conveyors;
        assert_eq!(wip, 4, "step {steps}: {census:?}");
        steps += 1;
    }
    assert!(engine.terminator().len() > 4);
}

#[test]
fn closed_loop_ids_continue_after_initial_wip() {
    let mut spec = closed_loop_model(3, 1, 2);
    spec.initial = vec![2, 0, 0];
    let config = RunConfig::default().with_stop(StopCondition::max_parts(4));
    let mut engine = build_engine(&spec, config);
    let summary = engine.run();

    assert_eq!(summary.reason, StopReason::ExitSignaled);
    assert_eq!(summary.parts_finished, 4);
    let created: Vec<u64> = engine
        .event_log()
        .of_kind(EventKind::PartCreated)
        .map(|r| r.part_id.0)
        .collect();
    let expected: Vec<u64> = (1..=created.len() as u64).collect();
    assert_eq!(created, expected);
}

// ===========================================================================
// Test 4: open loop drains and starves under an exit condition
// ===========================================================================

#[test]
fn open_loop_target_part_never_reached_starves() {
    let mut spec = line_model(3, 1, 2);
    spec.initial = vec![2, 0];
    let config = RunConfig::default()
        .with_loop_type(LoopType::Open)
        .with_stop(StopCondition::target_part(PartId(9)));
    let mut engine = build_engine(&spec, config);
    let summary = engine.run();

    assert_eq!(summary.reason, StopReason::Starved);
    assert_eq!(summary.parts_finished, 2);
    assert!(!engine.is_exit_signaled());
}

// ===========================================================================
// Test 5: round-robin branch spreads load evenly
// ===========================================================================

#[test]
fn round_robin_branch_balances_outputs() {
    let mut spec = branch_loop_model();
    spec.initial = vec![0, 0, 0, 0, 2];
    let config = RunConfig::default()
        .with_routing(RoutingPolicy::RoundRobin)
        .with_stop(StopCondition::max_parts(20));
    let mut engine = build_engine(&spec, config);
    engine.run();

    let loads = |id: u32| {
        engine
            .event_log()
            .of_kind(EventKind::ConveyorLoaded)
            .filter(|r| r.location == Location::Conveyor(id))
            .count() as i64
    };
    let (a, b) = (loads(1), loads(2));
    assert!(a > 0 && b > 0);
    assert!((a - b).abs() <= 1, "conveyor 1: {a}, conveyor 2: {b}");
}

// ===========================================================================
// Test 6: worked-time part finishes before any fetched part
// ===========================================================================

#[test]
fn worked_time_part_finishes_first() {
    let mut spec = line_model(2, 4, 1);
    spec.nodes[1] = NodeSpec::new(2, 1, t(4)).with_worked_time(t(3));
    spec.initial = vec![1];
    let config = RunConfig::default()
        .with_loop_type(LoopType::Open)
        .with_stop(StopCondition::until(t(20)));
    let mut engine = build_engine(&spec, config);
    engine.run();

    let finished = engine.finished_parts();
    assert_eq!(finished.len(), 2);
    // The worked-time part needs only 4 - 3 = 1 more unit.
    assert_eq!(finished[0].termination_time, t(1));
    assert_eq!(finished[1].termination_time, t(5));
}

// ===========================================================================
// Test 7: custom sinks and persisted logs
// ===========================================================================

#[derive(Default)]
struct KindCounter {
    counts: [u64; 7],
}

impl EventSink for KindCounter {
    fn record(&mut self, event: &EventRecord) {
        self.counts[event.kind as usize] += 1;
    }
}

#[test]
fn custom_sink_sees_every_event() {
    let mut spec = line_model(3, 2, 1);
    spec.initial = vec![1, 1];
    let config = RunConfig::default()
        .with_loop_type(LoopType::Open)
        .with_stop(StopCondition::until(t(30)));
    let topo = Topology::from_spec(&spec, &config).unwrap();
    let mut engine = SimulationEngine::with_sink(topo, config, KindCounter::default());
    engine.run();

    let counter = engine.into_sink();
    assert_eq!(counter.counts[EventKind::PartCreated as usize], 2);
    assert_eq!(counter.counts[EventKind::PartTerminated as usize], 2);
}

#[test]
fn event_log_survives_encoding() {
    let mut spec = grid_model(2, 2, 1);
    spec.initial[spec.arcs.len() - 1] = 3;
    let config = RunConfig::default().with_stop(StopCondition::until(t(30)));
    let mut engine = build_engine(&spec, config);
    engine.run();

    let log = engine.event_log();
    let bytes = log.to_bytes().unwrap();
    let restored = EventLog::from_bytes(&bytes).unwrap();
    assert_eq!(restored.records(), log.records());
    assert_eq!(restored.digest(), log.digest());
    assert_eq!(restored.first_divergence(log), None);
}

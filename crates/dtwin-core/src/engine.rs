//! The simulation engine: runs machine lanes and conveyors against queues
//! over simulated time.
//!
//! # Architecture
//!
//! The `SimulationEngine` owns:
//! - A frozen [`Topology`] (machines, queues, conveyors, branches)
//! - Per-object run state, SoA-style in `SecondaryMap`s keyed like the
//!   topology arenas: [`LaneState`]s per machine, a [`QueueBuffer`] per
//!   queue, a [`ConveyorState`] per conveyor
//! - An [`EventScheduler`] of pending wake-ups
//! - The [`Terminator`] and the [`EventSink`] that receives every record
//!
//! # Processes
//!
//! Each machine lane cycles `Idle -> Fetching -> Processing -> Pushing ->
//! Fetching`; each conveyor cycles `Idle -> Carrying -> Delivering -> Idle`.
//! A process that cannot proceed registers itself as a waiter on the queue
//! or conveyor it is blocked on and returns. When that object changes
//! state, its waiters are rescheduled at the current time, in registration
//! order, and re-check their condition.
//!
//! Every part move happens inside a single handler, so a part is always
//! held by exactly one container.

use crate::branch::{BranchState, select_conveyor};
use crate::conveyor::{ConveyorPhase, ConveyorState};
use crate::event::{EventKind, EventLog, EventRecord, EventSink};
use crate::fixed::SimTime;
use crate::id::{ConveyorKey, MachineKey, PartId, QueueKey};
use crate::machine::LaneState;
use crate::model::ModelSpec;
use crate::part::{Location, Part};
use crate::queue::QueueBuffer;
use crate::rng::SimRng;
use crate::scheduler::{EventScheduler, ProcessRef};
use crate::sim::{LoopType, RunConfig, RunSummary, StopCondition, StopReason};
use crate::terminator::{FinishedPart, Terminator};
use crate::topology::{Topology, TopologyError};
use slotmap::SecondaryMap;
use tracing::{debug, info, trace};

// ---------------------------------------------------------------------------
// Part census
// ---------------------------------------------------------------------------

/// Where every part currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartCensus {
    pub queued: u64,
    pub in_machines: u64,
    pub in_conveyors: u64,
    pub terminated: u64,
    pub created: u64,
}

impl PartCensus {
    /// No part lost or duplicated.
    pub fn is_conserved(&self) -> bool {
        self.queued + self.in_machines + self.in_conveyors + self.terminated == self.created
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct SimulationEngine<S: EventSink = EventLog> {
    topology: Topology,
    config: RunConfig,
    scheduler: EventScheduler,
    now: SimTime,
    started: bool,
    exit: bool,

    // -- Run state (SoA, keyed like the topology arenas) --
    lanes: SecondaryMap<MachineKey, Vec<LaneState>>,
    buffers: SecondaryMap<QueueKey, QueueBuffer>,
    conveyors: SecondaryMap<ConveyorKey, ConveyorState>,
    branch_states: Vec<BranchState>,

    terminator: Terminator,
    rng: SimRng,
    last_part_id: u64,
    parts_created: u64,
    events_processed: u64,
    sink: S,
}

impl SimulationEngine<EventLog> {
    /// Engine that records into an in-memory [`EventLog`].
    pub fn new(topology: Topology, config: RunConfig) -> Self {
        Self::with_sink(topology, config, EventLog::new())
    }

    /// Build the topology and the engine in one go.
    pub fn from_spec(spec: &ModelSpec, config: RunConfig) -> Result<Self, TopologyError> {
        let topology = Topology::from_spec(spec, &config)?;
        Ok(Self::new(topology, config))
    }

    pub fn event_log(&self) -> &EventLog {
        &self.sink
    }
}

impl<S: EventSink> SimulationEngine<S> {
    pub fn with_sink(topology: Topology, config: RunConfig, sink: S) -> Self {
        let lanes = topology
            .machines()
            .map(|(k, m)| (k, (0..m.capacity()).map(|_| LaneState::Idle).collect()))
            .collect();
        let buffers = topology
            .queues()
            .map(|(k, q)| (k, QueueBuffer::new(q)))
            .collect();
        let conveyors = topology
            .conveyor_keys()
            .iter()
            .map(|&k| (k, ConveyorState::default()))
            .collect();
        let branch_states = vec![BranchState::default(); topology.branches().len()];
        let rng = SimRng::new(config.seed);
        let last_part_id = topology.last_part_id();

        Self {
            topology,
            config,
            scheduler: EventScheduler::new(),
            now: SimTime::ZERO,
            started: false,
            exit: false,
            lanes,
            buffers,
            conveyors,
            branch_states,
            terminator: Terminator::new(),
            rng,
            last_part_id,
            parts_created: 0,
            events_processed: 0,
            sink,
        }
    }

    // -----------------------------------------------------------------------
    // Driving the simulation
    // -----------------------------------------------------------------------

    /// Run until the stop condition fires or no process can make progress.
    pub fn run(&mut self) -> RunSummary {
        self.start();
        let horizon = self.config.stop.horizon();
        info!(
            machines = self.topology.machine_count(),
            queues = self.buffers.len(),
            conveyors = self.conveyors.len(),
            stop = ?self.config.stop,
            loop_type = ?self.config.loop_type,
            "simulation started"
        );

        let reason = loop {
            if self.exit {
                break StopReason::ExitSignaled;
            }
            match (self.scheduler.peek_time(), horizon) {
                // An idle line still lets the clock run out to the horizon.
                (None, Some(h)) => {
                    self.now = h;
                    break StopReason::HorizonReached;
                }
                (None, None) => break StopReason::Starved,
                (Some(t), Some(h)) if t >= h => {
                    self.now = h;
                    break StopReason::HorizonReached;
                }
                _ => {
                    self.step();
                }
            }
        };

        let summary = self.summary(reason);
        info!(
            reason = ?summary.reason,
            end_time = %summary.end_time,
            created = summary.parts_created,
            finished = summary.parts_finished,
            events = summary.events_processed,
            "simulation stopped"
        );
        summary
    }

    /// Process the next wake-up, ignoring any `Until` horizon. Returns
    /// `false` once the exit signal is raised or nothing is scheduled.
    pub fn step(&mut self) -> bool {
        self.start();
        if self.exit {
            return false;
        }
        let Some(wake) = self.scheduler.pop() else {
            return false;
        };
        assert!(wake.time >= self.now, "scheduler went back in time");
        self.now = wake.time;
        self.events_processed += 1;
        self.dispatch(wake.process);
        true
    }

    /// Seed initial WIP and wake every process at t = 0. Idempotent.
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        for (queue, part) in self.topology.generator().generate(&self.config.part_type) {
            self.emit(part.id(), part.location(), EventKind::PartCreated);
            self.emit(part.id(), part.location(), EventKind::QueueEntered);
            self.buffers[queue].push(part);
            self.parts_created += 1;
        }

        if let StopCondition::Exit {
            maxparts: Some(0), ..
        } = self.config.stop
        {
            debug!("maxparts is zero, exiting before the first event");
            self.exit = true;
            return;
        }

        let machine_keys = self.topology.machine_keys().to_vec();
        for mkey in machine_keys {
            let machine = self.topology.machine(mkey);
            let mut initial = machine.initial_part().cloned();
            let remaining = machine.remaining_initial_time();
            for lane in 0..self.lanes[mkey].len() {
                let process = ProcessRef::Lane { machine: mkey, lane };
                let Some(part) = initial.take() else {
                    self.scheduler.schedule(SimTime::ZERO, process);
                    continue;
                };
                // The worked-time part occupies the first lane.
                self.parts_created += 1;
                self.emit(part.id(), part.location(), EventKind::PartCreated);
                self.emit(part.id(), part.location(), EventKind::ProcessStarted);
                self.lanes[mkey][lane] = LaneState::Processing { part };
                self.scheduler.schedule(remaining, process);
            }
        }
        for &ckey in self.topology.conveyor_keys() {
            self.scheduler.schedule(SimTime::ZERO, ProcessRef::Conveyor(ckey));
        }
    }

    fn dispatch(&mut self, process: ProcessRef) {
        if self.exit {
            return;
        }
        match process {
            ProcessRef::Lane { machine, lane } => self.wake_lane(machine, lane),
            ProcessRef::Conveyor(conveyor) => self.wake_conveyor(conveyor),
        }
    }

    // -----------------------------------------------------------------------
    // Machine lanes
    // -----------------------------------------------------------------------

    fn wake_lane(&mut self, machine: MachineKey, lane: usize) {
        match std::mem::take(&mut self.lanes[machine][lane]) {
            LaneState::Idle | LaneState::Fetching => self.lane_fetch(machine, lane),
            LaneState::Processing { part } => self.lane_finish(machine, lane, part),
            LaneState::Pushing { part, conveyor } => self.lane_push(machine, lane, part, conveyor),
        }
    }

    fn lane_fetch(&mut self, machine: MachineKey, lane: usize) {
        let m = self.topology.machine(machine);
        let (machine_id, process_time) = (m.id(), m.process_time());
        let Some(queue) = m.queue_in() else {
            // Nothing upstream: the lane stays idle for the rest of the run.
            self.lanes[machine][lane] = LaneState::Idle;
            return;
        };
        let process = ProcessRef::Lane { machine, lane };

        let Some(mut part) = self.buffers[queue].pop() else {
            self.buffers[queue].wait_for_part(process);
            self.lanes[machine][lane] = LaneState::Fetching;
            return;
        };
        part.move_to(Location::Machine(machine_id));
        self.emit(part.id(), part.location(), EventKind::ProcessStarted);
        self.lanes[machine][lane] = LaneState::Processing { part };
        self.scheduler.schedule(self.now + process_time, process);
        self.notify_space(queue);
    }

    fn lane_finish(&mut self, machine: MachineKey, lane: usize, part: Part) {
        self.emit(part.id(), part.location(), EventKind::ProcessFinished);
        let m = self.topology.machine(machine);
        if !m.is_final() {
            let conveyor = self.route(machine);
            self.lane_push(machine, lane, part, conveyor);
            return;
        }

        let (machine_id, has_outputs) = (m.id(), !m.conveyors_out().is_empty());
        let finished = part.id();
        self.terminator.accept(part, self.now);
        self.emit(finished, Location::Terminator, EventKind::PartTerminated);
        self.check_exit(finished);
        if self.exit {
            return;
        }

        if self.config.loop_type == LoopType::Closed && has_outputs {
            self.last_part_id += 1;
            self.parts_created += 1;
            let replacement = Part::new(
                PartId(self.last_part_id),
                self.config.part_type.clone(),
                Location::Machine(machine_id),
                self.now,
            );
            self.emit(replacement.id(), replacement.location(), EventKind::PartCreated);
            let conveyor = self.route(machine);
            self.lane_push(machine, lane, replacement, conveyor);
        } else {
            self.lane_fetch(machine, lane);
        }
    }

    fn lane_push(&mut self, machine: MachineKey, lane: usize, mut part: Part, conveyor: ConveyorKey) {
        let process = ProcessRef::Lane { machine, lane };
        if !self.conveyors[conveyor].is_idle() {
            self.conveyors[conveyor].wait_until_idle(process);
            self.lanes[machine][lane] = LaneState::Pushing { part, conveyor };
            return;
        }
        let c = self.topology.conveyor(conveyor);
        let (conveyor_id, transport_time, queue) = (c.id(), c.transport_time(), c.queue_out());
        if self.buffers[queue].is_full() {
            self.buffers[queue].wait_for_space(process);
            self.lanes[machine][lane] = LaneState::Pushing { part, conveyor };
            return;
        }

        part.move_to(Location::Conveyor(conveyor_id));
        self.emit(part.id(), part.location(), EventKind::ConveyorLoaded);
        let until = self.now + transport_time;
        self.conveyors[conveyor].phase = ConveyorPhase::Carrying { part, until };
        self.scheduler.schedule(until, ProcessRef::Conveyor(conveyor));
        self.lane_fetch(machine, lane);
    }

    /// Pick the outbound conveyor for a part leaving `machine`.
    fn route(&mut self, machine: MachineKey) -> ConveyorKey {
        let m = self.topology.machine(machine);
        match m.branch() {
            Some(id) => {
                let topology = &self.topology;
                let buffers = &self.buffers;
                select_conveyor(
                    self.config.routing,
                    topology.branch(id),
                    &mut self.branch_states[id.index()],
                    &mut self.rng,
                    |c| buffers[topology.conveyor(c).queue_out()].len(),
                )
            }
            None => {
                assert!(
                    !m.conveyors_out().is_empty(),
                    "machine {} has no outbound conveyor",
                    m.id()
                );
                m.conveyors_out()[0]
            }
        }
    }

    // -----------------------------------------------------------------------
    // Conveyors
    // -----------------------------------------------------------------------

    fn wake_conveyor(&mut self, conveyor: ConveyorKey) {
        match std::mem::take(&mut self.conveyors[conveyor].phase) {
            ConveyorPhase::Idle => {}
            ConveyorPhase::Carrying { part, until } if self.now < until => {
                self.conveyors[conveyor].phase = ConveyorPhase::Carrying { part, until };
            }
            ConveyorPhase::Carrying { part, .. } | ConveyorPhase::Delivering { part } => {
                self.conveyor_deliver(conveyor, part)
            }
        }
    }

    fn conveyor_deliver(&mut self, conveyor: ConveyorKey, mut part: Part) {
        let queue = self.topology.conveyor(conveyor).queue_out();
        if self.buffers[queue].is_full() {
            self.buffers[queue].wait_for_space(ProcessRef::Conveyor(conveyor));
            self.conveyors[conveyor].phase = ConveyorPhase::Delivering { part };
            return;
        }

        self.emit(part.id(), part.location(), EventKind::ConveyorDelivered);
        part.move_to(Location::Queue(self.buffers[queue].id()));
        self.emit(part.id(), part.location(), EventKind::QueueEntered);
        self.buffers[queue].push(part);
        self.notify_part(queue);

        let now = self.now;
        for waiter in self.conveyors[conveyor].take_waiters() {
            self.scheduler.schedule(now, waiter);
        }
    }

    // -----------------------------------------------------------------------
    // Wake-ups, exit signal, event emission
    // -----------------------------------------------------------------------

    fn notify_part(&mut self, queue: QueueKey) {
        let now = self.now;
        for waiter in self.buffers[queue].take_getters() {
            self.scheduler.schedule(now, waiter);
        }
    }

    fn notify_space(&mut self, queue: QueueKey) {
        let now = self.now;
        for waiter in self.buffers[queue].take_putters() {
            self.scheduler.schedule(now, waiter);
        }
    }

    fn check_exit(&mut self, finished: PartId) {
        let StopCondition::Exit {
            maxparts,
            targeted_part_id,
        } = self.config.stop
        else {
            return;
        };
        let count_reached = maxparts.is_some_and(|n| self.terminator.len() as u64 >= n);
        if count_reached || targeted_part_id == Some(finished) {
            debug!(
                time = %self.now,
                finished = self.terminator.len(),
                last = finished.0,
                "exit signaled"
            );
            self.exit = true;
        }
    }

    fn emit(&mut self, part_id: PartId, location: Location, kind: EventKind) {
        trace!(time = %self.now, part = part_id.0, ?location, ?kind, "event");
        self.sink.record(&EventRecord {
            time: self.now,
            part_id,
            location,
            kind,
        });
    }

    fn summary(&self, reason: StopReason) -> RunSummary {
        RunSummary {
            reason,
            end_time: self.now,
            parts_created: self.parts_created,
            parts_finished: self.terminator.len() as u64,
            events_processed: self.events_processed,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn is_exit_signaled(&self) -> bool {
        self.exit
    }

    pub fn pending_wakeups(&self) -> usize {
        self.scheduler.len()
    }

    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    /// Finished parts in completion order, for analysis.
    pub fn finished_parts(&self) -> Vec<FinishedPart> {
        self.terminator.finished()
    }

    pub fn queue_buffer(&self, queue: QueueKey) -> &QueueBuffer {
        &self.buffers[queue]
    }

    pub fn lanes(&self, machine: MachineKey) -> &[LaneState] {
        &self.lanes[machine]
    }

    pub fn conveyor_state(&self, conveyor: ConveyorKey) -> &ConveyorState {
        &self.conveyors[conveyor]
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn census(&self) -> PartCensus {
        PartCensus {
            queued: self.buffers.values().map(|b| b.len() as u64).sum(),
            in_machines: self
                .lanes
                .values()
                .flatten()
                .filter(|l| l.is_busy())
                .count() as u64,
            in_conveyors: self
                .conveyors
                .values()
                .filter(|c| c.part().is_some())
                .count() as u64,
            terminated: self.terminator.len() as u64,
            created: self.parts_created,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::RoutingPolicy;
    use crate::event::NullSink;
    use crate::test_utils::*;

    fn engine(spec: &ModelSpec, config: RunConfig) -> SimulationEngine {
        SimulationEngine::from_spec(spec, config).unwrap()
    }

    fn open_until(h: i32) -> RunConfig {
        RunConfig::default()
            .with_loop_type(LoopType::Open)
            .with_stop(StopCondition::Until(t(h)))
    }

    // -----------------------------------------------------------------------
    // Test 1: a single part walks a three-machine line
    // -----------------------------------------------------------------------
    #[test]
    fn single_part_through_line() {
        let mut spec = line_model(3, 5, 1);
        spec.arcs[1].transport_time = t(2);
        spec.initial = vec![1, 0];
        let mut e = engine(&spec, open_until(50));
        let summary = e.run();

        assert_eq!(summary.reason, StopReason::HorizonReached);
        assert_eq!(summary.end_time, t(50));
        let finished = e.finished_parts();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, PartId(1));
        assert_eq!(finished[0].termination_time, t(5 + 2 + 5));

        let kinds: Vec<_> = e.event_log().for_part(PartId(1)).map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::PartCreated,
                EventKind::QueueEntered,
                EventKind::ProcessStarted,
                EventKind::ProcessFinished,
                EventKind::ConveyorLoaded,
                EventKind::ConveyorDelivered,
                EventKind::QueueEntered,
                EventKind::ProcessStarted,
                EventKind::ProcessFinished,
                EventKind::PartTerminated,
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Test 2: queue capacity blocks the upstream lane
    // -----------------------------------------------------------------------
    #[test]
    fn full_queue_blocks_upstream() {
        // M2 is fast and M3 slow; the queue between them holds one part.
        let mut spec = line_model(3, 1, 1);
        spec.nodes[2].process_time = t(10);
        spec.arcs[0].capacity = 3;
        spec.arcs[1].transport_time = t(0);
        spec.initial = vec![3, 0];
        let mut e = engine(&spec, open_until(10));
        e.run();

        // Part 1 in M3, part 2 waiting in Queue 2, M2 holding part 3.
        let q2 = e.topology().queue_keys()[1];
        assert_eq!(e.queue_buffer(q2).len(), 1);
        let m2 = e.topology().machine_by_id(2).unwrap();
        assert!(matches!(e.lanes(m2)[0], LaneState::Pushing { .. }));
        let m3 = e.topology().machine_by_id(3).unwrap();
        assert!(e.lanes(m3)[0].is_busy());
        assert!(e.census().is_conserved());
    }

    // -----------------------------------------------------------------------
    // Test 3: maxparts raises the exit signal
    // -----------------------------------------------------------------------
    #[test]
    fn exit_after_maxparts() {
        let mut spec = line_model(2, 2, 2);
        spec.initial = vec![2];
        let config = RunConfig::default()
            .with_loop_type(LoopType::Open)
            .with_stop(StopCondition::max_parts(2));
        let mut e = engine(&spec, config);
        let summary = e.run();
        assert_eq!(summary.reason, StopReason::ExitSignaled);
        assert_eq!(summary.parts_finished, 2);
        assert!(e.is_exit_signaled());
        assert!(!e.step());
    }

    #[test]
    fn exit_on_targeted_part() {
        let mut spec = line_model(2, 1, 3);
        spec.initial = vec![3];
        let config = RunConfig::default()
            .with_loop_type(LoopType::Open)
            .with_stop(StopCondition::target_part(PartId(2)));
        let mut e = engine(&spec, config);
        let summary = e.run();
        assert_eq!(summary.reason, StopReason::ExitSignaled);
        assert_eq!(e.terminator().all_items().last().map(|p| p.id()), Some(PartId(2)));
        assert!(e.census().is_conserved());
    }

    #[test]
    fn zero_maxparts_exits_immediately() {
        let mut spec = line_model(2, 1, 1);
        spec.initial = vec![1];
        let config = RunConfig::default().with_stop(StopCondition::max_parts(0));
        let mut e = engine(&spec, config);
        let summary = e.run();
        assert_eq!(summary.reason, StopReason::ExitSignaled);
        assert_eq!(summary.events_processed, 0);
        assert_eq!(summary.parts_created, 1);
    }

    // -----------------------------------------------------------------------
    // Test 4: open line drains and starves
    // -----------------------------------------------------------------------
    #[test]
    fn open_line_starves_when_drained() {
        let mut spec = line_model(2, 3, 1);
        spec.initial = vec![1];
        let config = RunConfig::default()
            .with_loop_type(LoopType::Open)
            .with_stop(StopCondition::max_parts(5));
        let mut e = engine(&spec, config);
        let summary = e.run();
        assert_eq!(summary.reason, StopReason::Starved);
        assert_eq!(summary.parts_finished, 1);
    }

    // -----------------------------------------------------------------------
    // Test 5: closed loop recirculates replacements
    // -----------------------------------------------------------------------
    #[test]
    fn closed_loop_creates_replacements() {
        let mut spec = closed_loop_model(3, 2, 2);
        spec.initial = vec![1, 0, 0];
        let config = RunConfig::default().with_stop(StopCondition::max_parts(4));
        let mut e = engine(&spec, config);
        let summary = e.run();
        assert_eq!(summary.reason, StopReason::ExitSignaled);
        assert_eq!(summary.parts_finished, 4);
        let ids: Vec<_> = e.terminator().all_items().iter().map(|p| p.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        // Each replacement is created when its predecessor terminates.
        let parts = e.terminator().all_items();
        assert_eq!(parts[1].creation_time(), parts[0].termination_time().unwrap());
        assert!(e.census().is_conserved());
    }

    // -----------------------------------------------------------------------
    // Test 6: worked-time part finishes early
    // -----------------------------------------------------------------------
    #[test]
    fn worked_time_part_starts_in_process() {
        let mut spec = line_model(2, 10, 1);
        spec.nodes[1] = spec.nodes[1].clone().with_worked_time(t(7));
        let mut e = engine(&spec, open_until(100));
        e.run();
        let finished = e.finished_parts();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, PartId(1));
        assert_eq!(finished[0].termination_time, t(3));
    }

    // -----------------------------------------------------------------------
    // Test 7: round robin alternates destinations
    // -----------------------------------------------------------------------
    #[test]
    fn branch_round_robin_alternates() {
        let mut spec = branch_loop_model();
        spec.initial = vec![0, 0, 0, 0, 2];
        let config = RunConfig::default()
            .with_routing(RoutingPolicy::RoundRobin)
            .with_stop(StopCondition::max_parts(6));
        let mut e = engine(&spec, config);
        e.run();

        // Conveyors 1 and 2 leave the branch machine M1.
        let loaded: Vec<u32> = e
            .event_log()
            .of_kind(EventKind::ConveyorLoaded)
            .filter(|r| matches!(r.location, Location::Conveyor(1 | 2)))
            .map(|r| r.location.id())
            .collect();
        assert!(loaded.len() >= 4, "{loaded:?}");
        for pair in loaded.windows(2) {
            assert_ne!(pair[0], pair[1], "round robin repeated a conveyor: {loaded:?}");
        }
    }

    // -----------------------------------------------------------------------
    // Test 8: engine works with any sink
    // -----------------------------------------------------------------------
    #[test]
    fn null_sink_engine_runs() {
        let mut spec = line_model(3, 1, 1);
        spec.initial = vec![1, 1];
        let topo = Topology::from_spec(&spec, &RunConfig::default()).unwrap();
        let mut e = SimulationEngine::with_sink(topo, open_until(20), NullSink);
        let summary = e.run();
        assert_eq!(summary.parts_finished, 2);
    }

    #[test]
    fn machine_without_input_never_fetches() {
        // M1 has no inbound arc and no worked-time part.
        let mut spec = line_model(2, 1, 1);
        spec.initial = vec![0];
        let mut e = engine(&spec, open_until(10));
        let summary = e.run();
        assert_eq!(summary.reason, StopReason::HorizonReached);
        assert_eq!(summary.end_time, t(10));
        assert_eq!(summary.events_processed, 3);
        let m1 = e.topology().first_machine();
        assert!(matches!(e.lanes(m1)[0], LaneState::Idle));
    }

    #[test]
    #[tracing_test::traced_test]
    fn run_logs_start_and_stop() {
        let mut spec = line_model(2, 1, 1);
        spec.initial = vec![1];
        let mut e = engine(&spec, open_until(5));
        e.run();
        assert!(logs_contain("simulation started"));
        assert!(logs_contain("simulation stopped"));
        assert!(logs_contain("HorizonReached"));
    }

    #[test]
    fn capacity_two_machine_processes_in_parallel() {
        let mut spec = line_model(2, 4, 2);
        spec.nodes[1].capacity = 2;
        spec.initial = vec![2];
        let mut e = engine(&spec, open_until(100));
        e.run();
        let finished = e.finished_parts();
        assert_eq!(finished.len(), 2);
        assert!(finished.iter().all(|f| f.termination_time == t(4)));
    }
}

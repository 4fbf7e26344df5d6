//! Live statistics collected from the engine's event stream.

use std::collections::{BTreeMap, HashMap, VecDeque};

use dtwin_core::event::{EventKind, EventRecord, EventSink};
use dtwin_core::fixed::{Fixed64, SimTime, checked_div_64};
use dtwin_core::id::PartId;
use dtwin_core::part::Location;

// ---------------------------------------------------------------------------
// Rolling window
// ---------------------------------------------------------------------------

/// The last `limit` cycle times, oldest first.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<SimTime>,
    limit: usize,
}

impl RollingWindow {
    /// # Panics
    ///
    /// Panics if `limit` is zero.
    pub fn new(limit: usize) -> Self {
        assert!(limit > 0, "rolling window needs room for one sample");
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, sample: SimTime) {
        if self.samples.len() == self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn newest(&self) -> Option<SimTime> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = SimTime> + '_ {
        self.samples.iter().copied()
    }

    /// `None` until the first sample arrives.
    pub fn mean(&self) -> Option<SimTime> {
        let sum = self
            .iter()
            .fold(SimTime::ZERO, |acc, v| acc.saturating_add(v));
        checked_div_64(sum, Fixed64::from_num(self.samples.len()))
    }
}

// ---------------------------------------------------------------------------
// Per-machine statistics
// ---------------------------------------------------------------------------

/// Counters for one machine, summed over all its lanes.
#[derive(Debug, Clone, Default)]
pub struct MachineStats {
    pub started: u64,
    pub finished: u64,
    /// Total time parts spent being processed.
    pub busy_time: SimTime,
    in_process: HashMap<PartId, SimTime>,
}

impl MachineStats {
    /// Parts currently being processed.
    pub fn in_process(&self) -> usize {
        self.in_process.len()
    }

    /// Share of `elapsed * lanes` spent processing. Parts still in process
    /// count up to `elapsed`.
    pub fn utilization(&self, elapsed: SimTime, lanes: u32) -> Fixed64 {
        let open: SimTime = self
            .in_process
            .values()
            .fold(SimTime::ZERO, |acc, &start| acc.saturating_add(elapsed - start));
        let capacity = elapsed.saturating_mul(Fixed64::from_num(lanes));
        checked_div_64(self.busy_time.saturating_add(open), capacity).unwrap_or(Fixed64::ZERO)
    }
}

// ---------------------------------------------------------------------------
// StatsSink
// ---------------------------------------------------------------------------

/// An [`EventSink`] that aggregates machine, queue and cycle-time figures
/// as the run progresses. Combine with an `EventLog` through a
/// `(EventLog, StatsSink)` pair to keep both.
#[derive(Debug, Clone)]
pub struct StatsSink {
    machines: BTreeMap<u32, MachineStats>,
    queue_arrivals: BTreeMap<u32, u64>,
    /// Creation time of every live part.
    live: HashMap<PartId, SimTime>,
    recent_cycle_times: RollingWindow,
    terminated: u64,
    last_time: SimTime,
}

impl Default for StatsSink {
    fn default() -> Self {
        Self::with_window(64)
    }
}

impl StatsSink {
    /// Sink whose rolling cycle time covers the last `window` parts.
    pub fn with_window(window: usize) -> Self {
        Self {
            machines: BTreeMap::new(),
            queue_arrivals: BTreeMap::new(),
            live: HashMap::new(),
            recent_cycle_times: RollingWindow::new(window),
            terminated: 0,
            last_time: SimTime::ZERO,
        }
    }

    fn process_event(&mut self, event: &EventRecord) {
        self.last_time = event.time;
        match (event.kind, event.location) {
            (EventKind::PartCreated, _) => {
                self.live.insert(event.part_id, event.time);
            }
            (EventKind::QueueEntered, Location::Queue(q)) => {
                *self.queue_arrivals.entry(q).or_default() += 1;
            }
            (EventKind::ProcessStarted, Location::Machine(m)) => {
                let stats = self.machines.entry(m).or_default();
                stats.started += 1;
                stats.in_process.insert(event.part_id, event.time);
            }
            (EventKind::ProcessFinished, Location::Machine(m)) => {
                let stats = self.machines.entry(m).or_default();
                stats.finished += 1;
                if let Some(start) = stats.in_process.remove(&event.part_id) {
                    stats.busy_time += event.time - start;
                }
            }
            (EventKind::PartTerminated, _) => {
                self.terminated += 1;
                if let Some(created) = self.live.remove(&event.part_id) {
                    self.recent_cycle_times.push(event.time - created);
                }
            }
            _ => {}
        }
    }

    pub fn machine(&self, id: u32) -> Option<&MachineStats> {
        self.machines.get(&id)
    }

    /// Machines that processed at least one part, by id.
    pub fn machines(&self) -> impl Iterator<Item = (u32, &MachineStats)> + '_ {
        self.machines.iter().map(|(&id, s)| (id, s))
    }

    pub fn queue_arrivals(&self, queue: u32) -> u64 {
        self.queue_arrivals.get(&queue).copied().unwrap_or(0)
    }

    pub fn terminated(&self) -> u64 {
        self.terminated
    }

    /// Parts created but not yet terminated.
    pub fn wip(&self) -> usize {
        self.live.len()
    }

    /// Time of the last event seen.
    pub fn last_time(&self) -> SimTime {
        self.last_time
    }

    pub fn recent_cycle_times(&self) -> &RollingWindow {
        &self.recent_cycle_times
    }

    /// Rolling mean of the most recent cycle times.
    pub fn rolling_cycle_time(&self) -> Option<SimTime> {
        self.recent_cycle_times.mean()
    }
}

impl EventSink for StatsSink {
    fn record(&mut self, event: &EventRecord) {
        self.process_event(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use dtwin_core::engine::SimulationEngine;
    use dtwin_core::event::EventLog;
    use dtwin_core::sim::{LoopType, RunConfig, StopCondition};
    use dtwin_core::test_utils::*;
    use dtwin_core::topology::Topology;

    #[test]
    fn window_drops_oldest_sample() {
        let mut w = RollingWindow::new(3);
        assert!(w.is_empty());
        assert_eq!(w.mean(), None);
        for v in [2, 4, 6, 8] {
            w.push(t(v));
        }
        assert_eq!(w.len(), w.limit());
        assert_eq!(w.newest(), Some(t(8)));
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![t(4), t(6), t(8)]);
        assert_eq!(w.mean(), Some(t(6)));
    }

    #[test]
    #[should_panic(expected = "room for one sample")]
    fn empty_window_panics() {
        RollingWindow::new(0);
    }

    #[test]
    fn machine_utilization_counts_open_work() {
        let mut stats = MachineStats {
            busy_time: t(4),
            ..Default::default()
        };
        stats.in_process.insert(PartId(1), t(8));
        // 4 closed + 2 open over 10 time units on 2 lanes.
        assert_eq!(stats.utilization(t(10), 2), t(6) / t(20));
        assert_eq!(stats.utilization(t(0), 2), Fixed64::ZERO);
    }

    #[test]
    fn sink_tracks_a_line_run() {
        let mut spec = line_model(3, 2, 2);
        spec.initial = vec![2, 0];
        let config = RunConfig::default()
            .with_loop_type(LoopType::Open)
            .with_stop(StopCondition::until(t(40)));
        let topo = Topology::from_spec(&spec, &config).unwrap();
        let mut engine =
            SimulationEngine::with_sink(topo, config, (EventLog::new(), StatsSink::default()));
        engine.run();

        let (log, stats) = engine.into_sink();
        assert_eq!(stats.terminated(), 2);
        assert_eq!(stats.wip(), 0);
        assert!(stats.machine(1).is_none());
        let m2 = stats.machine(2).unwrap();
        assert_eq!((m2.started, m2.finished), (2, 2));
        assert_eq!(m2.busy_time, t(4));
        assert_eq!(m2.utilization(t(8), 1), t(4) / t(8));
        assert_eq!(stats.queue_arrivals(1), 2);
        assert_eq!(stats.queue_arrivals(2), 2);
        assert_eq!(stats.rolling_cycle_time(), Some(t(6)));
        assert_eq!(stats.last_time(), log.records().last().unwrap().time);
    }

    #[test]
    fn closed_loop_keeps_wip_steady() {
        let mut spec = closed_loop_model(3, 1, 2);
        spec.initial = vec![1, 1, 1];
        let config = RunConfig::default().with_stop(StopCondition::max_parts(12));
        let topo = Topology::from_spec(&spec, &config).unwrap();
        let mut engine = SimulationEngine::with_sink(
            topo,
            config,
            StatsSink::with_window(4),
        );
        engine.run();

        let stats = engine.sink();
        assert_eq!(stats.terminated(), 12);
        // The last termination raises the exit before its replacement exists.
        assert_eq!(stats.wip(), 2);
        assert_eq!(stats.recent_cycle_times().len(), 4);
        assert!(stats.rolling_cycle_time().is_some());
    }
}

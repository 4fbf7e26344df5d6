//! Run configuration, stop conditions and run summaries.

use crate::branch::RoutingPolicy;
use crate::fixed::{Fixed64, SimTime, time_as_f64};
use crate::id::PartId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Loop type
// ---------------------------------------------------------------------------

/// Whether finished parts are replaced by the final machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopType {
    /// Every termination spawns a replacement part that re-enters the line
    /// through the final machine's outbound conveyors.
    #[default]
    Closed,
    /// Terminated parts leave the system for good.
    Open,
}

// ---------------------------------------------------------------------------
// Stop condition
// ---------------------------------------------------------------------------

/// When a run ends. The two forms are mutually exclusive.
///
/// An `Exit` with neither limit never ends a closed loop, so documents
/// that omit both are rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "StopDocument")]
pub enum StopCondition {
    /// Run until simulated time reaches the horizon.
    #[serde(with = "time_as_f64")]
    Until(SimTime),
    /// Run until the terminator has collected `maxparts` parts, or until
    /// `targeted_part_id` reaches it, whichever comes first.
    Exit {
        #[serde(default)]
        maxparts: Option<u64>,
        #[serde(default)]
        targeted_part_id: Option<PartId>,
    },
}

impl StopCondition {
    pub fn until(horizon: SimTime) -> Self {
        StopCondition::Until(horizon)
    }

    pub fn max_parts(n: u64) -> Self {
        StopCondition::Exit {
            maxparts: Some(n),
            targeted_part_id: None,
        }
    }

    pub fn target_part(id: PartId) -> Self {
        StopCondition::Exit {
            maxparts: None,
            targeted_part_id: Some(id),
        }
    }

    /// `false` only for an `Exit` with neither limit set.
    pub fn is_bounded(&self) -> bool {
        !matches!(
            self,
            StopCondition::Exit {
                maxparts: None,
                targeted_part_id: None
            }
        )
    }

    pub fn horizon(&self) -> Option<SimTime> {
        match self {
            StopCondition::Until(t) => Some(*t),
            StopCondition::Exit { .. } => None,
        }
    }
}

/// Wire form of [`StopCondition`], checked on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum StopDocument {
    #[serde(with = "time_as_f64")]
    Until(SimTime),
    Exit {
        #[serde(default)]
        maxparts: Option<u64>,
        #[serde(default)]
        targeted_part_id: Option<PartId>,
    },
}

impl TryFrom<StopDocument> for StopCondition {
    type Error = &'static str;

    fn try_from(doc: StopDocument) -> Result<Self, Self::Error> {
        let stop = match doc {
            StopDocument::Until(t) => StopCondition::Until(t),
            StopDocument::Exit {
                maxparts,
                targeted_part_id,
            } => StopCondition::Exit {
                maxparts,
                targeted_part_id,
            },
        };
        if stop.is_bounded() {
            Ok(stop)
        } else {
            Err("exit condition needs maxparts or targeted_part_id")
        }
    }
}

impl Default for StopCondition {
    fn default() -> Self {
        StopCondition::Until(Fixed64::from_num(100))
    }
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Everything about a run that is not part of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub loop_type: LoopType,
    pub stop: StopCondition,
    pub routing: RoutingPolicy,
    /// Seed for `RoutingPolicy::Random`.
    pub seed: u64,
    /// Type label stamped on every created part.
    pub part_type: String,
    /// Whether the model's `initial` array is honoured.
    pub initial_wip: bool,
}

impl RunConfig {
    pub fn new() -> Self {
        Self {
            loop_type: LoopType::default(),
            stop: StopCondition::default(),
            routing: RoutingPolicy::default(),
            seed: 0,
            part_type: "A".to_string(),
            initial_wip: true,
        }
    }

    pub fn with_loop_type(mut self, loop_type: LoopType) -> Self {
        self.loop_type = loop_type;
        self
    }

    pub fn with_stop(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_routing(mut self, routing: RoutingPolicy) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_part_type(mut self, part_type: impl Into<String>) -> Self {
        self.part_type = part_type.into();
        self
    }

    pub fn with_initial_wip(mut self, enabled: bool) -> Self {
        self.initial_wip = enabled;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Simulated time reached the `Until` horizon.
    HorizonReached,
    /// The exit signal was raised by the terminator.
    ExitSignaled,
    /// No process can make progress: the event queue ran dry.
    Starved,
}

/// Summary returned by `SimulationEngine::run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub reason: StopReason,
    pub end_time: SimTime,
    pub parts_created: u64,
    pub parts_finished: u64,
    pub events_processed: u64,
}

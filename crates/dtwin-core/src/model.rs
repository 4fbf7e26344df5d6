//! Serde model of the configuration document.
//!
//! Field names follow the document (`activity`, `contemp`, `arc`, ...).
//! Decimal times are converted to [`SimTime`] once here, so nothing
//! downstream touches floating point.

use crate::fixed::{Fixed64, SimTime, time_as_f64};
use serde::{Deserialize, Serialize};

/// A full model: machines, the arcs between them, and initial WIP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub nodes: Vec<NodeSpec>,
    pub arcs: Vec<ArcSpec>,
    /// Initial WIP per arc, in arc declaration order.
    #[serde(default)]
    pub initial: Vec<u32>,
}

/// One machine declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub activity: u32,
    #[serde(with = "time_as_f64")]
    pub frequency: Fixed64,
    pub capacity: u32,
    #[serde(rename = "contemp", with = "time_as_f64")]
    pub process_time: SimTime,
    pub cluster: u32,
    #[serde(with = "time_as_f64")]
    pub worked_time: SimTime,
}

/// One queue declaration. `arc` holds 1-indexed node positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSpec {
    pub arc: [usize; 2],
    pub capacity: u32,
    #[serde(with = "time_as_f64")]
    pub frequency: Fixed64,
    #[serde(rename = "contemp", with = "time_as_f64")]
    pub transport_time: SimTime,
}

impl NodeSpec {
    /// A node with unit frequency, no worked time, and cluster 1.
    pub fn new(activity: u32, capacity: u32, process_time: SimTime) -> Self {
        Self {
            activity,
            frequency: Fixed64::ONE,
            capacity,
            process_time,
            cluster: 1,
            worked_time: SimTime::ZERO,
        }
    }

    pub fn with_worked_time(mut self, worked_time: SimTime) -> Self {
        self.worked_time = worked_time;
        self
    }

    pub fn with_cluster(mut self, cluster: u32) -> Self {
        self.cluster = cluster;
        self
    }
}

impl ArcSpec {
    /// An arc from node `from` to node `to` (1-indexed) with unit frequency.
    pub fn new(from: usize, to: usize, capacity: u32, transport_time: SimTime) -> Self {
        Self {
            arc: [from, to],
            capacity,
            frequency: Fixed64::ONE,
            transport_time,
        }
    }

    pub fn from(&self) -> usize {
        self.arc[0]
    }

    pub fn to(&self) -> usize {
        self.arc[1]
    }
}

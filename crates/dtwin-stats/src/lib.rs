//! Production analysis for finished dtwin runs.
//!
//! Works on the [`FinishedPart`] records a run leaves in its terminator:
//! aggregate figures in a [`ProductionReport`], and remaining cycle time
//! (RCT) queries for a single part or for the first `n` parts to finish.
//! [`StatsSink`] collects per-machine figures live from the event stream.
//!
//! # Usage
//!
//! ```ignore
//! let summary = engine.run();
//! let finished = engine.finished_parts();
//! let report = ProductionReport::from_finished(&finished);
//! let batch = rct_for_batch(&finished, 10)?;
//! ```

mod sink;

pub use dtwin_core::terminator::FinishedPart;
pub use sink::{MachineStats, RollingWindow, StatsSink};

use dtwin_core::fixed::{Fixed64, SimTime, checked_div_64};
use dtwin_core::id::PartId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Production report
// ---------------------------------------------------------------------------

/// Aggregate figures over a set of finished parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionReport {
    pub parts_finished: u64,
    /// Termination time of the last part to finish.
    pub makespan: SimTime,
    /// Parts per unit of simulated time. Zero when the makespan is zero.
    pub throughput: Fixed64,
    pub min_cycle_time: Option<SimTime>,
    pub max_cycle_time: Option<SimTime>,
    pub avg_cycle_time: Option<SimTime>,
    /// `(id, cycle time)` sorted by part id.
    pub cycle_times: Vec<(PartId, SimTime)>,
}

impl ProductionReport {
    pub fn from_finished(parts: &[FinishedPart]) -> Self {
        let makespan = parts
            .iter()
            .map(|p| p.termination_time)
            .max()
            .unwrap_or(SimTime::ZERO);
        let count = Fixed64::from_num(parts.len());
        let throughput = checked_div_64(count, makespan).unwrap_or(Fixed64::ZERO);

        let mut cycle_times: Vec<(PartId, SimTime)> =
            parts.iter().map(|p| (p.id, p.cycle_time())).collect();
        cycle_times.sort_by_key(|&(id, _)| id);

        let total = cycle_times
            .iter()
            .fold(SimTime::ZERO, |acc, &(_, ct)| acc.saturating_add(ct));

        Self {
            parts_finished: parts.len() as u64,
            makespan,
            throughput,
            min_cycle_time: cycle_times.iter().map(|&(_, ct)| ct).min(),
            max_cycle_time: cycle_times.iter().map(|&(_, ct)| ct).max(),
            avg_cycle_time: checked_div_64(total, count),
            cycle_times,
        }
    }
}

// ---------------------------------------------------------------------------
// Remaining cycle time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RctError {
    #[error("{0} did not finish during the run")]
    PartNotFinished(PartId),
    #[error("a batch needs at least one part")]
    EmptyBatch,
    #[error("batch of {requested} parts requested but only {finished} finished")]
    BatchTooLarge { requested: usize, finished: usize },
}

/// RCT of a batch: the cycle time of its last part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRct {
    pub cycle_time: SimTime,
    /// Members of the batch, in completion order.
    pub part_ids: Vec<PartId>,
}

/// Cycle time of one finished part.
pub fn rct_for_part(parts: &[FinishedPart], id: PartId) -> Result<SimTime, RctError> {
    parts
        .iter()
        .find(|p| p.id == id)
        .map(FinishedPart::cycle_time)
        .ok_or(RctError::PartNotFinished(id))
}

/// RCT of the first `n` parts to finish. `parts` must be in completion
/// order, as the terminator reports them.
pub fn rct_for_batch(parts: &[FinishedPart], n: usize) -> Result<BatchRct, RctError> {
    if n == 0 {
        return Err(RctError::EmptyBatch);
    }
    let Some(last) = parts.get(n - 1) else {
        return Err(RctError::BatchTooLarge {
            requested: n,
            finished: parts.len(),
        });
    };
    Ok(BatchRct {
        cycle_time: last.cycle_time(),
        part_ids: parts[..n].iter().map(|p| p.id).collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

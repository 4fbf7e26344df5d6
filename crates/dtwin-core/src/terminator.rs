//! The sink that collects finished parts.

use crate::fixed::SimTime;
use crate::id::PartId;
use crate::part::Part;
use serde::{Deserialize, Serialize};

/// What downstream analysis needs about a finished part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedPart {
    pub id: PartId,
    pub creation_time: SimTime,
    pub termination_time: SimTime,
}

impl FinishedPart {
    pub fn cycle_time(&self) -> SimTime {
        self.termination_time - self.creation_time
    }
}

/// Unbounded sink. Parts are kept in completion order.
#[derive(Debug, Default)]
pub struct Terminator {
    parts: Vec<Part>,
}

impl Terminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `termination_time = now` and keep the part.
    pub fn accept(&mut self, mut part: Part, now: SimTime) {
        part.terminate(now);
        self.parts.push(part);
    }

    /// Every finished part, in completion order.
    pub fn all_items(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.parts.iter().any(|p| p.id() == id)
    }

    /// Analysis records for every finished part, in completion order.
    pub fn finished(&self) -> Vec<FinishedPart> {
        self.parts
            .iter()
            .filter_map(|p| {
                Some(FinishedPart {
                    id: p.id(),
                    creation_time: p.creation_time(),
                    termination_time: p.termination_time()?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::Location;

    #[test]
    fn keeps_completion_order() {
        let mut t = Terminator::new();
        for (id, at) in [(3, 4), (1, 6), (2, 9)] {
            let p = Part::new(PartId(id), "A", Location::Machine(1), SimTime::ZERO);
            t.accept(p, SimTime::from_num(at));
        }
        let ids: Vec<_> = t.all_items().iter().map(|p| p.id().0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(t.contains(PartId(1)));
        assert!(!t.contains(PartId(4)));
        assert!(t.all_items().iter().all(|p| p.location() == Location::Terminator));
    }

    #[test]
    fn finished_records_cycle_time() {
        let mut t = Terminator::new();
        let p = Part::new(PartId(1), "A", Location::Machine(1), SimTime::from_num(2));
        t.accept(p, SimTime::from_num(12));
        let f = t.finished();
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].cycle_time(), SimTime::from_num(10));
    }
}

use crate::fixed::SimTime;
use crate::id::PartId;
use serde::{Deserialize, Serialize};

/// The container currently holding a part. Numeric ids are the public
/// machine/queue/conveyor ids, not arena keys, so they can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Queue(u32),
    Machine(u32),
    Conveyor(u32),
    Terminator,
}

impl Location {
    /// Stable numeric tag used when hashing event records.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Location::Queue(_) => 0,
            Location::Machine(_) => 1,
            Location::Conveyor(_) => 2,
            Location::Terminator => 3,
        }
    }

    /// The numeric id of the container (0 for the terminator).
    pub fn id(self) -> u32 {
        match self {
            Location::Queue(id) | Location::Machine(id) | Location::Conveyor(id) => id,
            Location::Terminator => 0,
        }
    }
}

/// A unit of work flowing through the line.
///
/// During a run a `Part` is moved from one container to the next, so two
/// containers can never hold the same id. `Clone` exists only so a frozen
/// topology can seed its worked-time parts into more than one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    id: PartId,
    part_type: String,
    location: Location,
    creation_time: SimTime,
    termination_time: Option<SimTime>,
}

impl Part {
    pub fn new(id: PartId, part_type: impl Into<String>, location: Location, creation_time: SimTime) -> Self {
        Self {
            id,
            part_type: part_type.into(),
            location,
            creation_time,
            termination_time: None,
        }
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    pub fn part_type(&self) -> &str {
        &self.part_type
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn creation_time(&self) -> SimTime {
        self.creation_time
    }

    pub fn termination_time(&self) -> Option<SimTime> {
        self.termination_time
    }

    /// Time from creation to termination, once the part has finished.
    pub fn cycle_time(&self) -> Option<SimTime> {
        self.termination_time.map(|t| t - self.creation_time)
    }

    /// Record that the part now lives in `location`.
    pub(crate) fn move_to(&mut self, location: Location) {
        self.location = location;
    }

    /// Stamp the termination time and move the part into the terminator.
    ///
    /// # Panics
    ///
    /// Panics if the part was already terminated.
    pub(crate) fn terminate(&mut self, now: SimTime) {
        assert!(
            self.termination_time.is_none(),
            "{} terminated twice",
            self.id
        );
        self.termination_time = Some(now);
        self.location = Location::Terminator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: u64) -> Part {
        Part::new(PartId(id), "A", Location::Queue(1), SimTime::ZERO)
    }

    #[test]
    fn new_part_is_unfinished() {
        let p = part(1);
        assert_eq!(p.id(), PartId(1));
        assert_eq!(p.part_type(), "A");
        assert!(p.termination_time().is_none());
        assert!(p.cycle_time().is_none());
    }

    #[test]
    fn terminate_sets_time_and_location() {
        let mut p = Part::new(PartId(3), "A", Location::Machine(2), SimTime::from_num(4));
        p.terminate(SimTime::from_num(19));
        assert_eq!(p.location(), Location::Terminator);
        assert_eq!(p.termination_time(), Some(SimTime::from_num(19)));
        assert_eq!(p.cycle_time(), Some(SimTime::from_num(15)));
    }

    #[test]
    #[should_panic(expected = "terminated twice")]
    fn terminate_twice_panics() {
        let mut p = part(1);
        p.terminate(SimTime::from_num(1));
        p.terminate(SimTime::from_num(2));
    }

    #[test]
    fn move_updates_location() {
        let mut p = part(1);
        p.move_to(Location::Conveyor(4));
        assert_eq!(p.location(), Location::Conveyor(4));
    }

    #[test]
    fn location_ids() {
        assert_eq!(Location::Queue(3).id(), 3);
        assert_eq!(Location::Terminator.id(), 0);
        assert_ne!(Location::Queue(1).tag(), Location::Machine(1).tag());
    }
}

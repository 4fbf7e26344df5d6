//! Event records and the sinks that receive them.
//!
//! The engine emits one [`EventRecord`] per state transition of a part
//! through an [`EventSink`] supplied at construction. The sink owns
//! storage; the engine never does.
//!
//! # Suppression
//!
//! [`EventLog`] can suppress individual kinds via [`EventLog::suppress`].
//! Suppressed records are dropped before allocation and do not contribute
//! to the digest.

use crate::fixed::SimTime;
use crate::id::PartId;
use crate::part::Location;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

// ---------------------------------------------------------------------------
// Event records
// ---------------------------------------------------------------------------

/// What happened to a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PartCreated,
    QueueEntered,
    ProcessStarted,
    ProcessFinished,
    ConveyorLoaded,
    ConveyorDelivered,
    PartTerminated,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 7;

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

/// One row of the digital log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub time: SimTime,
    pub part_id: PartId,
    pub location: Location,
    pub kind: EventKind,
}

impl EventRecord {
    fn hash_into(&self, h: &mut impl Hasher) {
        h.write_i64(self.time.to_bits());
        h.write_u64(self.part_id.0);
        h.write_u8(self.location.tag());
        h.write_u32(self.location.id());
        h.write_u8(self.kind as u8);
    }
}

/// 64-bit FNV-1a over little-endian words. Stable across platforms, which
/// `DefaultHasher` is not.
struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }
}

impl Hasher for Fnv1a {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.write(&v.to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receives every event the engine produces, in order.
pub trait EventSink {
    fn record(&mut self, event: &EventRecord);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &EventRecord) {}
}

/// Feeds every event to both sinks, first `A` then `B`.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn record(&mut self, event: &EventRecord) {
        self.0.record(event);
        self.1.record(event);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

/// In-memory event log.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    records: Vec<EventRecord>,
    suppressed: [bool; EVENT_KIND_COUNT],
    dropped: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop recording `kind`.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dropped because their kind was suppressed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Records of one kind, in order.
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &EventRecord> + '_ {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// Every record about one part, in order.
    pub fn for_part(&self, id: PartId) -> impl Iterator<Item = &EventRecord> + '_ {
        self.records.iter().filter(move |r| r.part_id == id)
    }

    /// Encode the records with bitcode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EventLogError> {
        bitcode::serialize(&self.records).map_err(|e| EventLogError::Encode(e.to_string()))
    }

    /// Rebuild a log from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(data: &[u8]) -> Result<Self, EventLogError> {
        let records: Vec<EventRecord> =
            bitcode::deserialize(data).map_err(|e| EventLogError::Decode(e.to_string()))?;
        Ok(Self {
            records,
            ..Self::default()
        })
    }

    /// FNV-1a fingerprint of every record, in order.
    pub fn digest(&self) -> u64 {
        let mut h = Fnv1a::default();
        h.write_u64(self.records.len() as u64);
        for r in &self.records {
            r.hash_into(&mut h);
        }
        h.finish()
    }

    /// Index of the first record where the two logs differ, if any.
    pub fn first_divergence(&self, other: &EventLog) -> Option<usize> {
        let common = self.records.len().min(other.records.len());
        (0..common)
            .find(|&i| self.records[i] != other.records[i])
            .or_else(|| (self.records.len() != other.records.len()).then_some(common))
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: &EventRecord) {
        if self.suppressed[event.kind.index()] {
            self.dropped += 1;
            return;
        }
        self.records.push(*event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &EventRecord) {
        (**self).record(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

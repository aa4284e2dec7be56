//! Timed event queue for one fight. Events order by timestamp, then by a
//! per-run sequence counter assigned at creation. The counter is the single
//! monotonic source that makes seeded runs reproducible: two events can never
//! legitimately share both fields, and a full tie is treated as a bug rather
//! than resolved arbitrarily.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::rules::{AbilityId, BuffId, OnUseId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Main,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A weapon swing. `bonus_attack` marks an extra attack granted by a
    /// proc, scheduled at the triggering instant; it does not move the
    /// regular swing timer.
    WhiteHit { hand: Hand, bonus_attack: bool },
    BuffExpires(BuffId),
    OnUseReady(OnUseId),
    CooldownEnd(AbilityId),
}

#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: f64,
    pub seq: u64,
    pub kind: EventKind,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time.to_bits() == other.time.to_bits() && self.seq == other.seq
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.total_cmp(&other.time) {
            Ordering::Equal => {
                let by_seq = self.seq.cmp(&other.seq);
                assert!(
                    by_seq != Ordering::Equal,
                    "event queue issued duplicate sequence number {} at t={}",
                    self.seq,
                    self.time
                );
                by_seq
            }
            ordering => ordering,
        }
    }
}

/// Min-queue over [Event]. Sequence numbers are issued here so a run has
/// exactly one monotonic source.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Event>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, time: f64, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Event { time, seq, kind }));
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

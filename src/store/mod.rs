//! Replica Store
//!
//! Each node keeps a full replica of the key space in memory. Remote state is
//! folded in through a single last-write-wins merge; ties keep the value that
//! is already stored.
pub mod clock;
pub mod value;

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub use clock::{is_valid_timestamp, wall_clock_seconds, WriteClock, MAX_TIMESTAMP};
pub use value::Value;

/// A value together with the timestamp of the write that produced it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub value: Value,
    pub timestamp: f64,
}

impl Entry {
    pub fn new(value: Value, timestamp: f64) -> Self {
        Self { value, timestamp }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<String, Entry>,
    clock: WriteClock,
}

/// Key -> Entry map guarded by one lock.
///
/// Writes, merges and snapshots all take the same lock, so a check-then-set
/// in `merge` can never interleave with a concurrent `write` on the same key.
#[derive(Debug, Default)]
pub struct ReplicaStore {
    state: Mutex<StoreState>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a local write and return the timestamp assigned to it.
    pub fn write(&self, key: &str, value: Value) -> f64 {
        self.write_at(key, value, wall_clock_seconds())
    }

    /// `write` with an explicit clock reading
    pub fn write_at(&self, key: &str, value: Value, now: f64) -> f64 {
        let value = value.normalize();
        let mut state = self.state.lock();
        let floor = state.entries.get(key).map(|e| e.timestamp);
        let timestamp = state.clock.tick(now, floor);
        state
            .entries
            .insert(key.to_string(), Entry::new(value, timestamp));
        timestamp
    }

    /// Apply a remote entry if the key is absent or `timestamp` is strictly
    /// newer than the stored one. Returns whether local state changed.
    /// Timestamps outside the range a node can issue are rejected.
    pub fn merge(&self, key: &str, value: Value, timestamp: f64) -> bool {
        if !is_valid_timestamp(timestamp) {
            return false;
        }
        let value = value.normalize();
        let mut state = self.state.lock();
        match state.entries.get_mut(key) {
            Some(current) if timestamp <= current.timestamp => false,
            Some(current) => {
                *current = Entry::new(value, timestamp);
                true
            }
            None => {
                state
                    .entries
                    .insert(key.to_string(), Entry::new(value, timestamp));
                true
            }
        }
    }

    /// Merge every entry of a remote snapshot; returns how many were applied.
    pub fn merge_all<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, Entry)>,
    {
        entries
            .into_iter()
            .filter(|(key, entry)| self.merge(key, entry.value.clone(), entry.timestamp))
            .count()
    }

    pub fn read(&self, key: &str) -> Option<Entry> {
        self.state.lock().entries.get(key).cloned()
    }

    /// Point-in-time copy of the whole store
    pub fn snapshot(&self) -> HashMap<String, Entry> {
        self.state.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

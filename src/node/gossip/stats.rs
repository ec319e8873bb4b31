use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for what a node did with the messages it saw
#[derive(Debug, Default)]
pub struct GossipStats {
    pub updates_applied: AtomicU64,
    pub updates_rejected: AtomicU64,
    pub syncs_received: AtomicU64,
    pub sync_entries_applied: AtomicU64,
    pub decode_errors: AtomicU64,
    pub regossip_scheduled: AtomicU64,
    pub regossip_dropped: AtomicU64,
    pub anti_entropy_rounds: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrozenGossipStats {
    pub updates_applied: u64,
    pub updates_rejected: u64,
    pub syncs_received: u64,
    pub sync_entries_applied: u64,
    pub decode_errors: u64,
    pub regossip_scheduled: u64,
    pub regossip_dropped: u64,
    pub anti_entropy_rounds: u64,
}

impl GossipStats {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn freeze(&self) -> FrozenGossipStats {
        FrozenGossipStats {
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_rejected: self.updates_rejected.load(Ordering::Relaxed),
            syncs_received: self.syncs_received.load(Ordering::Relaxed),
            sync_entries_applied: self.sync_entries_applied.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            regossip_scheduled: self.regossip_scheduled.load(Ordering::Relaxed),
            regossip_dropped: self.regossip_dropped.load(Ordering::Relaxed),
            anti_entropy_rounds: self.anti_entropy_rounds.load(Ordering::Relaxed),
        }
    }
}

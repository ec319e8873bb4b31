//! Transport statistics, kept as relaxed atomics and frozen for reporting.
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct TransportStats {
    pub messages_sent: AtomicU64,
    pub send_errors: AtomicU64,
    pub messages_received: AtomicU64,
    pub receive_errors: AtomicU64,
}

/// Plain-value copy of [`TransportStats`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrozenTransportStats {
    pub messages_sent: u64,
    pub send_errors: u64,
    pub messages_received: u64,
    pub receive_errors: u64,
}

impl TransportStats {
    pub fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn freeze(&self) -> FrozenTransportStats {
        FrozenTransportStats {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
        }
    }
}

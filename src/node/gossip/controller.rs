//! Receive Loop
//!
//! Drains the transport, decodes each datagram and dispatches it to the
//! replica store. Dispatch never awaits: re-gossip is handed to the bounded
//! worker queue, so merging never stalls the draining of further datagrams.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use super::disseminator::{RegossipJob, RegossipQueue};
use super::messages::GossipMessage;
use super::stats::GossipStats;
use crate::error::Result;
use crate::node::NodeName;
use crate::store::ReplicaStore;
use crate::transport::Transport;

// pause after a failed receive so a persistent socket error cannot spin
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// What a datagram did to the local store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Update merged; `regossip` says whether it was queued for forwarding
    UpdateApplied { regossip: bool },
    /// Update was stale or a duplicate
    UpdateRejected,
    /// Sync merged; number of entries that changed local state
    SyncMerged { applied: usize },
    /// Message we sent ourselves
    Ignored,
}

pub struct GossipController {
    node_name: NodeName,
    store: Arc<ReplicaStore>,
    regossip: RegossipQueue,
    regossip_probability: f64,
    stats: Arc<GossipStats>,
}

impl std::fmt::Debug for GossipController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GossipController")
            .field("node_name", &self.node_name)
            .field("regossip_probability", &self.regossip_probability)
            .finish()
    }
}

impl GossipController {
    pub fn new(
        node_name: NodeName,
        store: Arc<ReplicaStore>,
        regossip: RegossipQueue,
        regossip_probability: f64,
        stats: Arc<GossipStats>,
    ) -> Self {
        Self {
            node_name,
            store,
            regossip,
            regossip_probability,
            stats,
        }
    }

    /// Receive and dispatch datagrams until the task is aborted
    pub async fn run(self: Arc<Self>, transport: Arc<dyn Transport>) {
        info!(
            "[{}] Starting receive loop on {}",
            self.node_name,
            transport.local_addr()
        );
        loop {
            match transport.recv_from().await {
                Ok((data, peer_addr)) => {
                    if let Err(e) = self.handle_datagram(&data, peer_addr) {
                        debug!("[{}] Error processing incoming message: {}", self.node_name, e);
                    }
                }
                Err(e) => {
                    debug!("[{}] Receive error: {}", self.node_name, e);
                    time::sleep(RECV_ERROR_BACKOFF).await;
                }
            }
        }
    }

    /// Decode and dispatch one datagram. Undecodable payloads are counted and
    /// returned as an error for the caller to log; the store is not touched.
    pub fn handle_datagram(&self, data: &[u8], peer_addr: SocketAddr) -> Result<Dispatch> {
        match GossipMessage::deserialize(data) {
            Ok(message) => Ok(self.handle_message(message, peer_addr)),
            Err(e) => {
                GossipStats::incr(&self.stats.decode_errors);
                debug!(
                    "[{}] Discarding undecodable datagram from {}: {}",
                    self.node_name, peer_addr, e
                );
                Err(e.into())
            }
        }
    }

    pub fn handle_message(&self, message: GossipMessage, peer_addr: SocketAddr) -> Dispatch {
        // Don't process our own messages
        if message.sender() == &self.node_name {
            debug!("[{}] Ignoring our own gossip message", self.node_name);
            return Dispatch::Ignored;
        }

        match message {
            GossipMessage::Update {
                key,
                value,
                timestamp,
                origin,
            } => {
                if !self.store.merge(&key, value.clone(), timestamp) {
                    GossipStats::incr(&self.stats.updates_rejected);
                    debug!(
                        "[{}] Rejected stale update for '{}' (ts {}) from {}",
                        self.node_name, key, timestamp, origin
                    );
                    return Dispatch::UpdateRejected;
                }

                GossipStats::incr(&self.stats.updates_applied);
                info!(
                    "[{}] GOSSIP UPDATE {} = {} from {}",
                    self.node_name, key, value, origin
                );
                let regossip = self.should_regossip()
                    && self.regossip.submit(RegossipJob {
                        key,
                        value,
                        timestamp,
                    });
                Dispatch::UpdateApplied { regossip }
            }
            GossipMessage::Sync { store, node_id } => {
                GossipStats::incr(&self.stats.syncs_received);
                let received = store.len();
                let applied = self.store.merge_all(store);
                GossipStats::add(&self.stats.sync_entries_applied, applied as u64);
                debug!(
                    "[{}] Merged sync from {} ({}): {} of {} entries applied",
                    self.node_name, node_id, peer_addr, applied, received
                );
                Dispatch::SyncMerged { applied }
            }
        }
    }

    fn should_regossip(&self) -> bool {
        self.regossip_probability > 0.0 && rand::random::<f64>() < self.regossip_probability
    }
}

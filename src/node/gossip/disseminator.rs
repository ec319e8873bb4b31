//! Gossip Disseminator
//!
//! Pushes one key's entry to a random fan-out of peers. Local writes call
//! `propagate` directly; re-gossip of remotely applied updates goes through a
//! fixed pool of workers fed by a bounded queue, so a burst of incoming
//! updates can never pile up an unbounded number of live tasks.
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::messages::{GossipMessage, MAX_DATAGRAM_SIZE};
use super::stats::GossipStats;
use crate::node::{NodeName, PeerSet};
use crate::store::Value;
use crate::transport::Transport;

pub struct Disseminator {
    node_name: NodeName,
    peers: PeerSet,
    transport: Arc<dyn Transport>,
    fanout: usize,
}

impl std::fmt::Debug for Disseminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disseminator")
            .field("node_name", &self.node_name)
            .field("peers", &self.peers.len())
            .field("fanout", &self.fanout)
            .finish()
    }
}

impl Disseminator {
    pub fn new(
        node_name: NodeName,
        peers: PeerSet,
        transport: Arc<dyn Transport>,
        fanout: usize,
    ) -> Self {
        Self {
            node_name,
            peers,
            transport,
            fanout,
        }
    }

    /// Send an `update` for this entry to `min(fanout, peers)` random peers.
    ///
    /// Returns the number of peers the datagram was handed off to. A failed
    /// send is logged and skipped; it never stops the remaining sends.
    pub async fn propagate(&self, key: &str, value: &Value, timestamp: f64) -> usize {
        let targets = self.peers.choose_many(self.fanout);
        if targets.is_empty() {
            debug!("[{}] No peers to gossip '{}' to", self.node_name, key);
            return 0;
        }

        let message = GossipMessage::Update {
            key: key.to_string(),
            value: value.clone(),
            timestamp,
            origin: self.node_name.clone(),
        };
        let data = match message.serialize() {
            Ok(data) if data.len() <= MAX_DATAGRAM_SIZE => data,
            Ok(data) => {
                warn!(
                    "[{}] Update for '{}' is {} bytes, too large to gossip",
                    self.node_name,
                    key,
                    data.len()
                );
                return 0;
            }
            Err(e) => {
                warn!("[{}] Failed to encode update for '{}': {}", self.node_name, key, e);
                return 0;
            }
        };

        let mut delivered = 0;
        for target in targets {
            match self.transport.send_to(target, &data).await {
                Ok(()) => delivered += 1,
                Err(e) => debug!("[{}] Gossip send to {} failed: {}", self.node_name, target, e),
            }
        }
        debug!(
            "[{}] Gossiped '{}' (ts {}) to {} peer(s)",
            self.node_name, key, timestamp, delivered
        );
        delivered
    }
}

/// A remotely applied update waiting to be forwarded
#[derive(Clone, Debug, PartialEq)]
pub struct RegossipJob {
    pub key: String,
    pub value: Value,
    pub timestamp: f64,
}

/// Submit side of the re-gossip queue
#[derive(Clone, Debug)]
pub struct RegossipQueue {
    tx: mpsc::Sender<RegossipJob>,
    stats: Arc<GossipStats>,
}

impl RegossipQueue {
    /// Create the bounded queue; the receiver is handed to [`spawn_regossip_workers`]
    pub fn bounded(
        capacity: usize,
        stats: Arc<GossipStats>,
    ) -> (Self, mpsc::Receiver<RegossipJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, stats }, rx)
    }

    /// Queue a re-gossip without waiting. Returns false if it was dropped
    /// because the queue is full (or the workers are gone).
    pub fn submit(&self, job: RegossipJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => {
                GossipStats::incr(&self.stats.regossip_scheduled);
                true
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                GossipStats::incr(&self.stats.regossip_dropped);
                debug!("Re-gossip queue full, dropping update for '{}'", job.key);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                GossipStats::incr(&self.stats.regossip_dropped);
                false
            }
        }
    }
}

/// Start `workers` tasks that drain the re-gossip queue
pub fn spawn_regossip_workers(
    disseminator: Arc<Disseminator>,
    rx: mpsc::Receiver<RegossipJob>,
    workers: usize,
) -> Vec<JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));
    (0..workers)
        .map(|_| {
            let rx = Arc::clone(&rx);
            let disseminator = Arc::clone(&disseminator);
            tokio::spawn(async move {
                loop {
                    // hold the lock only while waiting for the next job
                    let job = rx.lock().await.recv().await;
                    match job {
                        Some(job) => {
                            disseminator
                                .propagate(&job.key, &job.value, job.timestamp)
                                .await;
                        }
                        None => break,
                    }
                }
            })
        })
        .collect()
}

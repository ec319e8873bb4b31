//! Anti-Entropy Synchronizer
//!
//! Every period, the whole local store is pushed to one random peer as
//! `sync` messages. This is the convergence backstop for updates that gossip
//! failed to deliver. A snapshot too large for one datagram is split across
//! several `sync` messages; each is merged on its own by the receiver.
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::messages::{GossipMessage, MAX_DATAGRAM_SIZE};
use super::stats::GossipStats;
use crate::error::Result;
use crate::node::{NodeName, PeerSet};
use crate::store::{Entry, ReplicaStore};
use crate::transport::Transport;

pub struct AntiEntropy {
    node_name: NodeName,
    peers: PeerSet,
    store: Arc<ReplicaStore>,
    transport: Arc<dyn Transport>,
    interval: Duration,
    stats: Arc<GossipStats>,
}

impl AntiEntropy {
    pub fn new(
        node_name: NodeName,
        peers: PeerSet,
        store: Arc<ReplicaStore>,
        transport: Arc<dyn Transport>,
        interval: Duration,
        stats: Arc<GossipStats>,
    ) -> Self {
        Self {
            node_name,
            peers,
            store,
            transport,
            interval,
            stats,
        }
    }

    /// Run sync rounds forever, one per period. The first round happens one
    /// full period after start.
    pub async fn run(self) {
        info!(
            "[{}] Starting anti-entropy with {}ms interval",
            self.node_name,
            self.interval.as_millis()
        );
        let mut timer = time::interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            if let Err(e) = self.sync_once().await {
                debug!("[{}] Error during anti-entropy round: {}", self.node_name, e);
            }
        }
    }

    /// Push the current snapshot to one random peer. Returns the peer chosen,
    /// or `None` when the peer set is empty.
    pub async fn sync_once(&self) -> Result<Option<SocketAddr>> {
        let Some(target) = self.peers.choose_one() else {
            return Ok(None);
        };
        GossipStats::incr(&self.stats.anti_entropy_rounds);

        let snapshot = self.store.snapshot();
        let entry_count = snapshot.len();
        let chunks = encode_sync_chunks(&self.node_name, snapshot)?;

        for chunk in &chunks {
            if let Err(e) = self.transport.send_to(target, chunk).await {
                // the rest of this round would go to the same dead peer
                debug!("[{}] Sync to {} failed: {}", self.node_name, target, e);
                break;
            }
        }
        debug!(
            "[{}] Sent {} entries to {} in {} sync message(s)",
            self.node_name,
            entry_count,
            target,
            chunks.len()
        );
        Ok(Some(target))
    }
}

/// Encode a snapshot as one or more `sync` datagrams, halving the entry set
/// until every piece fits. An entry that cannot fit on its own is skipped.
pub fn encode_sync_chunks(
    node_name: &NodeName,
    snapshot: HashMap<String, Entry>,
) -> Result<Vec<Vec<u8>>> {
    let mut chunks = Vec::new();
    encode_into(node_name, snapshot.into_iter().collect(), &mut chunks)?;
    Ok(chunks)
}

fn encode_into(
    node_name: &NodeName,
    mut entries: Vec<(String, Entry)>,
    chunks: &mut Vec<Vec<u8>>,
) -> Result<()> {
    let message = GossipMessage::Sync {
        store: entries.iter().cloned().collect(),
        node_id: node_name.clone(),
    };
    let data = message.serialize()?;
    if data.len() <= MAX_DATAGRAM_SIZE {
        chunks.push(data);
        return Ok(());
    }
    if entries.len() <= 1 {
        if let Some((key, _)) = entries.first() {
            warn!(
                "[{}] Entry '{}' is too large to sync ({} bytes), skipping",
                node_name,
                key,
                data.len()
            );
        }
        return Ok(());
    }
    let rest = entries.split_off(entries.len() / 2);
    encode_into(node_name, entries, chunks)?;
    encode_into(node_name, rest, chunks)
}

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::anti_entropy::AntiEntropy;
use super::controller::GossipController;
use super::disseminator::{spawn_regossip_workers, Disseminator, RegossipJob, RegossipQueue};
use super::stats::{FrozenGossipStats, GossipStats};
use crate::error::Result;
use crate::node::{NodeName, PeerSet};
use crate::settings;
use crate::store::{Entry, ReplicaStore, Value};
use crate::transport::{FrozenTransportStats, Transport, UdpTransport};

/// Snapshot of a node's counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub gossip: FrozenGossipStats,
    pub transport: FrozenTransportStats,
}

/// A replica of the key-value store that stays in sync with its peers
/// through gossip and periodic anti-entropy.
///
/// Cloning is cheap and every clone refers to the same node. Background
/// tasks launched by [`GossipNode::start`] are aborted when the last clone
/// is dropped.
#[derive(Clone)]
pub struct GossipNode {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    node_name: NodeName,
    peers: PeerSet,
    store: Arc<ReplicaStore>,
    transport: Arc<dyn Transport>,
    disseminator: Arc<Disseminator>,
    controller: Arc<GossipController>,
    stats: Arc<GossipStats>,
    anti_entropy_interval: Duration,
    regossip_workers: usize,
    // taken by `start`; `None` afterwards
    regossip_rx: Mutex<Option<mpsc::Receiver<RegossipJob>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for GossipNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GossipNode")
            .field("node_name", &self.inner.node_name)
            .field("local_addr", &self.inner.transport.local_addr())
            .field("peers", &self.inner.peers.len())
            .field("started", &self.is_started())
            .finish()
    }
}

impl GossipNode {
    /// Bind a UDP transport at the configured address and build the node.
    /// Binding failure is the only fatal construction error.
    pub async fn new(settings: settings::Settings) -> Result<Self> {
        settings.validate()?;
        let transport =
            UdpTransport::bind(settings.listen_socket_addr()?, settings.allow_broadcast).await?;
        Self::with_transport(settings, Arc::new(transport))
    }

    /// Build a node on an already bound transport
    pub fn with_transport(
        settings: settings::Settings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        settings.validate()?;
        let node_name = settings.node_name.clone();
        let peers = PeerSet::new(settings.topology.clone());
        info!(
            "[{}] Created GossipNode on {} with {} peers: {:?}",
            node_name,
            transport.local_addr(),
            peers.len(),
            peers.as_slice()
        );

        let store = Arc::new(ReplicaStore::new());
        let stats = Arc::new(GossipStats::default());
        let disseminator = Arc::new(Disseminator::new(
            node_name.clone(),
            peers.clone(),
            Arc::clone(&transport),
            settings.gossip_fanout,
        ));
        let (regossip, regossip_rx) =
            RegossipQueue::bounded(settings.regossip_queue_size, Arc::clone(&stats));
        let controller = Arc::new(GossipController::new(
            node_name.clone(),
            Arc::clone(&store),
            regossip,
            settings.regossip_probability,
            Arc::clone(&stats),
        ));

        Ok(Self {
            inner: Arc::new(NodeInner {
                node_name,
                peers,
                store,
                transport,
                disseminator,
                controller,
                stats,
                anti_entropy_interval: settings.anti_entropy_interval(),
                regossip_workers: settings.regossip_workers,
                regossip_rx: Mutex::new(Some(regossip_rx)),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Launch the receive loop, the anti-entropy timer and the re-gossip
    /// workers as background tasks and return immediately.
    ///
    /// Must be called from within a tokio runtime. A node can only be
    /// started once.
    pub fn start(&self) -> Result<()> {
        let inner = &self.inner;
        let regossip_rx = inner
            .regossip_rx
            .lock()
            .take()
            .ok_or_else(|| crate::node_error!("node {} is already started", inner.node_name))?;

        let mut tasks = spawn_regossip_workers(
            Arc::clone(&inner.disseminator),
            regossip_rx,
            inner.regossip_workers,
        );
        tasks.push(tokio::spawn(
            Arc::clone(&inner.controller).run(Arc::clone(&inner.transport)),
        ));
        let anti_entropy = AntiEntropy::new(
            inner.node_name.clone(),
            inner.peers.clone(),
            Arc::clone(&inner.store),
            Arc::clone(&inner.transport),
            inner.anti_entropy_interval,
            Arc::clone(&inner.stats),
        );
        tasks.push(tokio::spawn(anti_entropy.run()));

        info!(
            "[{}] Started with {} background tasks",
            inner.node_name,
            tasks.len()
        );
        inner.tasks.lock().extend(tasks);
        Ok(())
    }

    /// Write locally, then gossip the new entry to a random fan-out of
    /// peers. Returns the timestamp assigned to the write. Network failures
    /// are never reported to the caller.
    pub async fn put(&self, key: &str, value: impl Into<Value>) -> f64 {
        let value = value.into();
        let timestamp = self.inner.store.write(key, value.clone());
        info!("[{}] PUT {} = {}", self.inner.node_name, key, value);
        self.inner
            .disseminator
            .propagate(key, &value, timestamp)
            .await;
        timestamp
    }

    /// Local read; never touches the network
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.inner.store.read(key) {
            Some(entry) => {
                info!(
                    "[{}] GET {} = {} (ts: {:.2})",
                    self.inner.node_name, key, entry.value, entry.timestamp
                );
                Some(entry.value)
            }
            None => {
                info!("[{}] GET {} = NOT FOUND", self.inner.node_name, key);
                None
            }
        }
    }

    /// Local read including the entry's timestamp
    pub fn get_entry(&self, key: &str) -> Option<Entry> {
        self.inner.store.read(key)
    }

    /// Run one anti-entropy round immediately, outside the timer
    pub async fn sync_now(&self) -> Result<Option<SocketAddr>> {
        let anti_entropy = AntiEntropy::new(
            self.inner.node_name.clone(),
            self.inner.peers.clone(),
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.transport),
            self.inner.anti_entropy_interval,
            Arc::clone(&self.inner.stats),
        );
        let target = anti_entropy.sync_once().await?;
        debug!("[{}] Manual sync sent to {:?}", self.inner.node_name, target);
        Ok(target)
    }

    pub fn node_name(&self) -> &NodeName {
        &self.inner.node_name
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.inner.transport.local_addr()
    }

    pub fn peers(&self) -> &[SocketAddr] {
        self.inner.peers.as_slice()
    }

    pub fn snapshot(&self) -> HashMap<String, Entry> {
        self.inner.store.snapshot()
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.inner.regossip_rx.lock().is_none()
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            gossip: self.inner.stats.freeze(),
            transport: self.inner.transport.stats(),
        }
    }
}

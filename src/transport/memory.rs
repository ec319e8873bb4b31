//! In-process datagram network.
//!
//! `MemoryNetwork` routes datagrams between `MemoryTransport` endpoints
//! through unbounded channels. It can drop a fraction of datagrams and cut
//! individual endpoints off, which makes loss and partition scenarios
//! reproducible without real sockets.
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::stats::{FrozenTransportStats, TransportStats};
use super::traits::Transport;
use crate::error::Result;

type Datagram = (Vec<u8>, SocketAddr);

#[derive(Debug, Default)]
struct NetworkState {
    endpoints: HashMap<SocketAddr, mpsc::UnboundedSender<Datagram>>,
    isolated: HashSet<SocketAddr>,
    drop_rate: f64,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A network that silently loses `drop_rate` of all datagrams
    pub fn lossy(drop_rate: f64) -> Self {
        let network = Self::new();
        network.set_drop_rate(drop_rate);
        network
    }

    pub fn set_drop_rate(&self, drop_rate: f64) {
        self.state.lock().drop_rate = drop_rate.clamp(0.0, 1.0);
    }

    /// Drop everything sent to or from `addr` until `heal` is called
    pub fn isolate(&self, addr: SocketAddr) {
        self.state.lock().isolated.insert(addr);
    }

    pub fn heal(&self, addr: SocketAddr) {
        self.state.lock().isolated.remove(&addr);
    }

    /// Register an endpoint at `addr`
    pub fn bind(&self, addr: SocketAddr) -> Result<MemoryTransport> {
        let mut state = self.state.lock();
        if state.endpoints.contains_key(&addr) {
            return Err(crate::transport_error!("Address already in use: {}", addr));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.endpoints.insert(addr, tx);

        Ok(MemoryTransport {
            addr,
            network: self.clone(),
            inbox: tokio::sync::Mutex::new(rx),
            stats: Arc::new(TransportStats::default()),
        })
    }

    fn route(&self, from: SocketAddr, to: SocketAddr, data: &[u8]) -> Result<()> {
        let state = self.state.lock();
        let endpoint = state
            .endpoints
            .get(&to)
            .ok_or_else(|| crate::transport_error!("Unreachable peer: {}", to))?;

        if state.isolated.contains(&from) || state.isolated.contains(&to) {
            return Ok(());
        }
        if state.drop_rate > 0.0 && rand::random::<f64>() < state.drop_rate {
            return Ok(());
        }
        // a closed inbox behaves like a host that went away mid-send
        let _ = endpoint.send((data.to_vec(), from));
        Ok(())
    }

    fn unbind(&self, addr: SocketAddr) {
        self.state.lock().endpoints.remove(&addr);
    }
}

#[derive(Debug)]
pub struct MemoryTransport {
    addr: SocketAddr,
    network: MemoryNetwork,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<Datagram>>,
    stats: Arc<TransportStats>,
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.network.unbind(self.addr);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_to(&self, target: SocketAddr, data: &[u8]) -> Result<()> {
        match self.network.route(self.addr, target, data) {
            Ok(()) => {
                self.stats.record_sent();
                Ok(())
            }
            Err(e) => {
                self.stats.record_send_error();
                Err(e)
            }
        }
    }

    async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr)> {
        match self.inbox.lock().await.recv().await {
            Some(datagram) => {
                self.stats.record_received();
                Ok(datagram)
            }
            None => {
                self.stats.record_receive_error();
                Err(crate::transport_error!("Network closed"))
            }
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn stats(&self) -> FrozenTransportStats {
        self.stats.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GossipKvError;
    use tokio::time::{timeout, Duration};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_deliver() {
        let network = MemoryNetwork::new();
        let a = network.bind(addr(1)).unwrap();
        let b = network.bind(addr(2)).unwrap();

        a.send_to(addr(2), b"ping").await.unwrap();
        let (data, from) = b.recv_from().await.unwrap();
        assert_eq!(data, b"ping");
        assert_eq!(from, addr(1));
    }

    #[tokio::test]
    async fn test_bind_twice_fails() {
        let network = MemoryNetwork::new();
        let _a = network.bind(addr(1)).unwrap();
        assert!(network.bind(addr(1)).is_err());
    }

    #[tokio::test]
    async fn test_double_bind_is_a_transport_error() {
        let network = MemoryNetwork::new();
        let _first = network.bind(addr(1)).unwrap();
        let err = network.bind(addr(1)).unwrap_err();
        assert_eq!(err.error_type(), "transport_error");
        assert!(err.to_string().contains("Address already in use"));
    }

    #[tokio::test]
    async fn test_rebind_after_drop() {
        let network = MemoryNetwork::new();
        drop(network.bind(addr(1)).unwrap());
        assert!(network.bind(addr(1)).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_a_send_error() {
        let network = MemoryNetwork::new();
        let a = network.bind(addr(1)).unwrap();
        let result = a.send_to(addr(9), b"ping").await;
        assert!(matches!(result, Err(GossipKvError::Transport(_))));
        assert_eq!(a.stats().send_errors, 1);
    }

    #[tokio::test]
    async fn test_full_loss_drops_silently() {
        let network = MemoryNetwork::lossy(1.0);
        let a = network.bind(addr(1)).unwrap();
        let b = network.bind(addr(2)).unwrap();

        a.send_to(addr(2), b"lost").await.unwrap();
        assert_eq!(a.stats().messages_sent, 1);
        assert!(timeout(Duration::from_millis(50), b.recv_from()).await.is_err());
    }

    #[tokio::test]
    async fn test_isolate_and_heal() {
        let network = MemoryNetwork::new();
        let a = network.bind(addr(1)).unwrap();
        let b = network.bind(addr(2)).unwrap();

        network.isolate(addr(2));
        a.send_to(addr(2), b"first").await.unwrap();
        network.heal(addr(2));
        a.send_to(addr(2), b"second").await.unwrap();

        let (data, _) = b.recv_from().await.unwrap();
        assert_eq!(data, b"second");
    }
}

//! UDP Transport
//!
//! A single tokio `UdpSocket` used for both sending and receiving.
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::stats::{FrozenTransportStats, TransportStats};
use super::traits::Transport;
use crate::error::{GossipKvError, Result};

/// Large enough for any UDP payload, so datagrams are never truncated
pub const RECV_BUFFER_SIZE: usize = 65536;

#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    // only the receive loop reads; the lock just lets us reuse one buffer
    recv_buf: Mutex<Vec<u8>>,
    stats: Arc<TransportStats>,
}

impl UdpTransport {
    /// Bind a socket at `bind_addr`. Failure here is fatal for the node.
    pub async fn bind(bind_addr: SocketAddr, allow_broadcast: bool) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| crate::transport_error!("Failed to bind {}: {}", bind_addr, e))?;
        if allow_broadcast {
            socket.set_broadcast(true)?;
        }
        let local_addr = socket.local_addr()?;
        info!("UDP transport listening on {}", local_addr);

        Ok(Self {
            socket,
            local_addr,
            recv_buf: Mutex::new(vec![0u8; RECV_BUFFER_SIZE]),
            stats: Arc::new(TransportStats::default()),
        })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&self, target: SocketAddr, data: &[u8]) -> Result<()> {
        match self.socket.send_to(data, target).await {
            Ok(_write_size) => {
                self.stats.record_sent();
                Ok(())
            }
            Err(e) => {
                self.stats.record_send_error();
                debug!("[{}] Failed to send UDP data: {}", target, e);
                Err(GossipKvError::Io(e))
            }
        }
    }

    async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr)> {
        let mut buf = self.recv_buf.lock().await;
        match self.socket.recv_from(&mut buf[..]).await {
            Ok((len, addr)) => {
                self.stats.record_received();
                Ok((buf[..len].to_vec(), addr))
            }
            Err(e) => {
                self.stats.record_receive_error();
                Err(GossipKvError::Io(e))
            }
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn stats(&self) -> FrozenTransportStats {
        self.stats.freeze()
    }
}

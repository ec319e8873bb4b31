//! Transport trait for connectionless, best-effort messaging
//!
//! A transport is one endpoint bound to a node's address. Sends are
//! fire-and-forget: `Ok` only means the datagram was handed off, never that
//! it arrived. Received datagrams are raw bytes and may be anything.

use std::net::SocketAddr;

use async_trait::async_trait;

use super::stats::FrozenTransportStats;
use crate::error::Result;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send one datagram to `target`
    async fn send_to(&self, target: SocketAddr, data: &[u8]) -> Result<()>;

    /// Wait for the next datagram
    async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr)>;

    /// Address this endpoint is bound to
    fn local_addr(&self) -> SocketAddr;

    /// Transport statistics for monitoring
    fn stats(&self) -> FrozenTransportStats;
}

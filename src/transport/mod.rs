//! Transport Module
//!
//! Connectionless, best-effort datagram endpoints. `UdpTransport` is the
//! real network; `MemoryTransport` is an in-process stand-in with
//! configurable loss for tests and simulations.

pub mod memory;
pub mod stats;
pub mod traits;
pub mod udp;

pub use memory::{MemoryNetwork, MemoryTransport};
pub use stats::{FrozenTransportStats, TransportStats};
pub use traits::Transport;
pub use udp::UdpTransport;

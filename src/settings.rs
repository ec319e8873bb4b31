//! gossipkv node settings
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::Result;
use crate::node::NodeName;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const STANDARD_PORT_UDP: u16 = 5001;
pub const DEFAULT_PORT_UDP: &str = "5001";
pub const DEFAULT_GOSSIP_FANOUT: usize = 2;
pub const DEFAULT_REGOSSIP_PROBABILITY: f64 = 0.5;
pub const DEFAULT_ANTI_ENTROPY_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_REGOSSIP_WORKERS: usize = 2;
pub const DEFAULT_REGOSSIP_QUEUE_SIZE: usize = 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    // Unique name of this node; used as `origin` / `node_id` on the wire
    pub node_name: NodeName,

    // Address the UDP socket binds to
    pub listen_address: String,

    // UDP listen port for gossip
    pub listen_port_udp: u16,

    // Static, ordered peer set
    pub topology: Vec<SocketAddr>,

    // Gossip configuration
    pub gossip_fanout: usize,        // Peers per propagation (default: 2)
    pub regossip_probability: f64,   // Chance to forward an applied update (default: 0.5)
    pub anti_entropy_interval_ms: u64, // Full-store sync period (default: 10000)

    // Re-gossip worker pool
    pub regossip_workers: usize,
    pub regossip_queue_size: usize,

    // Set SO_BROADCAST so broadcast addresses can be used as peers
    pub allow_broadcast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_name: NodeName::from("node"),
            listen_address: "0.0.0.0".to_string(),
            listen_port_udp: STANDARD_PORT_UDP,
            topology: Vec::new(),
            gossip_fanout: DEFAULT_GOSSIP_FANOUT,
            regossip_probability: DEFAULT_REGOSSIP_PROBABILITY,
            anti_entropy_interval_ms: DEFAULT_ANTI_ENTROPY_INTERVAL_MS,
            regossip_workers: DEFAULT_REGOSSIP_WORKERS,
            regossip_queue_size: DEFAULT_REGOSSIP_QUEUE_SIZE,
            allow_broadcast: false,
        }
    }
}

impl Settings {
    /// Socket address the node's transport binds to
    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.listen_address.parse().map_err(|e| {
            crate::config_error!("Invalid listen address {}: {}", self.listen_address, e)
        })?;
        Ok(SocketAddr::new(ip, self.listen_port_udp))
    }

    pub fn anti_entropy_interval(&self) -> Duration {
        Duration::from_millis(self.anti_entropy_interval_ms)
    }

    /// Reject settings the gossip machinery cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.node_name.as_str().is_empty() {
            return Err(crate::config_error!("node name must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.regossip_probability) {
            return Err(crate::config_error!(
                "re-gossip probability {} is outside [0, 1]",
                self.regossip_probability
            ));
        }
        if self.anti_entropy_interval_ms == 0 {
            return Err(crate::config_error!("anti-entropy interval must be positive"));
        }
        if self.regossip_workers == 0 || self.regossip_queue_size == 0 {
            return Err(crate::config_error!(
                "re-gossip pool needs at least one worker and one queue slot"
            ));
        }
        self.listen_socket_addr()?;
        Ok(())
    }
}

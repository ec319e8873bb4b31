//! CLI for this application
//!
use std::net::SocketAddr;

use crate::node::NodeName;
use crate::settings::{self, Settings};
use crate::store::Value;

pub use crate::settings::{APP_NAME, APP_VERSION};

#[derive(Clone, Debug, clap::Parser)]
#[command(name = APP_NAME, version = APP_VERSION, about = "Gossip-replicated key-value store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Run one node until interrupted
    Run(NodeArgs),
    /// Start three local nodes, write on one and read from the others
    Demo {
        #[clap(long, default_value = settings::DEFAULT_PORT_UDP, help = "First of three consecutive UDP ports")]
        base_port: u16,

        #[clap(long, default_value = "3000", help = "Milliseconds to wait for replication")]
        wait_ms: u64,
    },
}

#[derive(Clone, Debug, clap::Args)]
pub struct NodeArgs {
    // Unique node name
    #[clap(long, env("GOSSIPKV_NODE_NAME"), help = "Unique name of this node")]
    pub node_name: String,

    // Server listen address
    #[clap(
        long,
        default_value = "0.0.0.0",
        env("GOSSIPKV_LISTEN_ADDRESS"),
        help = "IP Address to listen on"
    )]
    pub listen_address: String,

    // UDP listen port for gossip
    #[clap(
        long,
        default_value = settings::DEFAULT_PORT_UDP,
        env("GOSSIPKV_UDP_LISTEN_PORT"),
        help = "Port to bind the gossip UDP socket to"
    )]
    pub listen_port_udp: u16,

    // Cluster configuration information: topology
    #[clap(
        long,
        env("GOSSIPKV_TOPOLOGY"),
        value_delimiter = ',',
        help = "Peer UDP addresses (e.g., 10.0.0.2:5001,10.0.0.3:5001)"
    )]
    pub topology: Vec<SocketAddr>,

    #[clap(
        long,
        default_value_t = settings::DEFAULT_GOSSIP_FANOUT,
        env("GOSSIPKV_GOSSIP_FANOUT"),
        help = "Peers each update is gossiped to"
    )]
    pub gossip_fanout: usize,

    #[clap(
        long,
        default_value_t = settings::DEFAULT_REGOSSIP_PROBABILITY,
        env("GOSSIPKV_REGOSSIP_PROBABILITY"),
        help = "Probability of forwarding a newly applied remote update"
    )]
    pub regossip_probability: f64,

    #[clap(
        long,
        default_value_t = settings::DEFAULT_ANTI_ENTROPY_INTERVAL_MS,
        env("GOSSIPKV_ANTI_ENTROPY_INTERVAL_MS"),
        help = "Milliseconds between full-store syncs"
    )]
    pub anti_entropy_interval_ms: u64,

    #[clap(
        long,
        default_value_t = settings::DEFAULT_REGOSSIP_WORKERS,
        env("GOSSIPKV_REGOSSIP_WORKERS"),
        help = "Workers forwarding re-gossiped updates"
    )]
    pub regossip_workers: usize,

    #[clap(
        long,
        default_value_t = settings::DEFAULT_REGOSSIP_QUEUE_SIZE,
        env("GOSSIPKV_REGOSSIP_QUEUE_SIZE"),
        help = "Pending re-gossips kept before new ones are dropped"
    )]
    pub regossip_queue_size: usize,

    #[clap(long, env("GOSSIPKV_ALLOW_BROADCAST"), help = "Allow broadcast peer addresses")]
    pub allow_broadcast: bool,

    #[clap(long = "put", value_parser = parse_put, help = "key=value to write after start (repeatable)")]
    pub puts: Vec<(String, Value)>,
}

impl NodeArgs {
    pub fn into_settings(self) -> Settings {
        Settings {
            node_name: NodeName::from(self.node_name),
            listen_address: self.listen_address,
            listen_port_udp: self.listen_port_udp,
            topology: self.topology,
            gossip_fanout: self.gossip_fanout,
            regossip_probability: self.regossip_probability,
            anti_entropy_interval_ms: self.anti_entropy_interval_ms,
            regossip_workers: self.regossip_workers,
            regossip_queue_size: self.regossip_queue_size,
            allow_broadcast: self.allow_broadcast,
        }
    }
}

/// Parse `key=value`; the value is read as a JSON scalar when possible
pub fn parse_put(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    let value = value
        .parse::<Value>()
        .map_err(|e| format!("invalid value in '{}': {}", s, e))?;
    Ok((key.to_string(), value))
}

/// Consecutive localhost addresses for the `demo` nodes, starting at `base_port`
pub fn demo_addrs(base_port: u16, count: usize) -> crate::error::Result<Vec<SocketAddr>> {
    (0..count)
        .map(|i| {
            u16::try_from(i)
                .ok()
                .and_then(|i| base_port.checked_add(i))
                .map(|port| SocketAddr::from(([127, 0, 0, 1], port)))
                .ok_or_else(|| {
                    crate::config_error!(
                        "base port {} leaves no room for {} nodes",
                        base_port,
                        count
                    )
                })
        })
        .collect()
}

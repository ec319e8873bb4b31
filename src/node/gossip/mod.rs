//! Gossip replication
//!
//! A node keeps a full replica of the store and spreads writes in two ways:
//! rumor-style gossip of single updates to a small random fan-out, and
//! periodic anti-entropy pushing the whole store to one random peer. Both
//! feed the same last-write-wins merge on the receiving side.
pub mod anti_entropy;
pub mod controller;
pub mod disseminator;
pub mod gossip_node;
pub mod messages;
pub mod stats;

pub use anti_entropy::AntiEntropy;
pub use controller::{Dispatch, GossipController};
pub use disseminator::{Disseminator, RegossipJob, RegossipQueue};
pub use gossip_node::{GossipNode, NodeStats};
pub use messages::{GossipMessage, MAX_DATAGRAM_SIZE};
pub use stats::{FrozenGossipStats, GossipStats};

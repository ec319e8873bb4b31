pub mod gossip;
pub mod node_id;
pub mod peer_set;

pub use gossip::GossipNode;
pub use node_id::NodeName;
pub use peer_set::PeerSet;

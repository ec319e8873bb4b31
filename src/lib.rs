//! gossipkv: an eventually-consistent, memory-resident key-value store
//! replicated across a static set of nodes over UDP.
pub mod cli;
pub mod error;
pub mod node;
pub mod settings;
pub mod store;
pub mod transport;

pub use error::{DecodeError, GossipKvError, Result};
pub use node::{GossipNode, NodeName};
pub use store::{Entry, Value};

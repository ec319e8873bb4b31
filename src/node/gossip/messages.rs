//! Gossip Message Protocol
//!
//! Two message kinds travel between nodes, one per datagram, encoded as JSON
//! objects tagged by a `type` field:
//!
//! - `update`: one key's entry, pushed by gossip
//! - `sync`: a node's whole store, pushed by anti-entropy
//!
//! Decoding never panics; anything malformed comes back as a [`DecodeError`].
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};
use crate::node::NodeName;
use crate::store::{is_valid_timestamp, Entry, Value};

/// Largest payload that fits in a single UDP datagram over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GossipMessage {
    /// A single key's entry plus the node that sent it
    Update {
        key: String,
        value: Value,
        timestamp: f64,
        origin: NodeName,
    },

    /// Full-store exchange used by anti-entropy
    Sync {
        store: HashMap<String, Entry>,
        node_id: NodeName,
    },
}

impl GossipMessage {
    /// Name of the node that sent this message
    pub fn sender(&self) -> &NodeName {
        match self {
            GossipMessage::Update { origin, .. } => origin,
            GossipMessage::Sync { node_id, .. } => node_id,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn deserialize(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        if data.len() > MAX_DATAGRAM_SIZE {
            return Err(DecodeError::Oversized {
                len: data.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        let message: GossipMessage = serde_json::from_slice(data)?;
        message.validate()?;
        Ok(message)
    }

    fn validate(&self) -> std::result::Result<(), DecodeError> {
        match self {
            GossipMessage::Update { timestamp, .. } => check_timestamp(*timestamp),
            GossipMessage::Sync { store, .. } => store
                .values()
                .try_for_each(|entry| check_timestamp(entry.timestamp)),
        }
    }
}

fn check_timestamp(ts: f64) -> std::result::Result<(), DecodeError> {
    if is_valid_timestamp(ts) {
        Ok(())
    } else {
        Err(DecodeError::InvalidTimestamp(ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_wire_format() {
        let message = GossipMessage::Update {
            key: "temperature".to_string(),
            value: Value::Float(25.5),
            timestamp: 1700000000.5,
            origin: NodeName::from("A"),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&message.serialize().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "update",
                "key": "temperature",
                "value": 25.5,
                "timestamp": 1700000000.5,
                "origin": "A"
            })
        );
    }

    #[test]
    fn test_sync_wire_format() {
        let mut store = HashMap::new();
        store.insert("x".to_string(), Entry::new(Value::Int(1), 3.0));
        let message = GossipMessage::Sync {
            store,
            node_id: NodeName::from("B"),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&message.serialize().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "sync",
                "store": { "x": { "value": 1, "timestamp": 3.0 } },
                "node_id": "B"
            })
        );
    }

    #[test]
    fn test_decode_foreign_update() {
        let raw = br#"{"type":"update","key":"k","value":"v","timestamp":12.25,"origin":"C"}"#;
        let message = GossipMessage::deserialize(raw).unwrap();
        assert_eq!(
            message,
            GossipMessage::Update {
                key: "k".to_string(),
                value: Value::from("v"),
                timestamp: 12.25,
                origin: NodeName::from("C"),
            }
        );
        assert_eq!(message.sender(), &NodeName::from("C"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            GossipMessage::deserialize(b"\x00\xffnot json"),
            Err(DecodeError::Json(_))
        ));
        assert!(GossipMessage::deserialize(b"").is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let raw = br#"{"type":"delete","key":"k"}"#;
        assert!(matches!(
            GossipMessage::deserialize(raw),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let raw = br#"{"type":"update","key":"k","value":1,"origin":"A"}"#;
        assert!(GossipMessage::deserialize(raw).is_err());
        let raw = br#"{"type":"sync","node_id":"A"}"#;
        assert!(GossipMessage::deserialize(raw).is_err());
        let raw = br#"{"key":"k","value":1,"timestamp":1.0,"origin":"A"}"#;
        assert!(GossipMessage::deserialize(raw).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_field_types() {
        let raw = br#"{"type":"update","key":7,"value":1,"timestamp":1.0,"origin":"A"}"#;
        assert!(GossipMessage::deserialize(raw).is_err());
        let raw = br#"{"type":"update","key":"k","value":{"nested":true},"timestamp":1.0,"origin":"A"}"#;
        assert!(GossipMessage::deserialize(raw).is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_range_timestamp() {
        let raw = br#"{"type":"update","key":"k","value":1,"timestamp":1.7976931348623157e308,"origin":"A"}"#;
        assert!(matches!(
            GossipMessage::deserialize(raw),
            Err(DecodeError::InvalidTimestamp(_))
        ));
        let raw = br#"{"type":"sync","store":{"k":{"value":1,"timestamp":1e300}},"node_id":"A"}"#;
        assert!(matches!(
            GossipMessage::deserialize(raw),
            Err(DecodeError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized() {
        let data = vec![b' '; MAX_DATAGRAM_SIZE + 1];
        assert!(matches!(
            GossipMessage::deserialize(&data),
            Err(DecodeError::Oversized { .. })
        ));
    }

    #[test]
    fn test_update_of_one_kilobyte_fits() {
        let message = GossipMessage::Update {
            key: "k".repeat(100),
            value: Value::Text("v".repeat(1024)),
            timestamp: 1.0,
            origin: NodeName::from("A"),
        };
        let data = message.serialize().unwrap();
        assert!(data.len() < MAX_DATAGRAM_SIZE);
        assert_eq!(GossipMessage::deserialize(&data).unwrap(), message);
    }
}

//! Convergence under loss and partition on the in-process network
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use gossipkv::node::NodeName;
use gossipkv::settings::Settings;
use gossipkv::transport::MemoryNetwork;
use gossipkv::{Entry, GossipNode, Value};
use tokio::time::{sleep, Duration, Instant};

fn addr(i: usize) -> SocketAddr {
    format!("10.0.0.{}:5001", i + 1).parse().unwrap()
}

/// Ring of `size` nodes, each knowing only its two neighbours
fn ring(network: &MemoryNetwork, size: usize, anti_entropy_interval_ms: u64) -> Vec<GossipNode> {
    (0..size)
        .map(|i| {
            let settings = Settings {
                node_name: NodeName::from(format!("node-{}", i)),
                topology: vec![addr((i + 1) % size), addr((i + size - 1) % size)],
                anti_entropy_interval_ms,
                ..Default::default()
            };
            let transport = network.bind(addr(i)).unwrap();
            GossipNode::with_transport(settings, Arc::new(transport)).unwrap()
        })
        .collect()
}

async fn wait_for_agreement(nodes: &[GossipNode], keys: usize, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    loop {
        let first: HashMap<String, Entry> = nodes[0].snapshot();
        if first.len() == keys && nodes.iter().all(|n| n.snapshot() == first) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_lossy_ring_converges() {
    let network = MemoryNetwork::lossy(0.3);
    let nodes = ring(&network, 5, 30);
    for node in &nodes {
        node.start().unwrap();
    }

    for i in 0..20 {
        let writer = &nodes[i % nodes.len()];
        writer.put(&format!("key-{}", i), i as i64).await;
    }

    assert!(wait_for_agreement(&nodes, 20, Duration::from_secs(10)).await);
    for node in &nodes {
        assert_eq!(node.get("key-7"), Some(Value::Int(7)));
    }
}

#[tokio::test]
async fn test_total_loss_then_recovery() {
    let network = MemoryNetwork::lossy(1.0);
    let nodes = ring(&network, 3, 30);
    for node in &nodes {
        node.start().unwrap();
    }

    nodes[0].put("x", "only here").await;
    sleep(Duration::from_millis(100)).await;
    assert!(nodes[1].get("x").is_none());
    assert!(nodes[2].get("x").is_none());

    network.set_drop_rate(0.0);
    assert!(wait_for_agreement(&nodes, 1, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_partitioned_writer_wins_after_heal() {
    let network = MemoryNetwork::new();
    let nodes = ring(&network, 3, 30);
    for node in &nodes {
        node.start().unwrap();
    }

    nodes[0].put("x", 1).await;
    assert!(wait_for_agreement(&nodes, 1, Duration::from_secs(5)).await);

    // B writes a newer value while cut off from everyone
    network.isolate(addr(1));
    sleep(Duration::from_millis(10)).await;
    let ts = nodes[1].put("x", 2).await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(nodes[0].get("x"), Some(Value::Int(1)));
    assert_eq!(nodes[2].get("x"), Some(Value::Int(1)));

    network.heal(addr(1));
    assert!(wait_for_agreement(&nodes, 1, Duration::from_secs(5)).await);
    for node in &nodes {
        assert_eq!(node.get_entry("x"), Some(Entry::new(Value::Int(2), ts)));
    }
}

#[tokio::test]
async fn test_stale_partitioned_write_loses() {
    let network = MemoryNetwork::new();
    let nodes = ring(&network, 3, 30);
    for node in &nodes {
        node.start().unwrap();
    }

    network.isolate(addr(2));
    nodes[2].put("x", "old").await;
    sleep(Duration::from_millis(10)).await;
    let ts = nodes[0].put("x", "new").await;

    network.heal(addr(2));
    assert!(wait_for_agreement(&nodes, 1, Duration::from_secs(5)).await);
    for node in &nodes {
        assert_eq!(node.get_entry("x"), Some(Entry::new(Value::from("new"), ts)));
    }
}

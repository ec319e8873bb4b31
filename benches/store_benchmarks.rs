use gossipkv::node::gossip::anti_entropy::encode_sync_chunks;
use gossipkv::node::gossip::GossipMessage;
use gossipkv::node::NodeName;
use gossipkv::store::ReplicaStore;
use gossipkv::Value;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn benchmark_store_local_write(c: &mut Criterion) {
    let store = ReplicaStore::new();

    c.bench_function("store_local_write", |b| {
        let mut counter = 0;
        b.iter(|| {
            counter += 1;
            let key = format!("key_{}", counter % 1000);
            black_box(store.write(&key, Value::Int(counter)))
        })
    });
}

fn benchmark_store_merge(c: &mut Criterion) {
    let store = ReplicaStore::new();

    c.bench_function("store_merge", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            let key = format!("key_{}", counter % 1000);
            // every other merge is stale
            let ts = (counter / 2) as f64;
            black_box(store.merge(&key, Value::from("remote"), ts))
        })
    });
}

fn benchmark_update_codec(c: &mut Criterion) {
    let message = GossipMessage::Update {
        key: "temperature".to_string(),
        value: Value::Float(25.5),
        timestamp: 1_700_000_000.25,
        origin: NodeName::from("A"),
    };
    let encoded = message.serialize().unwrap();

    c.bench_function("update_encode", |b| {
        b.iter(|| black_box(message.serialize().unwrap()))
    });
    c.bench_function("update_decode", |b| {
        b.iter(|| black_box(GossipMessage::deserialize(&encoded).unwrap()))
    });
}

fn benchmark_sync_chunking(c: &mut Criterion) {
    let store = ReplicaStore::new();
    for i in 0..5000 {
        store.write(&format!("key_{}", i), Value::from(format!("value_{}", i)));
    }
    let node_name = NodeName::from("A");

    c.bench_function("sync_chunk_5000_entries", |b| {
        b.iter(|| black_box(encode_sync_chunks(&node_name, store.snapshot()).unwrap()))
    });
}

criterion_group!(
    benches,
    benchmark_store_local_write,
    benchmark_store_merge,
    benchmark_update_codec,
    benchmark_sync_chunking
);
criterion_main!(benches);

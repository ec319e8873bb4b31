use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gossipkv::cli::{self, Command};
use gossipkv::settings::Settings;
use gossipkv::{GossipNode, NodeName};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gossipkv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse args and env vars
    let args = cli::Cli::parse();
    match args.command {
        Command::Run(node_args) => run(node_args).await,
        Command::Demo { base_port, wait_ms } => {
            demo(base_port, Duration::from_millis(wait_ms)).await
        }
    }
}

async fn run(node_args: cli::NodeArgs) -> anyhow::Result<()> {
    let puts = node_args.puts.clone();
    let node = GossipNode::new(node_args.into_settings()).await?;
    node.start()?;

    for (key, value) in puts {
        node.put(&key, value).await;
    }

    tokio::signal::ctrl_c().await?;
    info!(
        "[{}] Shutting down with {} keys",
        node.node_name(),
        node.len()
    );
    Ok(())
}

/// Three nodes on consecutive local ports; A writes, B and C read.
async fn demo(base_port: u16, wait: Duration) -> anyhow::Result<()> {
    let names = ["A", "B", "C"];
    let addrs = cli::demo_addrs(base_port, names.len())?;

    let mut nodes = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let settings = Settings {
            node_name: NodeName::from(*name),
            listen_address: "127.0.0.1".to_string(),
            listen_port_udp: addrs[i].port(),
            topology: addrs
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, a)| *a)
                .collect(),
            ..Default::default()
        };
        let node = GossipNode::new(settings).await?;
        node.start()?;
        nodes.push(node);
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    nodes[0].put("temperature", 25.5).await;
    tokio::time::sleep(wait).await;
    for node in &nodes[1..] {
        node.get("temperature");
    }
    Ok(())
}

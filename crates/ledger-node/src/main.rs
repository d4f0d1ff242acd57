use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use ledger_core::PeerId;
use ledger_network::{HttpPeerClient, ReputationTracker, StaticPeerDirectory};
use ledger_node::{Config, NodeService};
use ledger_storage::{LocalSnapshotFileStore, SnapshotDownloader, SnapshotStoreError};
use tracing::info;

#[derive(Parser)]
#[clap(name = "ledger-node")]
#[clap(author, version, about = "Coordination node for a distributed ledger cluster", long_about = None)]
struct Cli {
    #[clap(short, long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node
    Start,
    /// Write a default configuration file
    Init {
        #[clap(short, long, default_value = "config.toml")]
        output: String,
    },
    /// Print version information
    Version,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { output }) => init_config(&output)?,
        Some(Commands::Version) => show_version(),
        Some(Commands::Start) | None => start_node(&cli.config).await?,
    }

    Ok(())
}

fn init_config(output: &str) -> Result<()> {
    let config = Config::default();
    config.to_file(output)?;
    println!("configuration written to {output}");
    Ok(())
}

fn show_version() {
    println!("ledger-node {}", env!("CARGO_PKG_VERSION"));
}

async fn start_node(config_path: &str) -> Result<()> {
    let config = if std::path::Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        info!("configuration file not found, using defaults");
        Config::default()
    };
    config.validate()?;

    init_logging(&config.logging.level);
    print_banner();

    let peers: Vec<(PeerId, String)> = config
        .network
        .peers
        .iter()
        .enumerate()
        .map(|(i, addr)| (format!("peer-{i}"), addr.clone()))
        .collect();
    let peer_directory = Arc::new(StaticPeerDirectory::new(peers));
    let reputation = Arc::new(ReputationTracker::new());
    let peer_client = Arc::new(HttpPeerClient::new(peer_directory.clone(), reputation));

    let snapshot_dir = config.node.data_dir.join("snapshots");
    std::fs::create_dir_all(&snapshot_dir)?;
    let file_store = Arc::new(LocalSnapshotFileStore::new(snapshot_dir, Arc::new(UnimplementedDownloader)));

    let mut service = NodeService::new(config, peer_client, peer_directory, file_store)?;
    service.start()?;
    service.wait_for_shutdown().await?;

    Ok(())
}

/// The actual snapshot transfer wire protocol is out of scope here; a real
/// deployment supplies its own `SnapshotDownloader`.
struct UnimplementedDownloader;

#[async_trait]
impl SnapshotDownloader for UnimplementedDownloader {
    async fn download(&self, hash: &ledger_core::Hash, peers: &[PeerId]) -> Result<Vec<u8>, SnapshotStoreError> {
        let _ = (hash, peers);
        Err(SnapshotStoreError::NoPeerAvailable(peers.to_vec()))
    }
}

fn init_logging(level: &str) {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}

fn print_banner() {
    println!();
    println!("╔══════════════════════════════════════════╗");
    println!("║   ledger-node v{}                    ║", env!("CARGO_PKG_VERSION"));
    println!("║   snapshot consensus coordination node    ║");
    println!("╚══════════════════════════════════════════╝");
    println!();
}

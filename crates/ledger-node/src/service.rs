use std::sync::Arc;

use anyhow::Result;
use ledger_core::{NodeState, SnapshotCreated};
use ledger_network::PeerClient;
use ledger_network::PeerDirectory;
use ledger_storage::SnapshotFileStore;
use ledger_store::ConsensusLifecycleStore;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::broadcast::BroadcastVerifyLoop;
use crate::cluster_check_gate::ClusterCheckGate;
use crate::config::Config;
use crate::health::HealthMonitor;
use crate::health_check::HealthCheckLoop;
use crate::ledger_item::LedgerItem;
use crate::metrics::NodeMetrics;
use crate::node_state_service::NodeStateService;
use crate::recent_snapshots::RecentSnapshotsHandle;
use crate::redownload::RedownloadDriver;

/// Wires the coordination components together and runs them for the
/// lifetime of the process: a cluster-check loop, a broadcast/verify loop,
/// a standalone recent-snapshots verification loop, and the single-flight
/// redownload driver all three feed into through a shared `ClusterCheckGate`.
pub struct NodeService {
    config: Config,
    lifecycle_store: Arc<ConsensusLifecycleStore<LedgerItem>>,
    node_state: Arc<NodeStateService>,
    metrics: Arc<NodeMetrics>,
    health_monitor: Arc<HealthMonitor>,
    health_check_loop: Arc<HealthCheckLoop>,
    broadcast_loop: Arc<BroadcastVerifyLoop>,
    redownload_driver: Arc<RedownloadDriver>,
    recent_snapshots: Arc<RecentSnapshotsHandle>,
    latest_created: Arc<RwLock<Option<SnapshotCreated>>>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<Result<()>>>,
}

impl NodeService {
    pub fn new(
        config: Config,
        peer_client: Arc<dyn PeerClient>,
        peer_directory: Arc<dyn PeerDirectory>,
        file_store: Arc<dyn SnapshotFileStore>,
    ) -> Result<Self> {
        info!("initializing node: {}", config.node.name);
        config.validate()?;
        std::fs::create_dir_all(&config.node.data_dir)?;

        let node_state = Arc::new(NodeStateService::new(NodeState::Starting));
        let lifecycle_store = Arc::new(ConsensusLifecycleStore::new(&config.processing));
        let metrics = Arc::new(NodeMetrics::default());
        let health_monitor = Arc::new(HealthMonitor::default());
        let recent_snapshots = Arc::new(RecentSnapshotsHandle::new(Vec::new()));
        let gate = Arc::new(ClusterCheckGate::default());

        let health_check_loop = Arc::new(HealthCheckLoop::new(
            peer_client.clone(),
            peer_directory.clone(),
            node_state.clone(),
            config.processing.clone(),
        ));
        let redownload_driver = Arc::new(RedownloadDriver::new(
            gate.clone(),
            node_state.clone(),
            file_store,
            metrics.clone(),
        ));
        let broadcast_loop = Arc::new(BroadcastVerifyLoop::new(
            peer_client,
            peer_directory,
            node_state.clone(),
            recent_snapshots.clone(),
            redownload_driver.clone(),
            gate,
            config.processing.clone(),
        ));

        let (shutdown_tx, _) = broadcast::channel(16);

        Ok(Self {
            config,
            lifecycle_store,
            node_state,
            metrics,
            health_monitor,
            health_check_loop,
            broadcast_loop,
            redownload_driver,
            recent_snapshots,
            latest_created: Arc::new(RwLock::new(None)),
            shutdown_tx,
            tasks: Vec::new(),
        })
    }

    /// Records a snapshot the node has created locally and prepends it to
    /// `recentSnapshots` (I4), making it available to the broadcast loop's
    /// next round. Snapshot creation itself lives outside this crate.
    pub fn announce_snapshot(&self, created: SnapshotCreated) {
        let cap = self.config.processing.recent_snapshot_number;
        self.recent_snapshots
            .prepend_and_truncate(ledger_core::RecentSnapshot::new(created.hash.clone(), created.height), cap);
        *self.latest_created.write() = Some(created);
    }

    pub fn start(&mut self) -> Result<()> {
        info!("starting node services");
        self.node_state.set(NodeState::Ready);
        self.health_monitor.update_node_state("ready");

        self.tasks.push(self.spawn_cluster_check_loop());
        self.tasks.push(self.spawn_broadcast_loop());
        self.tasks.push(self.spawn_verify_recent_snapshots_loop());

        info!("all services started");
        Ok(())
    }

    fn spawn_cluster_check_loop(&self) -> JoinHandle<Result<()>> {
        let interval_secs = self.config.node.cluster_check_interval_secs;
        let health_check_loop = self.health_check_loop.clone();
        let redownload_driver = self.redownload_driver.clone();
        let health_monitor = self.health_monitor.clone();
        let metrics = self.metrics.clone();
        let lifecycle_store = self.lifecycle_store.clone();
        let processing_config = self.config.processing.clone();
        let recent_snapshots = self.recent_snapshots.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let own = recent_snapshots.get();
                        metrics.record_cluster_check();
                        metrics.refresh_from_store(&lifecycle_store, &processing_config);
                        match health_check_loop.run_cluster_check(&own).await {
                            Some(diff) => {
                                health_monitor.record_cluster_check(true);
                                match redownload_driver.try_run_episode(&diff).await {
                                    Ok(true) => health_monitor.record_redownload_result(true),
                                    Ok(false) => info!("redownload episode already in progress, skipping"),
                                    Err(err) => {
                                        health_monitor.record_redownload_result(false);
                                        warn!(%err, "redownload episode failed");
                                    }
                                }
                            }
                            None => health_monitor.record_cluster_check(true),
                        }
                    }
                    _ = shutdown.recv() => {
                        info!("cluster check loop shutting down");
                        break;
                    }
                }
            }
            Ok(())
        })
    }

    fn spawn_broadcast_loop(&self) -> JoinHandle<Result<()>> {
        let interval_secs = self.config.node.broadcast_interval_secs;
        let broadcast_loop = self.broadcast_loop.clone();
        let latest_created = self.latest_created.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let created = latest_created.read().clone();
                        if let Some(created) = created {
                            let verifications = broadcast_loop.broadcast_snapshot(&created).await;
                            if broadcast_loop.should_run_cluster_check(&verifications) {
                                info!("invalid snapshot rate exceeded threshold, next cluster check is due early");
                            }
                        }
                    }
                    _ = shutdown.recv() => {
                        info!("broadcast loop shutting down");
                        break;
                    }
                }
            }
            Ok(())
        })
    }

    fn spawn_verify_recent_snapshots_loop(&self) -> JoinHandle<Result<()>> {
        let interval_secs = self.config.node.recent_snapshots_verify_interval_secs;
        let broadcast_loop = self.broadcast_loop.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = broadcast_loop.verify_recent_snapshots().await {
                            warn!(%err, "recent snapshot verification failed");
                        }
                    }
                    _ = shutdown.recv() => {
                        info!("recent snapshot verification loop shutting down");
                        break;
                    }
                }
            }
            Ok(())
        })
    }

    pub async fn wait_for_shutdown(&mut self) -> Result<()> {
        info!("node running, press ctrl+c to stop");
        tokio::signal::ctrl_c().await?;
        info!("received shutdown signal");
        self.shutdown().await
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        info!("shutting down node services");
        self.node_state.set(NodeState::Stopping);
        let _ = self.shutdown_tx.send(());

        for task in self.tasks.drain(..) {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("task error during shutdown: {err}"),
                Err(err) => error!("task panicked during shutdown: {err}"),
            }
        }

        info!("shutdown complete");
        Ok(())
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    pub fn health_monitor(&self) -> &Arc<HealthMonitor> {
        &self.health_monitor
    }

    pub fn lifecycle_store(&self) -> &Arc<ConsensusLifecycleStore<LedgerItem>> {
        &self.lifecycle_store
    }
}

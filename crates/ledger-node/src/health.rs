use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A point-in-time snapshot of node health, independent of the consensus
/// lifecycle counts exported via `NodeMetrics` — this is for an operator
/// glancing at a dashboard, not for Prometheus scraping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub node_state: String,
    pub seconds_since_last_cluster_check: Option<u64>,
    pub consecutive_redownload_errors: u32,
    pub issues: Vec<HealthIssue>,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HealthIssue {
    ClusterCheckStale { seconds: u64 },
    RedownloadErrorStreak { count: u32 },
    NoPeerResponded,
}

impl HealthIssue {
    pub fn severity(&self) -> u8 {
        match self {
            Self::ClusterCheckStale { seconds } => {
                if *seconds > 600 {
                    9
                } else if *seconds > 120 {
                    6
                } else {
                    3
                }
            }
            Self::RedownloadErrorStreak { count } => {
                if *count >= 5 {
                    9
                } else if *count >= 2 {
                    6
                } else {
                    3
                }
            }
            Self::NoPeerResponded => 7,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity() >= 8
    }
}

pub struct HealthConfig {
    pub cluster_check_stale_after: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { cluster_check_stale_after: Duration::from_secs(120) }
    }
}

/// Aggregates the signals the node already tracks elsewhere into one
/// `HealthStatus` on demand. Doesn't own the signals — `update_*` is called
/// by the loops that already compute this information.
pub struct HealthMonitor {
    config: HealthConfig,
    started_at: Instant,
    node_state: RwLock<String>,
    last_cluster_check: RwLock<Option<Instant>>,
    consecutive_redownload_errors: RwLock<u32>,
    any_peer_responded: RwLock<bool>,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            started_at: Instant::now(),
            node_state: RwLock::new("starting".to_string()),
            last_cluster_check: RwLock::new(None),
            consecutive_redownload_errors: RwLock::new(0),
            any_peer_responded: RwLock::new(true),
        }
    }

    pub fn update_node_state(&self, state: impl Into<String>) {
        *self.node_state.write() = state.into();
    }

    pub fn record_cluster_check(&self, any_peer_responded: bool) {
        *self.last_cluster_check.write() = Some(Instant::now());
        *self.any_peer_responded.write() = any_peer_responded;
    }

    pub fn record_redownload_result(&self, succeeded: bool) {
        let mut count = self.consecutive_redownload_errors.write();
        if succeeded {
            *count = 0;
        } else {
            *count += 1;
        }
    }

    pub fn get_health(&self) -> HealthStatus {
        let mut issues = Vec::new();

        let seconds_since_last_cluster_check = self.last_cluster_check.read().map(|at| at.elapsed().as_secs());
        if let Some(seconds) = seconds_since_last_cluster_check {
            if Duration::from_secs(seconds) > self.config.cluster_check_stale_after {
                issues.push(HealthIssue::ClusterCheckStale { seconds });
            }
        }

        let consecutive_redownload_errors = *self.consecutive_redownload_errors.read();
        if consecutive_redownload_errors > 0 {
            issues.push(HealthIssue::RedownloadErrorStreak { count: consecutive_redownload_errors });
        }

        if !*self.any_peer_responded.read() {
            issues.push(HealthIssue::NoPeerResponded);
        }

        let healthy = !issues.iter().any(HealthIssue::is_critical);

        HealthStatus {
            healthy,
            node_state: self.node_state.read().clone(),
            seconds_since_last_cluster_check,
            consecutive_redownload_errors,
            issues,
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }

    pub fn log_health(&self) {
        let status = self.get_health();
        if status.healthy {
            info!(uptime = status.uptime_seconds, "node healthy");
        } else {
            warn!(issues = ?status.issues, "node reporting health issues");
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for [`ProcessingConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessingConfigError {
    #[error("recent_snapshot_number must be greater than 0")]
    ZeroRecentSnapshotNumber,
    #[error("substore_capacity must be greater than 0")]
    ZeroSubstoreCapacity,
    #[error("max_invalid_snapshot_rate must be 0..=100, got {0}")]
    InvalidRate(u8),
}

/// Default per-substore capacity for InConsensus/Accepted/Unknown (spec §6).
pub const DEFAULT_SUBSTORE_CAPACITY: usize = 240;

/// Shared processing configuration consumed by the lifecycle store (C4),
/// the broadcast/verify loop (C9), and the redownload threshold logic (C7).
///
/// This is the subset of node configuration the coordination layer itself
/// needs; the full operator-facing `Config` (network, RPC, logging, ...)
/// lives in `ledger-node::config` and embeds this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum entries retained in `recentSnapshots` (I4).
    pub recent_snapshot_number: usize,

    /// Height slack tolerated before a node is considered "too far behind"
    /// (spec §4.C7 `shouldReDownload`, `belowInterval`).
    pub snapshot_height_redownload_delay_interval: i64,

    /// Percentage (0-100) of `SnapshotInvalid` verification responses that
    /// triggers a cluster check (spec §4.C9 `shouldRunClusterCheck`).
    pub max_invalid_snapshot_rate: u8,

    /// Capacity of each of InConsensus/Accepted/Unknown (I2).
    pub substore_capacity: usize,

    /// Whether `getMetricsMap` reproduces the observed off-by-one index bug
    /// (spec §9) for compatibility with older monitoring dashboards.
    pub legacy_metrics_indexing: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            recent_snapshot_number: 20,
            snapshot_height_redownload_delay_interval: 10,
            max_invalid_snapshot_rate: 34,
            substore_capacity: DEFAULT_SUBSTORE_CAPACITY,
            legacy_metrics_indexing: false,
        }
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<(), ProcessingConfigError> {
        if self.recent_snapshot_number == 0 {
            return Err(ProcessingConfigError::ZeroRecentSnapshotNumber);
        }
        if self.substore_capacity == 0 {
            return Err(ProcessingConfigError::ZeroSubstoreCapacity);
        }
        if self.max_invalid_snapshot_rate > 100 {
            return Err(ProcessingConfigError::InvalidRate(self.max_invalid_snapshot_rate));
        }
        Ok(())
    }
}

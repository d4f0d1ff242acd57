pub mod broadcast;
pub mod cluster_check_gate;
pub mod config;
pub mod error;
pub mod health;
pub mod health_check;
pub mod ledger_item;
pub mod metrics;
pub mod node_state_service;
pub mod recent_snapshots;
pub mod redownload;
pub mod service;

pub use broadcast::BroadcastVerifyLoop;
pub use cluster_check_gate::ClusterCheckGate;
pub use config::Config;
pub use error::NodeError;
pub use health::{HealthConfig, HealthIssue, HealthMonitor, HealthStatus};
pub use health_check::HealthCheckLoop;
pub use ledger_item::LedgerItem;
pub use metrics::NodeMetrics;
pub use node_state_service::NodeStateService;
pub use recent_snapshots::RecentSnapshotsHandle;
pub use redownload::RedownloadDriver;
pub use service::NodeService;

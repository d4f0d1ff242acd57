use std::path::{Path, PathBuf};

use ledger_core::ProcessingConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Operator-facing node configuration. Embeds `ProcessingConfig`, the subset
/// the coordination layer itself consumes, alongside the network/logging
/// settings that only the node binary needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub node: NodeSection,
    #[serde(default)]
    pub processing: ProcessingConfig,
    pub network: NetworkSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    pub name: String,
    pub data_dir: PathBuf,
    /// How often the health-check loop (C10) runs `run_cluster_check`.
    pub cluster_check_interval_secs: u64,
    /// How often the broadcast/verify loop (C9) announces its latest
    /// snapshot and polls peers for theirs.
    pub broadcast_interval_secs: u64,
    /// How often C9's standalone `verifyRecentSnapshots` round runs, polling
    /// peers' whole `recentSnapshots` list outside of any broadcast.
    pub recent_snapshots_verify_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSection {
    pub listen_addr: String,
    pub listen_port: u16,
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeSection {
                name: "quorum-node".to_string(),
                data_dir: PathBuf::from("./data"),
                cluster_check_interval_secs: 30,
                broadcast_interval_secs: 10,
                recent_snapshots_verify_interval_secs: 20,
            },
            processing: ProcessingConfig::default(),
            network: NetworkSection {
                listen_addr: "0.0.0.0".to_string(),
                listen_port: 26656,
                peers: Vec::new(),
            },
            logging: LoggingSection::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path_ref = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path_ref, contents).map_err(|source| ConfigError::Write {
            path: path_ref.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.listen_port == 0 {
            return Err(ConfigError::Invalid("network.listen_port must not be 0".to_string()));
        }
        if self.node.cluster_check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "node.cluster_check_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.node.broadcast_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "node.broadcast_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.node.recent_snapshots_verify_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "node.recent_snapshots_verify_interval_secs must be greater than 0".to_string(),
            ));
        }
        self.processing
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }
}

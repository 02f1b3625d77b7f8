//! # Node Configuration
//!
//! Unified configuration for all subsystems. Loaded from a JSON file,
//! with the producer secret overridable through `HUSH_PRODUCER_SECRET`
//! so credentials stay out of config files in production.

use serde::Deserialize;
use std::path::Path;

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub producer: ProducerConfig,
    pub blockchain_settings: BlockchainSettings,
    pub reactions: ReactionSettings,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            producer: ProducerConfig::default(),
            blockchain_settings: BlockchainSettings::default(),
            reactions: ReactionSettings::default(),
        }
    }
}

/// Listen ports for the RPC surfaces (served by external collaborators).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Native RPC port.
    pub rpc_port: u16,
    /// Web-compatible RPC port.
    pub web_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_port: 9950,
            web_port: 9951,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Connection string for the embedded database driver.
    /// `memory:` selects the in-process reference adapter.
    pub connection_string: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connection_string: "memory:".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Connection string for the cache layer; `process:` selects the
    /// in-process projection cache.
    pub connection_string: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            connection_string: "process:".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProducerConfig {
    /// Hex-encoded 32-byte Ed25519 secret. Empty means: read
    /// `HUSH_PRODUCER_SECRET` from the environment.
    pub secret_hex: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlockchainSettings {
    /// Seconds between production pulses.
    pub block_interval_secs: u64,
    /// Consecutive empty blocks before the scheduler pauses.
    pub max_empty_blocks_before_pause: u32,
    /// Maximum transactions per block.
    pub max_block_size: usize,
}

impl Default for BlockchainSettings {
    fn default() -> Self {
        Self {
            block_interval_secs: 3,
            max_empty_blocks_before_pause: 100,
            max_block_size: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReactionSettings {
    /// Membership tree depth.
    pub merkle_depth: usize,
    /// Accepted trailing roots for proof validation.
    pub grace_window: usize,
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            merkle_depth: 20,
            grace_window: 3,
        }
    }
}

impl NodeConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The producer secret, preferring the environment over the file.
    pub fn producer_secret(&self) -> anyhow::Result<String> {
        if let Ok(secret) = std::env::var("HUSH_PRODUCER_SECRET") {
            return Ok(secret);
        }
        if self.producer.secret_hex.is_empty() {
            anyhow::bail!(
                "no producer secret: set producer.secret_hex or HUSH_PRODUCER_SECRET"
            );
        }
        Ok(self.producer.secret_hex.clone())
    }
}

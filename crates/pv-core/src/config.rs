use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level client configuration (loaded from peervault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PvConfig {
    pub crypto: CryptoConfig,
    pub sync: SyncConfig,
    pub dht: DhtConfig,
}

impl PvConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).map_err(|e| anyhow::anyhow!("parsing config: {e}"))
    }

    /// Load a configuration file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Self::from_toml(&text)
    }
}

/// Key-derivation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

/// Profile synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Bound on get→mutate→put retries after a lost optimistic-concurrency
    /// race before the conflict is surfaced as a final failure.
    pub max_commit_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: 3,
        }
    }
}

/// Remote DHT store configuration (S3-compatible adapter)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DhtConfig {
    /// S3-compatible endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket holding profile entries
    pub bucket: String,
    /// Enforce HTTPS for store connections (error on HTTP endpoints)
    pub enforce_tls: bool,
}

impl Default for DhtConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8333".into(),
            region: "us-east-1".into(),
            bucket: "peervault".into(),
            enforce_tls: false,
        }
    }
}

//! Wallet settings with TOML file support.
//!
//! Settings describe how to run a wallet (where its data lives, which
//! custodian to talk to, how to log). They are separate from the `Config`
//! row, which is written once when the wallet is created.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use hookpay_types::Network;

use crate::WalletError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSettings {
    /// Base URL of the settlement custodian.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Directory holding the wallet database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bitcoin network addresses are checked against.
    #[serde(default)]
    pub network: Network,

    /// Consecutive empty addresses before discovery stops.
    #[serde(default = "default_gap_limit")]
    pub gap_limit: u32,

    /// Timeout for a single custodian request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_api_base() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./hookpay_data")
}

pub const DEFAULT_GAP_LIMIT: u32 = 20;

fn default_gap_limit() -> u32 {
    DEFAULT_GAP_LIMIT
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size_mb() -> usize {
    1024
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletSettings {
    pub fn from_toml_file(path: &str) -> Result<Self, WalletError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| WalletError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, WalletError> {
        toml::from_str(s).map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, WalletError> {
        toml::to_string_pretty(self).map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            data_dir: default_data_dir(),
            network: Network::default(),
            gap_limit: default_gap_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            map_size_mb: default_map_size_mb(),
        }
    }
}

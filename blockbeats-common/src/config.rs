//! Configuration loading
//!
//! Settings resolve with ENV → TOML file → compiled default priority. The
//! contract address and the pinning token have no sensible defaults; any
//! operation that needs one fails with a configuration error when absent.

use crate::license::Address;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix for all settings
const ENV_PREFIX: &str = "BLOCKBEATS_";

/// Resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// JSON-RPC endpoint of the chain node
    pub rpc_url: String,
    /// Deployed MusicLicense contract address (required for chain access)
    pub contract_address: Option<String>,
    /// Pinning service API base URL
    pub pinning_api_url: String,
    /// Pinning service bearer token (required to publish)
    pub pinning_jwt: Option<String>,
    /// Public gateway base URL for content reads
    pub gateway_url: String,
    /// Historical scan window for issuance events, in blocks
    pub lookback_blocks: u64,
    /// Upload gateway bind address
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: None,
            pinning_api_url: "https://api.pinata.cloud".to_string(),
            pinning_jwt: None,
            gateway_url: "https://gateway.pinata.cloud".to_string(),
            lookback_blocks: 10_000,
            bind_addr: "127.0.0.1:5740".to_string(),
        }
    }
}

/// On-disk settings file shape (all fields optional)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TomlSettings {
    rpc_url: Option<String>,
    contract_address: Option<String>,
    pinning_api_url: Option<String>,
    pinning_jwt: Option<String>,
    gateway_url: Option<String>,
    lookback_blocks: Option<u64>,
    bind_addr: Option<String>,
}

impl Settings {
    /// Load settings from the platform config file plus environment overrides
    pub fn load() -> Result<Settings> {
        Self::load_from(find_config_file().as_deref())
    }

    /// Load settings from an explicit TOML path (or defaults when `None`),
    /// then apply environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(path) = path {
            debug!("Loading settings from {}", path.display());
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
            let file: TomlSettings = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

            if let Some(v) = file.rpc_url {
                settings.rpc_url = v;
            }
            if let Some(v) = file.contract_address {
                settings.contract_address = Some(v);
            }
            if let Some(v) = file.pinning_api_url {
                settings.pinning_api_url = v;
            }
            if let Some(v) = file.pinning_jwt {
                settings.pinning_jwt = Some(v);
            }
            if let Some(v) = file.gateway_url {
                settings.gateway_url = v;
            }
            if let Some(v) = file.lookback_blocks {
                settings.lookback_blocks = v;
            }
            if let Some(v) = file.bind_addr {
                settings.bind_addr = v;
            }
        }

        settings.apply_env()?;
        Ok(settings)
    }

    /// Overlay `BLOCKBEATS_*` environment variables (highest priority)
    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_var("RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = env_var("CONTRACT_ADDRESS") {
            self.contract_address = Some(v);
        }
        if let Some(v) = env_var("PINNING_API_URL") {
            self.pinning_api_url = v;
        }
        if let Some(v) = env_var("PINNING_JWT") {
            self.pinning_jwt = Some(v);
        }
        if let Some(v) = env_var("GATEWAY_URL") {
            self.gateway_url = v;
        }
        if let Some(v) = env_var("LOOKBACK_BLOCKS") {
            self.lookback_blocks = v
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BLOCKBEATS_LOOKBACK_BLOCKS: {}", v)))?;
        }
        if let Some(v) = env_var("BIND_ADDR") {
            self.bind_addr = v;
        }
        Ok(())
    }

    /// Contract address, parsed. Fatal precondition for any on-chain operation.
    pub fn require_contract_address(&self) -> Result<Address> {
        let raw = self.contract_address.as_deref().ok_or_else(|| {
            Error::Config(
                "Contract address not configured. Set BLOCKBEATS_CONTRACT_ADDRESS or \
                 contract_address in the config file."
                    .to_string(),
            )
        })?;
        raw.parse()
    }

    /// Pinning bearer token. Required before any publish operation.
    pub fn require_pinning_jwt(&self) -> Result<&str> {
        self.pinning_jwt
            .as_deref()
            .filter(|jwt| !jwt.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Pinning token not configured. Set BLOCKBEATS_PINNING_JWT or pinning_jwt \
                     in the config file."
                        .to_string(),
                )
            })
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, suffix))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Locate the settings file for the platform, if one exists
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("blockbeats").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/blockbeats/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

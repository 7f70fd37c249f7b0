use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::celo::retry::RetryPolicy;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_network: String,
    pub custom_network: CustomNetworkConfig,
    /// Replacement RPC URLs for the built-in networks, keyed by network name.
    pub rpc_overrides: HashMap<String, String>,
    pub rpc: RpcConfig,
    pub explorer: ExplorerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomNetworkConfig {
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    pub explorer_api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Deadline for a single RPC round trip; `0` or unset means no deadline.
    pub timeout_secs: Option<u64>,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub allow_write_operations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_network: "mainnet".to_string(),
            custom_network: CustomNetworkConfig::default(),
            rpc_overrides: HashMap::new(),
            rpc: RpcConfig::default(),
            explorer: ExplorerConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create config directory {:?}: {}", parent, e)
                })?;
            }
        }

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path, e))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_env_vars(|name| std::env::var(name).ok());
        config
    }

    /// Applies `CELO_RPC_URL` and `CELOSCAN_API_KEY` overrides.
    fn apply_env_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(rpc_url) = lookup("CELO_RPC_URL") {
            tracing::info!("Using CELO_RPC_URL environment variable for the custom network");
            self.custom_network.rpc_url = Some(rpc_url);
        }

        if let Some(api_key) = lookup("CELOSCAN_API_KEY") {
            tracing::debug!("CELOSCAN_API_KEY found, will be used for explorer queries");
            self.explorer.api_key = Some(api_key);
        } else {
            tracing::debug!("No explorer API key configured, history queries are rate limited");
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("celo-mcp").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# Celo MCP Server Configuration File

# Network used when a request does not name one: mainnet, alfajores, baklava or custom
default_network = "mainnet"

# Endpoint for the "custom" network. CELO_RPC_URL overrides rpc_url.
# Contract addresses for the custom network are taken from mainnet.
[custom_network]
# rpc_url = "http://localhost:8545"
# chain_id = 42220
# explorer_api_url = "https://api.celoscan.io/api"

# Replacement RPC URLs for the built-in networks
[rpc_overrides]
# mainnet = "https://my-node.example"

# 0 waits indefinitely
[rpc]
timeout_secs = 30

# Retries apply to read-only calls only. max_attempts = 1 disables them.
[rpc.retry]
max_attempts = 1
initial_backoff_ms = 250
max_backoff_ms = 4000

[explorer]
# api_key = "YOUR_API_KEY_HERE"   # or set CELOSCAN_API_KEY

[security]
allow_write_operations = false
"#;
        sample_config.to_string()
    }
}

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::bind::waiter::WaitConfig;

pub const RPC_URL_ENV: &str = "CONTRACT_BIND_RPC_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub networks: HashMap<String, NetworkConfig>,
    pub default_network: String,
    pub wait: WaitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub explorer_url: Option<String>,
    pub gas: GasConfig,
}

/// Explicit transaction parameters. Unset values are asked from the node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GasConfig {
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitSettings {
    pub poll_interval_ms: u64,
    pub max_consecutive_errors: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        let defaults = WaitConfig::default();
        Self {
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            max_consecutive_errors: defaults.max_consecutive_errors,
        }
    }
}

impl WaitSettings {
    pub fn to_wait_config(&self) -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_consecutive_errors: self.max_consecutive_errors,
        }
    }
}

fn hashio(network: &str, chain_id: u64) -> NetworkConfig {
    NetworkConfig {
        rpc_url: format!("https://{}.hashio.io/api", network),
        chain_id,
        explorer_url: Some(format!("https://hashscan.io/{}", network)),
        gas: GasConfig::default(),
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut networks = HashMap::new();
        networks.insert("mainnet".to_string(), hashio("mainnet", 295));
        networks.insert("testnet".to_string(), hashio("testnet", 296));
        networks.insert("previewnet".to_string(), hashio("previewnet", 297));
        networks.insert(
            "local".to_string(),
            NetworkConfig {
                rpc_url: "http://localhost:7546".to_string(),
                chain_id: 298,
                explorer_url: None,
                gas: GasConfig::default(),
            },
        );

        Self {
            networks,
            default_network: "testnet".to_string(),
            wait: WaitSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
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

        config.apply_env_vars();
        config
    }

    /// The configuration of `network`, or of the default network.
    pub fn network(&self, network: Option<&str>) -> Result<&NetworkConfig> {
        let name = network.unwrap_or(&self.default_network);
        self.networks
            .get(name)
            .ok_or_else(|| anyhow!("Network '{}' not configured", name))
    }

    pub fn available_networks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.networks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Points the default network at `rpc_url`.
    pub fn override_rpc_url(&mut self, rpc_url: &str) {
        if let Some(network_config) = self.networks.get_mut(&self.default_network) {
            network_config.rpc_url = rpc_url.to_string();
        }
    }

    fn apply_env_vars(&mut self) {
        if let Ok(rpc_url) = std::env::var(RPC_URL_ENV) {
            tracing::info!(
                "Using {} for network {}",
                RPC_URL_ENV,
                self.default_network
            );
            self.override_rpc_url(&rpc_url);
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("contract-bind").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# contract-bind configuration file

# Network used when --network is not given
default_network = "testnet"

[networks.mainnet]
rpc_url = "https://mainnet.hashio.io/api"
chain_id = 295
explorer_url = "https://hashscan.io/mainnet"

[networks.mainnet.gas]
# gas_limit = 400000
# gas_price = 530000000000

[networks.testnet]
rpc_url = "https://testnet.hashio.io/api"
chain_id = 296
explorer_url = "https://hashscan.io/testnet"

[networks.testnet.gas]

[networks.previewnet]
rpc_url = "https://previewnet.hashio.io/api"
chain_id = 297
explorer_url = "https://hashscan.io/previewnet"

[networks.previewnet.gas]

[networks.local]
rpc_url = "http://localhost:7546"
chain_id = 298

[networks.local.gas]

# Receipt polling
[wait]
poll_interval_ms = 1000
max_consecutive_errors = 5

# Environment variables that can be used:
# OPERATOR_PRIVATE_KEY - hex private key of the sending account (required)
# CONTRACT_BIND_RPC_URL - overrides the RPC URL of the default network
"#;
        sample_config.to_string()
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::domain::contract::NATIVE_DECIMALS;
use crate::domain::decoder::DecodeMode;
use crate::domain::proposal::ProposalRules;
use crate::domain::units::parse_units;
use crate::domain::validate::parse_address;
use crate::infrastructure::ethereum::ProviderConfig;
use crate::store::ListedToken;

pub const DEFAULT_CONTRACT: &str = "0xBdBBaBdD5Ab1E8BA530c981B55dF34F6F4e62A88";
pub const DEFAULT_RPC: &str = "https://rpc.sepolia.org";
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_EXPLORER: &str = "https://sepolia.etherscan.io";
pub const DEFAULT_KEY_ENV: &str = "SIGDASH_PRIVATE_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSpec {
    pub address: String,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ws: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub contract: String,
    pub chain_id: u64,
    pub explorer_url: String,
    pub refresh_delay_ms: u64,
    pub receipt_timeout_secs: u64,
    pub max_native_amount: String,
    pub strict_state_codes: bool,
    pub key_env: String,
    pub tokens: Vec<TokenSpec>,
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract: DEFAULT_CONTRACT.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            explorer_url: DEFAULT_EXPLORER.to_string(),
            refresh_delay_ms: 4000,
            receipt_timeout_secs: 180,
            max_native_amount: "1000".to_string(),
            strict_state_codes: false,
            key_env: DEFAULT_KEY_ENV.to_string(),
            tokens: Vec::new(),
            endpoints: Vec::new(),
        }
    }
}

impl TokenSpec {
    pub fn display_symbol(&self) -> String {
        self.symbol
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| crate::domain::decoder::short_addr(&self.address))
    }
}

/// Load the config file; a missing file means defaults, a malformed one is logged
pub fn load(path: Option<&Path>) -> Config {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed config");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("SIGDASH_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("sigdash").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("sigdash").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "sigdash", "sigdash")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("sigdash"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("sigdash"));
    }
    directories::ProjectDirs::from("io", "sigdash", "sigdash")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("sigdash.log"))
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub contract: Option<String>,
    pub key_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEndpoint {
    pub name: String,
    pub provider: ProviderConfig,
}

/// Effective settings after merging file, defaults and command line
#[derive(Debug, Clone)]
pub struct Settings {
    pub contract: Address,
    pub chain_id: u64,
    pub explorer_url: String,
    pub refresh_delay: Duration,
    pub receipt_timeout: Duration,
    pub rules: ProposalRules,
    pub decode_mode: DecodeMode,
    pub key_env: String,
    pub tokens: Vec<ListedToken>,
    pub endpoints: Vec<NamedEndpoint>,
    pub config_path: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        let contract_text = overrides.contract.as_deref().unwrap_or(&config.contract);
        let contract = parse_address(contract_text.trim())
            .with_context(|| format!("Invalid contract address: {contract_text}"))?;

        let cap: U256 = parse_units(&config.max_native_amount, NATIVE_DECIMALS)
            .with_context(|| format!("Invalid max_native_amount: {}", config.max_native_amount))?;

        let mut tokens = Vec::new();
        for spec in &config.tokens {
            match parse_address(spec.address.trim()) {
                Some(address) => tokens.push(ListedToken {
                    address,
                    symbol: spec.display_symbol(),
                    decimals: spec.decimals,
                }),
                None => warn!(address = %spec.address, "skipping token with invalid address"),
            }
        }

        Ok(Self {
            contract,
            chain_id: config.chain_id,
            explorer_url: config.explorer_url.trim_end_matches('/').to_string(),
            refresh_delay: Duration::from_millis(config.refresh_delay_ms),
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs.max(1)),
            rules: ProposalRules {
                max_native_amount: Some(cap),
            },
            decode_mode: if config.strict_state_codes {
                DecodeMode::Strict
            } else {
                DecodeMode::Lenient
            },
            key_env: overrides
                .key_env
                .clone()
                .unwrap_or_else(|| config.key_env.clone()),
            tokens,
            endpoints: build_endpoints(config, overrides),
            config_path: config_path(),
        })
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }

    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        self.endpoints.iter().map(|e| e.provider.clone()).collect()
    }
}

/// Command-line endpoints first, then the file, then the public default
fn build_endpoints(config: &Config, overrides: &Overrides) -> Vec<NamedEndpoint> {
    let mut endpoints = Vec::new();

    if let Some(ws) = overrides.ws.as_deref() {
        push_endpoint(&mut endpoints, "cli-ws", ProviderConfig::WebSocket(ws.to_string()));
    }
    if let Some(rpc) = overrides.rpc.as_deref() {
        push_endpoint(&mut endpoints, "cli", ProviderConfig::Http(rpc.to_string()));
    }

    for (idx, entry) in config.endpoints.iter().enumerate() {
        let name = entry
            .name
            .clone()
            .unwrap_or_else(|| format!("endpoint-{}", idx + 1));
        if let Some(ws) = entry.ws.as_deref().filter(|s| !s.trim().is_empty()) {
            push_endpoint(&mut endpoints, &name, ProviderConfig::WebSocket(ws.trim().to_string()));
        } else if let Some(rpc) = entry.rpc.as_deref().filter(|s| !s.trim().is_empty()) {
            push_endpoint(&mut endpoints, &name, ProviderConfig::Http(rpc.trim().to_string()));
        }
    }

    if endpoints.is_empty() {
        push_endpoint(&mut endpoints, "sepolia", ProviderConfig::Http(DEFAULT_RPC.to_string()));
    }
    endpoints
}

fn push_endpoint(list: &mut Vec<NamedEndpoint>, name: &str, provider: ProviderConfig) {
    if list.iter().any(|e| e.provider == provider) {
        return;
    }
    list.push(NamedEndpoint {
        name: name.to_string(),
        provider,
    });
}

use std::str::FromStr;

use thiserror::Error;

/// API key captured from the build environment, if any.
const BUILD_TIME_API_KEY: Option<&str> = option_env!("NFT_INDEXER_API_KEY");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

impl FromStr for RuntimeProfile {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Invalid {
                key: "NFT_INDEXER_PROFILE",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} must be set in the production profile")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub runtime_profile: RuntimeProfile,
    pub api_key: Option<String>,
    pub network: String,
    pub indexer_base_url: Option<String>,
    pub request_timeout_ms: u64,
    pub expected_chain_id: u64,
    pub explorer_base_url: String,
    pub eip1193_proxy_url: Option<String>,
    pub provider_poll_interval_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            api_key: None,
            network: "eth-mainnet".to_owned(),
            indexer_base_url: None,
            request_timeout_ms: 15_000,
            expected_chain_id: 1,
            explorer_base_url: "https://etherscan.io/address".to_owned(),
            eip1193_proxy_url: None,
            provider_poll_interval_ms: 1_000,
        }
    }
}

impl IndexerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset or blank keys keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(raw) = get("NFT_INDEXER_PROFILE") {
            cfg.runtime_profile = raw.parse()?;
        }
        cfg.api_key = get("NFT_INDEXER_API_KEY").or_else(|| {
            BUILD_TIME_API_KEY
                .map(str::to_owned)
                .filter(|v| !v.is_empty())
        });
        if let Some(network) = get("NFT_INDEXER_NETWORK") {
            cfg.network = network;
        }
        cfg.indexer_base_url = get("NFT_INDEXER_BASE_URL");
        if let Some(raw) = get("NFT_INDEXER_TIMEOUT_MS") {
            cfg.request_timeout_ms = parse_number("NFT_INDEXER_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("NFT_INDEXER_CHAIN_ID") {
            cfg.expected_chain_id = parse_number("NFT_INDEXER_CHAIN_ID", &raw)?;
        }
        if let Some(url) = get("NFT_INDEXER_EXPLORER_URL") {
            cfg.explorer_base_url = url;
        }
        cfg.eip1193_proxy_url = get("NFT_INDEXER_EIP1193_PROXY_URL");
        if let Some(raw) = get("NFT_INDEXER_POLL_MS") {
            cfg.provider_poll_interval_ms = parse_number("NFT_INDEXER_POLL_MS", &raw)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strict_runtime_required() && self.api_key.is_none() {
            return Err(ConfigError::Missing("NFT_INDEXER_API_KEY"));
        }
        Ok(())
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn indexer_base_url(&self) -> String {
        match &self.indexer_base_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("https://{}.g.alchemy.com", self.network),
        }
    }
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_owned(),
    })
}

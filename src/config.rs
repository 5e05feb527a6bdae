//! Upstream endpoints, server and logging settings, read from `AKABOARD_*`
//! variables.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_base: String,
    pub site_api_base: String,
    pub site_base: String,
    pub tzkt_api_base: String,
    pub ipfs_gateway: String,
    pub http_timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.akaswap.com".to_string(),
            site_api_base: "https://akaswap.com/api".to_string(),
            site_base: "https://akaswap.com".to_string(),
            tzkt_api_base: "https://api.tzkt.io".to_string(),
            ipfs_gateway: "https://ipfs.io/ipfs/".to_string(),
            http_timeout_ms: None,
        }
    }
}

impl ApiConfig {
    pub fn gateway_uri(&self, uri: &str) -> String {
        uri.replace("ipfs://", &self.ipfs_gateway)
    }

    pub fn profile_url(&self, address: &str) -> String {
        format!("{}/tz/{address}", self.site_base)
    }

    pub fn site_root(&self) -> String {
        format!("{}/", self.site_base)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if raw.eq_ignore_ascii_case("pretty") {
            Some(Self::Pretty)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub filter: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid AKABOARD_ADDR '{value}': {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

pub fn api_config_from_env() -> ApiConfig {
    let mut config = ApiConfig::default();

    if let Some(value) = non_empty_var("AKABOARD_API_BASE") {
        config.api_base = trim_slash(&value);
    }
    if let Some(value) = non_empty_var("AKABOARD_SITE_API_BASE") {
        config.site_api_base = trim_slash(&value);
    }
    if let Some(value) = non_empty_var("AKABOARD_SITE_BASE") {
        config.site_base = trim_slash(&value);
    }
    if let Some(value) = non_empty_var("AKABOARD_TZKT_API_BASE") {
        config.tzkt_api_base = trim_slash(&value);
    }
    if let Some(value) = non_empty_var("AKABOARD_IPFS_GATEWAY") {
        config.ipfs_gateway = value;
    }
    if let Some(value) = non_empty_var("AKABOARD_HTTP_TIMEOUT_MS") {
        config.http_timeout_ms = value.parse::<u64>().ok().filter(|ms| *ms > 0);
    }

    config
}

pub fn server_config_from_env() -> Result<ServerConfig, ConfigError> {
    let raw = non_empty_var("AKABOARD_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let bind_addr = raw
        .parse::<SocketAddr>()
        .map_err(|source| ConfigError::BindAddr { value: raw, source })?;

    Ok(ServerConfig {
        bind_addr,
        api: api_config_from_env(),
    })
}

// Unknown format or target values keep the defaults; the filter string is
// validated when the subscriber is installed.
pub fn logging_config_from_env() -> LoggingConfig {
    let mut config = LoggingConfig::default();

    if let Some(filter) = non_empty_var("AKABOARD_LOG_LEVEL") {
        config.filter = filter;
    }
    if let Some(format) = non_empty_var("AKABOARD_LOG_FORMAT").and_then(|v| LogFormat::parse(&v))
    {
        config.format = format;
    }
    if let Some(target) = non_empty_var("AKABOARD_LOG_TARGET").and_then(|v| parse_switch(&v)) {
        config.include_target = target;
    }

    config
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn trim_slash(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

//! Configuration loading for termlens.
//! Reads termlens.toml from the current directory or the path in TERMLENS_CONFIG.
//!
//! The UTS API key is not part of the configuration. It is typed into the
//! query form for each session and never written anywhere.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use termlens_common::TermlensError;

pub const CONFIG_ENV: &str = "TERMLENS_CONFIG";
pub const BIND_ENV: &str = "TERMLENS_BIND";
pub const DEFAULT_CONFIG_FILE: &str = "termlens.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub uts: UtsConfig,
    #[serde(default)]
    pub rxnav: RxNavConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 3001 }
fn default_log_filter() -> String { "info,termlens_web=debug,termlens_core=debug,termlens_sources=debug".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtsConfig {
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
    #[serde(default = "default_content_endpoint")]
    pub content_endpoint: String,
    /// Vocabulary checkboxes offered in code mode, in display order.
    #[serde(default = "default_vocabularies")]
    pub vocabularies: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_search_endpoint() -> String { "https://uts-ws.nlm.nih.gov/rest/search/current".to_string() }
fn default_content_endpoint() -> String { "https://uts-ws.nlm.nih.gov/rest/content/current".to_string() }
fn default_timeout_secs() -> u64 { 30 }

fn default_vocabularies() -> Vec<String> {
    [
        "SNOMEDCT_US",
        "ICD10CM",
        "ICD10PCS",
        "ICD9CM",
        "LNC",
        "RXNORM",
        "MSH",
        "CPT",
        "HCPCS",
        "MDR",
        "NCI",
        "MTH",
    ]
    .iter()
    .map(|v| v.to_string())
    .collect()
}

impl Default for UtsConfig {
    fn default() -> Self {
        Self {
            search_endpoint: default_search_endpoint(),
            content_endpoint: default_content_endpoint(),
            vocabularies: default_vocabularies(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UtsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RxNavConfig {
    #[serde(default = "default_rxnav_base")]
    pub base_url: String,
}

fn default_rxnav_base() -> String { "https://rxnav.nlm.nih.gov/REST".to_string() }

impl Default for RxNavConfig {
    fn default() -> Self {
        Self { base_url: default_rxnav_base() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Hosts allowed in addition to the built-in NLM list (mirrors, proxies).
    #[serde(default)]
    pub extra_allowed_domains: Vec<String>,
}


impl Config {
    /// Load configuration from termlens.toml.
    /// Checks TERMLENS_CONFIG first, then the current directory; a missing
    /// file yields the defaults.
    pub fn load() -> Result<Self, TermlensError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_file(Path::new(&path))?
        } else {
            tracing::info!(path = %path, "No config file found, using defaults");
            Config::default()
        };
        if let Ok(bind) = std::env::var(BIND_ENV) {
            config.apply_bind(&bind)?;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, TermlensError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TermlensError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, TermlensError> {
        toml::from_str(content).map_err(|e| TermlensError::Config(e.to_string()))
    }

    /// Overrides host and port from a `host:port` string.
    pub fn apply_bind(&mut self, bind: &str) -> Result<(), TermlensError> {
        let addr: SocketAddr = bind
            .trim()
            .parse()
            .map_err(|_| TermlensError::Config(format!("{BIND_ENV} is not a socket address: {bind}")))?;
        self.server.host = addr.ip().to_string();
        self.server.port = addr.port();
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, TermlensError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| TermlensError::Config(format!("invalid server address {}:{}", self.server.host, self.server.port)))
    }
}

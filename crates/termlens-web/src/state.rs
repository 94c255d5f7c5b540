//! Shared application state for the web server.

use std::sync::Arc;

use minijinja::Environment;
use termlens_common::{Result, SandboxClient};
use termlens_config::Config;
use termlens_core::VocabularyCatalog;
use termlens_sources::{JsonTransport, RxNavClient, UtsClient, UtsEndpoints};
use tracing::info;

use crate::render;

/// Shared state injected into every Axum handler.
///
/// Holds no per-user data: each request carries its own form values.
pub struct AppState {
    pub uts: UtsClient,
    pub rxnav: RxNavClient,
    pub catalog: VocabularyCatalog,
    pub templates: Environment<'static>,
}

impl AppState {
    /// State backed by the sandboxed reqwest client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = SandboxClient::with_timeout(config.uts.timeout())?;
        for domain in &config.sandbox.extra_allowed_domains {
            client.allow_domain(domain);
        }
        info!(
            extra_domains = config.sandbox.extra_allowed_domains.len(),
            timeout_secs = config.uts.timeout_secs,
            "HTTP client ready"
        );
        Self::with_transport(config, Arc::new(client))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn JsonTransport>) -> Result<Self> {
        let endpoints = UtsEndpoints::new(&config.uts.search_endpoint, &config.uts.content_endpoint)?;
        let uts = UtsClient::new(transport.clone(), endpoints);
        let rxnav = RxNavClient::new(transport, &config.rxnav.base_url)?;
        let catalog = VocabularyCatalog::new(&config.uts.vocabularies);
        let templates = render::environment()?;
        Ok(Self {
            uts,
            rxnav,
            catalog,
            templates,
        })
    }
}

pub type SharedState = Arc<AppState>;

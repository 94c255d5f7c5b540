use reqwest::{header, redirect, Client, ClientBuilder};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::error::TermlensError;
use crate::secret::mask_url;

/// Hosts the terminology clients may reach out of the box.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "uts-ws.nlm.nih.gov", // UMLS Terminology Services
    "rxnav.nlm.nih.gov",  // RxNorm / RxNav
    "localhost",
    "127.0.0.1",
];

const MAX_REDIRECTS: usize = 10;

/// Shared between the client and its redirect policy, so domains added
/// after construction also govern redirect hops.
type Allowlist = Arc<RwLock<HashSet<String>>>;

fn host_allowed(allowlist: &Allowlist, url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let allowlist = allowlist.read().unwrap_or_else(PoisonError::into_inner);
    // Exact match or a subdomain of an allowed domain
    allowlist
        .iter()
        .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
}

/// Follows a redirect only while every hop stays on the allowlist. A stopped
/// hop hands the 3xx response back to the caller.
fn redirect_policy(allowlist: Allowlist) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if host_allowed(&allowlist, attempt.url()) {
            attempt.follow()
        } else {
            warn!(target_url = %mask_url(attempt.url()), "redirect off the allowlist not followed");
            attempt.stop()
        }
    })
}

/// A capped HTTP client that only talks to approved hosts.
///
/// Relation rows hand back absolute URLs that are followed with the API key
/// appended, so the allowlist is what keeps the key on NLM hosts. Redirects
/// are held to the same allowlist.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: Allowlist,
}

impl SandboxClient {
    /// Client with the default allowlist and a 30 s timeout.
    pub fn new() -> Result<Self, TermlensError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TermlensError> {
        let allowlist: Allowlist = Arc::new(RwLock::new(
            DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        ));

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .timeout(timeout)
            .default_headers(headers)
            .redirect(redirect_policy(allowlist.clone()))
            .user_agent(concat!("termlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TermlensError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(domain.trim().to_lowercase());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &Url) -> bool {
        host_allowed(&self.allowlist, url)
    }

    /// GET builder for an allowed URL.
    pub fn get(&self, url: &Url) -> Result<reqwest::RequestBuilder, TermlensError> {
        if !self.is_allowed(url) {
            return Err(TermlensError::Security(format!(
                "domain not in allowlist for URL {}",
                mask_url(url)
            )));
        }

        Ok(self.client.get(url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local server: `/start` answers 302 to `location`, anything else `{}`.
    async fn redirecting_server(location: impl Fn(u16) -> String + Send + 'static) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let response = if request.starts_with("GET /start") {
                    format!(
                        "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        location(port)
                    )
                } else {
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}"
                        .to_string()
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    #[test]
    fn test_default_allowlist() {
        let client = SandboxClient::new().unwrap();
        let uts = Url::parse("https://uts-ws.nlm.nih.gov/rest/search/current").unwrap();
        let rxnav = Url::parse("https://rxnav.nlm.nih.gov/REST/ndcstatus.json?ndc=1").unwrap();
        assert!(client.is_allowed(&uts));
        assert!(client.is_allowed(&rxnav));
    }

    #[test]
    fn test_foreign_host_is_refused_without_leaking_key() {
        let client = SandboxClient::new().unwrap();
        let url = Url::parse("https://evil.example.com/steal?apiKey=k3y").unwrap();
        let err = client.get(&url).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("allowlist"));
        assert!(!msg.contains("k3y"));
    }

    #[test]
    fn test_suffix_lookalike_is_refused() {
        let client = SandboxClient::new().unwrap();
        let url = Url::parse("https://notuts-ws.nlm.nih.gov.evil.io/rest").unwrap();
        assert!(!client.is_allowed(&url));
    }

    #[test]
    fn test_allow_domain() {
        let mut client = SandboxClient::new().unwrap();
        let url = Url::parse("https://mirror.example.org/rest/search/current").unwrap();
        assert!(!client.is_allowed(&url));
        client.allow_domain("example.org");
        assert!(client.is_allowed(&url));
    }

    #[tokio::test]
    async fn test_redirect_off_allowlist_is_not_followed() {
        let port = redirecting_server(|_| "http://collector.invalid/steal".to_string()).await;
        let client = SandboxClient::new().unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/start?apiKey=k3y")).unwrap();

        let resp = client.get(&url).unwrap().send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 302);
        assert_eq!(resp.url().host_str(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_redirect_within_allowlist_is_followed() {
        let port = redirecting_server(|port| format!("http://127.0.0.1:{port}/final")).await;
        let client = SandboxClient::new().unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/start?apiKey=k3y")).unwrap();

        let resp = client.get(&url).unwrap().send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.url().path(), "/final");
    }
}

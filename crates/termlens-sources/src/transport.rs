//! JSON-over-HTTP seam shared by the UTS and RxNav clients.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use termlens_common::{mask_url, Result, SandboxClient, TermlensError};
use tracing::{debug, instrument};
use url::Url;

/// Common interface for issuing a GET and decoding the JSON body.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    /// Non-2xx statuses are returned as [`TermlensError::Status`].
    async fn get_json(&self, url: &Url) -> Result<Value>;
}

#[async_trait]
impl JsonTransport for SandboxClient {
    #[instrument(skip_all, fields(url = %mask_url(url)))]
    async fn get_json(&self, url: &Url) -> Result<Value> {
        let resp = self.get(url)?.send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TermlensError::Status {
                status: status.as_u16(),
                url: mask_url(url).to_string(),
            });
        }

        let body = resp.text().await?;
        debug!(bytes = body.len(), "response received");
        Ok(serde_json::from_str(&body)?)
    }
}

// ── Mock Implementation for Testing ────────────────────────────────────────

#[derive(Debug, Clone)]
enum MockReply {
    Json(Value),
    Status(u16),
    Failure(String),
}

/// Canned responses keyed by URL path; records every requested URL.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: HashMap<String, MockReply>,
    requests: Mutex<Vec<Url>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, path: &str, body: Value) -> Self {
        self.replies.insert(path.to_string(), MockReply::Json(body));
        self
    }

    pub fn with_status(mut self, path: &str, status: u16) -> Self {
        self.replies.insert(path.to_string(), MockReply::Status(status));
        self
    }

    /// Simulates a transport failure (connection refused, timeout).
    pub fn with_failure(mut self, path: &str, message: &str) -> Self {
        self.replies.insert(path.to_string(), MockReply::Failure(message.to_string()));
        self
    }

    /// Every URL requested so far, unmasked, in request order.
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl JsonTransport for MockTransport {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.clone());

        match self.replies.get(url.path()) {
            Some(MockReply::Json(body)) => Ok(body.clone()),
            Some(MockReply::Status(status)) => Err(TermlensError::Status {
                status: *status,
                url: mask_url(url).to_string(),
            }),
            Some(MockReply::Failure(message)) => Err(TermlensError::Transport(message.clone())),
            None => Err(TermlensError::Transport(format!("no route for {}", url.path()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_routes_by_path_and_records() {
        let mock = MockTransport::new().with_json("/rest/search/current", json!({"ok": true}));
        let url = Url::parse("https://uts-ws.nlm.nih.gov/rest/search/current?string=a").unwrap();
        let body = mock.get_json(&url).await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(mock.requests(), vec![url]);
    }

    #[tokio::test]
    async fn test_mock_unknown_route_is_network_error() {
        let mock = MockTransport::new();
        let url = Url::parse("https://uts-ws.nlm.nih.gov/nowhere").unwrap();
        let err = mock.get_json(&url).await.unwrap_err();
        assert_eq!(err.kind(), termlens_common::ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_mock_status_masks_key() {
        let mock = MockTransport::new().with_status("/rest/search/current", 401);
        let url = Url::parse("https://uts-ws.nlm.nih.gov/rest/search/current?apiKey=k3y").unwrap();
        let err = mock.get_json(&url).await.unwrap_err();
        assert!(!err.to_string().contains("k3y"));
    }
}

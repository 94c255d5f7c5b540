//! Outbound requests and their human-readable traces.

use std::fmt;

use serde::{Deserialize, Serialize};
use termlens_common::mask_url;
use url::{form_urlencoded, Url};

/// A built GET together with the masked trace shown to the user.
///
/// The unmasked URL only leaves this type through the clients that execute it.
#[derive(Clone)]
pub struct PreparedRequest {
    url: Url,
    trace: RequestTrace,
}

impl PreparedRequest {
    pub fn new(url: Url) -> Self {
        let trace = RequestTrace::from_url(&url);
        Self { url, trace }
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    pub fn trace(&self) -> &RequestTrace {
        &self.trace
    }
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest").field("url", &self.trace.to_string()).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceParam {
    pub key: String,
    pub value: String,
}

/// Request URL split into base and parameters, key already masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTrace {
    /// Origin and path.
    pub base: String,
    pub params: Vec<TraceParam>,
}

impl RequestTrace {
    pub fn from_url(url: &Url) -> Self {
        let masked = mask_url(url);
        let base = format!("{}{}", masked.origin().ascii_serialization(), masked.path());
        let params = masked
            .query_pairs()
            .map(|(k, v)| TraceParam { key: k.into_owned(), value: v.into_owned() })
            .collect();
        Self { base, params }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|p| p.key == key).map(|p| p.value.as_str())
    }
}

impl fmt::Display for RequestTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        for (i, p) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            let key: String = form_urlencoded::byte_serialize(p.key.as_bytes()).collect();
            let value: String = form_urlencoded::byte_serialize(p.value.as_bytes()).collect();
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

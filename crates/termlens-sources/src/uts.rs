//! UMLS Terminology Services (UTS) REST client.
//!
//! API docs: https://documentation.uts.nlm.nih.gov/rest/home.html
//! Endpoints:
//!   search:  https://uts-ws.nlm.nih.gov/rest/search/current
//!   content: https://uts-ws.nlm.nih.gov/rest/content/current
//!
//! Requests are built first ([`PreparedRequest`], whose trace is shown while
//! the call is in flight) and executed second.

use std::sync::Arc;

use serde_json::Value;
use termlens_common::{ApiKey, Result, TermlensError, API_KEY_PARAM};
use tracing::{debug, instrument};
use url::Url;

use crate::models::{search_hits, DetailKind, DetailRecords, RelatedPayload, ReturnIdType, SearchHit};
use crate::request::PreparedRequest;
use crate::transport::JsonTransport;

pub const UTS_SEARCH_URL: &str = "https://uts-ws.nlm.nih.gov/rest/search/current";
pub const UTS_CONTENT_URL: &str = "https://uts-ws.nlm.nih.gov/rest/content/current";

#[derive(Debug, Clone)]
pub struct UtsEndpoints {
    pub search: Url,
    pub content: Url,
}

impl UtsEndpoints {
    pub fn new(search: &str, content: &str) -> Result<Self> {
        Ok(Self {
            search: Url::parse(search)?,
            content: Url::parse(content)?,
        })
    }
}

/// A decoded response alongside its raw body for the "raw data" view.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub raw: Value,
    pub data: T,
}

#[derive(Clone)]
pub struct UtsClient {
    transport: Arc<dyn JsonTransport>,
    endpoints: UtsEndpoints,
}

impl UtsClient {
    pub fn new(transport: Arc<dyn JsonTransport>, endpoints: UtsEndpoints) -> Self {
        Self { transport, endpoints }
    }

    pub fn endpoints(&self) -> &UtsEndpoints {
        &self.endpoints
    }

    // ── Request builders ──────────────────────────────────────────────────

    /// `GET <search>?string=&returnIdType=&apiKey=[&sabs=]`.
    /// `sabs` is sent only for code searches with at least one vocabulary.
    pub fn prepare_search(
        &self,
        key: &ApiKey,
        term: &str,
        id_type: ReturnIdType,
        vocabularies: &[String],
    ) -> PreparedRequest {
        let mut url = self.endpoints.search.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("string", term);
            q.append_pair("returnIdType", id_type.as_str());
            q.append_pair(API_KEY_PARAM, key.expose());
            if id_type.uses_vocabularies() && !vocabularies.is_empty() {
                q.append_pair("sabs", &vocabularies.join(","));
            }
        }
        PreparedRequest::new(url)
    }

    /// `GET <content>/CUI/<cui>/<kind>?apiKey=`.
    pub fn prepare_concept_detail(&self, key: &ApiKey, cui: &str, kind: DetailKind) -> Result<PreparedRequest> {
        let mut url = self.endpoints.content.clone();
        push_segments(&mut url, &["CUI", cui.trim(), kind.as_str()])?;
        Ok(with_key(url, key))
    }

    /// `GET <uri>/<kind>?apiKey=`, or `<content>/source/<sab>/<code>/<kind>`
    /// when the hit carried no content URI.
    pub fn prepare_code_detail(
        &self,
        key: &ApiKey,
        code: &str,
        uri: Option<&str>,
        vocabulary: Option<&str>,
        kind: DetailKind,
    ) -> Result<PreparedRequest> {
        if !kind.is_offered_for(ReturnIdType::Code) {
            return Err(TermlensError::missing(format!("{} are only available for concepts.", kind.title())));
        }
        let url = match (uri, vocabulary) {
            (Some(uri), _) => {
                let mut url = Url::parse(uri)?;
                url.set_query(None);
                push_segments(&mut url, &[kind.as_str()])?;
                url
            }
            (None, Some(sab)) => {
                let mut url = self.endpoints.content.clone();
                push_segments(&mut url, &["source", sab.trim(), code.trim(), kind.as_str()])?;
                url
            }
            (None, None) => {
                return Err(TermlensError::missing("The selected code has no source vocabulary."));
            }
        };
        Ok(with_key(url, key))
    }

    /// `GET <url>?apiKey=` for a URL taken from a relation row.
    pub fn prepare_related(&self, key: &ApiKey, url: &str) -> Result<PreparedRequest> {
        let url = Url::parse(url.trim())?;
        Ok(with_key(url, key))
    }

    // ── Execution ─────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn search(&self, req: &PreparedRequest) -> Result<Fetched<Vec<SearchHit>>> {
        let raw = self.fetch(req).await?;
        let data = search_hits(&raw);
        debug!(count = data.len(), "UTS search returned results");
        Ok(Fetched { raw, data })
    }

    #[instrument(skip(self))]
    pub async fn details(&self, req: &PreparedRequest, kind: DetailKind) -> Result<Fetched<DetailRecords>> {
        let raw = self.fetch(req).await?;
        let data = DetailRecords::from_envelope(kind, &raw);
        debug!(kind = %kind, count = data.len(), "UTS content returned records");
        Ok(Fetched { raw, data })
    }

    #[instrument(skip(self))]
    pub async fn related(&self, req: &PreparedRequest) -> Result<Fetched<RelatedPayload>> {
        let raw = self.fetch(req).await?;
        let data = RelatedPayload::from_envelope(&raw);
        Ok(Fetched { raw, data })
    }

    /// UTS answers "nothing here" with a 404 and an error body; that is an
    /// empty result, not a failure.
    async fn fetch(&self, req: &PreparedRequest) -> Result<Value> {
        match self.transport.get_json(req.url()).await {
            Err(TermlensError::Status { status: 404, .. }) => {
                debug!(url = %req.trace(), "UTS returned 404, treating as empty");
                Ok(Value::Null)
            }
            other => other,
        }
    }
}

fn push_segments(url: &mut Url, segments: &[&str]) -> Result<()> {
    if url.cannot_be_a_base() {
        return Err(TermlensError::Config(format!("URL cannot carry a path: {}", url)));
    }
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    Ok(())
}

fn with_key(mut url: Url, key: &ApiKey) -> PreparedRequest {
    url.query_pairs_mut().append_pair(API_KEY_PARAM, key.expose());
    PreparedRequest::new(url)
}

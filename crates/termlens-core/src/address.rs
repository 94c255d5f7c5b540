//! Address-bar state: what a shareable link restores.
//!
//! Parameter order on output is fixed: `string`, `returnIdType`, `sabs`,
//! `endpoint`, `related`, `relatedId`. `apiKey` is accepted on input so a
//! link can pre-fill the form, but it is never written back.

use serde::Serialize;
use termlens_common::{ApiKey, API_KEY_PARAM};
use termlens_sources::{DetailKind, ReturnIdType};
use url::form_urlencoded;

use crate::query::{QueryParams, VocabularyCatalog};
use crate::selection::RelatedDirection;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressState {
    pub string: Option<String>,
    pub return_id_type: Option<ReturnIdType>,
    pub sabs: Vec<String>,
    pub endpoint: Option<DetailKind>,
    pub related: Option<RelatedDirection>,
    pub related_id: Option<String>,
}

/// Address state plus the key, as read from an incoming link.
#[derive(Debug, Clone, Default)]
pub struct Restored {
    pub address: AddressState,
    pub api_key: Option<ApiKey>,
}

impl Restored {
    /// Form values implied by the link. No request is issued from these.
    pub fn query_params(&self) -> QueryParams {
        QueryParams::new(
            self.api_key.clone(),
            self.address.string.as_deref().unwrap_or_default(),
            self.address.return_id_type.unwrap_or_default(),
            self.address.sabs.clone(),
        )
    }
}

impl AddressState {
    /// Reads a raw query string (without the leading `?`).
    ///
    /// The first occurrence of each parameter wins. Unknown `returnIdType`,
    /// `endpoint` and `related` values are ignored; `sabs` is filtered through
    /// the catalog.
    pub fn parse(query: &str, catalog: &VocabularyCatalog) -> Restored {
        let mut address = AddressState::default();
        let mut api_key = None;
        let mut seen: Vec<String> = Vec::new();

        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            if seen.iter().any(|k| k.as_str() == key.as_ref()) {
                continue;
            }
            seen.push(key.to_string());
            match key.as_ref() {
                "string" => address.string = non_blank(&value),
                "returnIdType" => address.return_id_type = value.parse().ok(),
                "sabs" => address.sabs = catalog.select_csv(&value),
                "endpoint" => address.endpoint = value.parse().ok(),
                "related" => address.related = value.parse().ok(),
                "relatedId" => address.related_id = non_blank(&value),
                k if k == API_KEY_PARAM => api_key = ApiKey::parse(&value),
                _ => {}
            }
        }
        Restored { address, api_key }
    }

    /// State after a search: only the search parameters survive.
    pub fn for_search(params: &QueryParams) -> Self {
        Self {
            string: non_blank(&params.term),
            return_id_type: Some(params.return_id_type),
            sabs: params.effective_vocabularies().to_vec(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(&self, kind: DetailKind) -> Self {
        Self {
            endpoint: Some(kind),
            ..self.clone()
        }
    }

    pub fn with_related(&self, direction: RelatedDirection, url: &str) -> Self {
        Self {
            related: Some(direction),
            related_id: non_blank(&strip_base_url(url)),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the link names a detail or related view to go back to.
    pub fn has_restorable_view(&self) -> bool {
        self.endpoint.is_some() || self.related.is_some() || self.related_id.is_some()
    }

    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(s) = &self.string {
            out.append_pair("string", s);
        }
        if let Some(t) = self.return_id_type {
            out.append_pair("returnIdType", t.as_str());
        }
        if !self.sabs.is_empty() {
            out.append_pair("sabs", &self.sabs.join(","));
        }
        if let Some(e) = self.endpoint {
            out.append_pair("endpoint", e.as_str());
        }
        if let Some(r) = self.related {
            out.append_pair("related", r.as_str());
        }
        if let Some(id) = &self.related_id {
            out.append_pair("relatedId", id);
        }
        out.finish()
    }

    /// Path plus query for `history.pushState`.
    pub fn href(&self) -> String {
        let query = self.to_query();
        if query.is_empty() {
            "/".to_string()
        } else {
            format!("/?{query}")
        }
    }
}

/// Last path segment of a URL; the query and fragment are dropped.
pub fn strip_base_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default().to_string()
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

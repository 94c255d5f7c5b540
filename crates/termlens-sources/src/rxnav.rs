//! RxNav (RxNorm) REST client for NDC ↔ RXCUI conversion.
//!
//! API docs: https://lhncbc.nlm.nih.gov/RxNav/APIs/RxNormAPIs.html
//! Endpoints used:
//!   ndcstatus:  /REST/ndcstatus.json?ndc=<ndc>
//!   properties: /REST/rxcui/<rxcui>/properties.json
//!   ndcs:       /REST/rxcui/<rxcui>/ndcs.json
//!
//! RxNav needs no API key.

use std::sync::Arc;

use serde_json::Value;
use termlens_common::{Result, TermlensError};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::models::{text, NdcConversion, NdcName, RxcuiConversion, RxcuiProperties};
use crate::transport::JsonTransport;

pub const RXNAV_BASE_URL: &str = "https://rxnav.nlm.nih.gov/REST";
pub const RXNAV_DOCS_URL: &str = "https://lhncbc.nlm.nih.gov/RxNav/APIs/RxNormAPIs.html";

/// Term types shown in the legend next to a conversion result.
pub const TERM_TYPES: &[(&str, &str)] = &[
    ("BN", "Brand Name"),
    ("IN", "Ingredient"),
    ("PIN", "Precise Ingredient"),
    ("MIN", "Multiple Ingredients"),
    ("SCD", "Semantic Clinical Drug"),
    ("SBD", "Semantic Branded Drug"),
    ("GPCK", "Generic Pack"),
    ("BPCK", "Branded Pack"),
];

/// Link to the RxNav browser for an RXCUI.
pub fn rxnav_browser_link(rxcui: &str) -> String {
    let term: String = url::form_urlencoded::byte_serialize(rxcui.trim().as_bytes()).collect();
    format!("https://mor.nlm.nih.gov/RxNav/search?searchBy=RXCUI&searchTerm={term}")
}

#[derive(Clone)]
pub struct RxNavClient {
    transport: Arc<dyn JsonTransport>,
    base: Url,
}

impl RxNavClient {
    pub fn new(transport: Arc<dyn JsonTransport>, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(TermlensError::Config(format!("RxNav base URL cannot carry a path: {base_url}")));
        }
        Ok(Self { transport, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn ndc_status_url(&self, ndc: &str) -> Url {
        let mut url = self.endpoint(&["ndcstatus.json"]);
        url.query_pairs_mut().append_pair("ndc", ndc);
        url
    }

    /// NDC → RXCUI via `ndcstatus.json`. Returns the RXCUI and the URL used.
    #[instrument(skip(self))]
    pub async fn ndc_to_rxcui(&self, ndc: &str) -> Result<(String, Url)> {
        let url = self.ndc_status_url(ndc);
        let body = self.transport.get_json(&url).await?;
        match text(&body["ndcStatus"]["rxcui"]) {
            Some(rxcui) => Ok((rxcui, url)),
            None => Err(TermlensError::not_found("RXCUI not found for the given NDC")),
        }
    }

    #[instrument(skip(self))]
    pub async fn rxcui_properties(&self, rxcui: &str) -> Result<(RxcuiProperties, Url)> {
        let url = self.endpoint(&["rxcui", rxcui, "properties.json"]);
        let body = self.transport.get_json(&url).await?;
        match body.get("properties").filter(|p| p.is_object()) {
            Some(props) => Ok((RxcuiProperties::from_json(props), url)),
            None => Err(TermlensError::not_found("Properties not found for the given RXCUI")),
        }
    }

    /// RXCUI → NDC list via `ndcs.json`.
    #[instrument(skip(self))]
    pub async fn rxcui_to_ndcs(&self, rxcui: &str) -> Result<(Vec<String>, Url)> {
        let url = self.endpoint(&["rxcui", rxcui, "ndcs.json"]);
        let body = self.transport.get_json(&url).await?;
        match body["ndcGroup"]["ndcList"]["ndc"].as_array() {
            Some(list) => {
                let ndcs: Vec<String> = list.iter().filter_map(text).collect();
                debug!(count = ndcs.len(), "RxNav returned NDCs");
                Ok((ndcs, url))
            }
            None => Err(TermlensError::not_found("NDC not found for the given RXCUI")),
        }
    }

    /// Drug name for an NDC; `Unknown` when the lookup fails or has no name.
    pub async fn ndc_name(&self, ndc: &str) -> String {
        let url = self.ndc_status_url(ndc);
        match self.transport.get_json(&url).await {
            Ok(body) => concept_name(&body).unwrap_or_else(|| "Unknown".to_string()),
            Err(e) => {
                warn!(ndc, error = %e, "NDC name lookup failed");
                "Unknown".to_string()
            }
        }
    }

    /// NDC → RXCUI, then the RXCUI's term type and name.
    pub async fn convert_ndc(&self, ndc: &str) -> Result<NdcConversion> {
        let ndc = required(ndc, "Please enter an NDC.")?;
        let (rxcui, ndc_url) = self.ndc_to_rxcui(ndc).await?;
        let (props, rxcui_url) = self.rxcui_properties(&rxcui).await?;
        Ok(NdcConversion {
            ndc: ndc.to_string(),
            rxcui,
            term_type: props.tty.unwrap_or_else(|| "N/A".to_string()),
            name: props.name.unwrap_or_else(|| "N/A".to_string()),
            ndc_url: ndc_url.to_string(),
            rxcui_url: rxcui_url.to_string(),
        })
    }

    /// RXCUI → NDCs, each resolved to a drug name one after another.
    pub async fn convert_rxcui(&self, rxcui: &str) -> Result<RxcuiConversion> {
        let rxcui = required(rxcui, "Please enter an RXCUI.")?;
        let (ndcs, api_url) = self.rxcui_to_ndcs(rxcui).await?;
        let mut named = Vec::with_capacity(ndcs.len());
        for ndc in ndcs {
            let name = self.ndc_name(&ndc).await;
            named.push(NdcName { ndc, name });
        }
        Ok(RxcuiConversion {
            rxcui: rxcui.to_string(),
            ndcs: named,
            api_url: api_url.to_string(),
        })
    }
}

fn required<'a>(raw: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(TermlensError::missing(message))
    } else {
        Ok(trimmed)
    }
}

fn concept_name(body: &Value) -> Option<String> {
    let status = &body["ndcStatus"];
    text(&status["conceptName"]).or_else(|| text(&status["active"]["name"]))
}

//! RxNav conversions: NDC → RXCUI and RXCUI → NDC.

use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use termlens_common::{ErrorKind, TermlensError};
use tracing::warn;

use crate::error::ApiError;
use crate::render::{self, RxNavPage};
use crate::state::{AppState, SharedState};

/// Form and query fields of both conversion forms.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConversionForm {
    pub ndc: Option<String>,
    pub rxcui: Option<String>,
    /// Checkbox: present when ticked.
    pub show_urls: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    Ndc,
    Rxcui,
}

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    pub mode: DownloadMode,
    pub value: String,
}

fn html(state: &AppState, page: &RxNavPage) -> Result<Html<String>, ApiError> {
    Ok(Html(render::render(&state.templates, "rxnav.html", page)?))
}

/// Conversion failures are shown on the page, not as an error response.
fn describe(err: &TermlensError) -> String {
    match err.kind() {
        ErrorKind::MissingInput | ErrorKind::NotFound => err.to_string(),
        _ => format!("Error: {err}"),
    }
}

async fn ndc_page(state: &AppState, form: ConversionForm) -> Result<Html<String>, ApiError> {
    let mut page = RxNavPage::new(form.show_urls.is_some());
    if let Some(ndc) = form.ndc {
        match state.rxnav.convert_ndc(&ndc).await {
            Ok(result) => page = page.with_ndc_result(result),
            Err(e) => {
                warn!(error = %e, "NDC conversion failed");
                page.error = Some(describe(&e));
            }
        }
        page.ndc = ndc;
    }
    html(state, &page)
}

async fn rxcui_page(state: &AppState, form: ConversionForm) -> Result<Html<String>, ApiError> {
    let mut page = RxNavPage::new(form.show_urls.is_some());
    if let Some(rxcui) = form.rxcui {
        match state.rxnav.convert_rxcui(&rxcui).await {
            Ok(result) => page = page.with_rxcui_result(result),
            Err(e) => {
                warn!(error = %e, "RXCUI conversion failed");
                page.error = Some(describe(&e));
            }
        }
        page.rxcui = rxcui;
    }
    html(state, &page)
}

/// `GET /rxnav/ndc`: empty form, or a conversion when `?ndc=` is given.
pub async fn ndc_get(State(state): State<SharedState>, Query(form): Query<ConversionForm>) -> Result<Html<String>, ApiError> {
    ndc_page(&state, form).await
}

/// `POST /rxnav/ndc`
pub async fn ndc_post(State(state): State<SharedState>, Form(form): Form<ConversionForm>) -> Result<Html<String>, ApiError> {
    ndc_page(&state, form).await
}

/// `GET /rxnav/rxcui`
pub async fn rxcui_get(State(state): State<SharedState>, Query(form): Query<ConversionForm>) -> Result<Html<String>, ApiError> {
    rxcui_page(&state, form).await
}

/// `POST /rxnav/rxcui`
pub async fn rxcui_post(State(state): State<SharedState>, Form(form): Form<ConversionForm>) -> Result<Html<String>, ApiError> {
    rxcui_page(&state, form).await
}

/// `POST /rxnav/download`: the conversion result as `result.json`.
pub async fn download(State(state): State<SharedState>, Form(form): Form<DownloadForm>) -> Result<Response, ApiError> {
    let body = match form.mode {
        DownloadMode::Ndc => serde_json::to_string_pretty(&state.rxnav.convert_ndc(&form.value).await?),
        DownloadMode::Rxcui => serde_json::to_string_pretty(&state.rxnav.convert_rxcui(&form.value).await?),
    }
    .map_err(TermlensError::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"result.json\""),
        ],
        body,
    )
        .into_response())
}

//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Uri},
    routing::{get, post},
    Router,
};
use termlens_common::{API_KEY_PARAM, MASK};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::Span;
use url::form_urlencoded;

use crate::handlers::{
    api::{api_details, api_related, api_search},
    browser::{details, index, related, results, search, select},
    health::health,
    rxnav::{download, ndc_get, ndc_post, rxcui_get, rxcui_post},
};
use crate::state::{AppState, SharedState};

const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Request target for logs, with any `apiKey` value masked. Shared links
/// may carry the key in the query string.
fn masked_target(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };
    let mut masked = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = if key == API_KEY_PARAM { MASK } else { value.as_ref() };
        masked.append_pair(&key, value);
    }
    format!("{}?{}", uri.path(), masked.finish())
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        uri = %masked_target(request.uri()),
        version = ?request.version(),
    )
}

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Query page
        .route("/",        get(index))
        .route("/search",  post(search))
        .route("/select",  post(select))
        .route("/results", post(results))
        .route("/details", post(details))
        .route("/related", post(related))

        // JSON API
        .route("/api/search",  post(api_search))
        .route("/api/details", post(api_details))
        .route("/api/related", post(api_related))

        // RxNav conversions
        .route("/rxnav/ndc",      get(ndc_get).post(ndc_post))
        .route("/rxnav/rxcui",    get(rxcui_get).post(rxcui_post))
        .route("/rxnav/download", post(download))

        .route("/health", get(health))

        // Static files
        .nest_service("/static", ServeDir::new(STATIC_DIR))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(shared)
}

//! JSON API: the same transitions as the browser pages, returning the view model.

use axum::{extract::State, Json};
use serde::Deserialize;
use termlens_common::ApiKey;
use termlens_core::{AddressState, QueryParams, RelatedDirection, SelectionContext, Session, View, VocabularyCatalog};
use termlens_sources::{DetailKind, ReturnIdType};

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub api_key: String,
    pub string: String,
    pub return_id_type: ReturnIdType,
    pub sabs: Vec<String>,
}

impl SearchRequest {
    fn params(&self, catalog: &VocabularyCatalog) -> QueryParams {
        QueryParams::new(
            ApiKey::parse(&self.api_key),
            &self.string,
            self.return_id_type,
            catalog.select(self.sabs.iter().map(String::as_str)),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsRequest {
    #[serde(flatten)]
    pub search: SearchRequest,
    pub id: String,
    #[serde(default)]
    pub vocabulary: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    pub kind: DetailKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedRequest {
    #[serde(flatten)]
    pub search: SearchRequest,
    pub url: String,
    pub direction: RelatedDirection,
}

/// `POST /api/search`
pub async fn api_search(
    State(state): State<SharedState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<View>, ApiError> {
    let params = req.params(&state.catalog);
    let mut session = Session::new(params.return_id_type);
    session.search(&state.uts, &params).await?;
    Ok(Json(session.into_view()))
}

/// `POST /api/details`
pub async fn api_details(
    State(state): State<SharedState>,
    Json(req): Json<DetailsRequest>,
) -> Result<Json<View>, ApiError> {
    let params = req.search.params(&state.catalog);
    let selection = SelectionContext {
        selected_id: req.id,
        selected_vocabulary: req.vocabulary,
        uri: req.uri,
    };
    let mut session = Session::restore(AddressState::for_search(&params));
    session
        .fetch_details(&state.uts, params.api_key.as_ref(), selection, req.kind)
        .await?;
    Ok(Json(session.into_view()))
}

/// `POST /api/related`
pub async fn api_related(
    State(state): State<SharedState>,
    Json(req): Json<RelatedRequest>,
) -> Result<Json<View>, ApiError> {
    let params = req.search.params(&state.catalog);
    let address = AddressState::for_search(&params).with_endpoint(DetailKind::Relations);
    let mut session = Session::restore(address);
    session
        .fetch_related(&state.uts, params.api_key.as_ref(), &req.url, req.direction)
        .await?;
    Ok(Json(session.into_view()))
}

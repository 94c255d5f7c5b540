//! Query page: the search form, its results table and the drill-down views.
//!
//! The server keeps nothing between requests. Every form post carries the
//! key, term, return type and vocabularies in its body; the button that was
//! pressed adds what it acts on to the query string. Pages with results also
//! carry the search behind them in hidden fields, which drill-down actions use
//! in place of the editable inputs.

use axum::{
    extract::{Query, RawQuery, State},
    response::Html,
    Form,
};
use serde::Deserialize;
use termlens_common::{ApiKey, TermlensError, API_KEY_PARAM};
use termlens_core::{AddressState, QueryParams, RelatedDirection, SelectionContext, Session, View, VocabularyCatalog};
use termlens_sources::{DetailKind, ReturnIdType};
use tracing::debug;

use crate::error::ApiError;
use crate::render::{self, IndexPage};
use crate::state::{AppState, SharedState};

/// What a row button or option button points at.
#[derive(Debug, Default, Deserialize)]
pub struct ActionParams {
    pub id: Option<String>,
    pub sab: Option<String>,
    pub uri: Option<String>,
    pub kind: Option<String>,
    pub url: Option<String>,
    pub direction: Option<String>,
}

impl ActionParams {
    fn selection(&self) -> Option<SelectionContext> {
        let id = self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
        Some(SelectionContext {
            selected_id: id.to_string(),
            selected_vocabulary: self.sab.clone().filter(|s| !s.is_empty()),
            uri: self.uri.clone().filter(|u| !u.is_empty()),
        })
    }

    fn kind(&self) -> Option<DetailKind> {
        self.kind.as_deref()?.parse().ok()
    }

    fn direction(&self) -> Option<RelatedDirection> {
        self.direction.as_deref()?.parse().ok()
    }
}

/// Form field names for one set of search parameters.
struct SearchFields {
    string: &'static str,
    return_id_type: &'static str,
    sabs: &'static str,
}

/// The editable inputs.
const INPUT_FIELDS: SearchFields = SearchFields {
    string: "string",
    return_id_type: "returnIdType",
    sabs: "sabs",
};

/// Hidden copies of the search behind the displayed table.
const SEARCHED_FIELDS: SearchFields = SearchFields {
    string: "searchedString",
    return_id_type: "searchedReturnIdType",
    sabs: "searchedSabs",
};

/// Reads one set of search fields plus the key. `None` when the term field
/// is absent. `sabs` may repeat (checkboxes) or hold a CSV.
fn read_fields(pairs: &[(String, String)], catalog: &VocabularyCatalog, fields: &SearchFields) -> Option<QueryParams> {
    let mut api_key = None;
    let mut term = None;
    let mut return_id_type = ReturnIdType::default();
    let mut sabs: Vec<&str> = Vec::new();
    for (key, value) in pairs {
        let key = key.as_str();
        if key == API_KEY_PARAM {
            api_key = ApiKey::parse(value);
        } else if key == fields.string {
            term = Some(value.as_str());
        } else if key == fields.return_id_type {
            return_id_type = value.parse().unwrap_or_default();
        } else if key == fields.sabs {
            sabs.extend(value.split(','));
        }
    }
    Some(QueryParams::new(api_key, term?, return_id_type, catalog.select(sabs)))
}

/// Reads the query form inputs.
pub fn query_params(pairs: &[(String, String)], catalog: &VocabularyCatalog) -> QueryParams {
    read_fields(pairs, catalog, &INPUT_FIELDS).unwrap_or_else(|| {
        let api_key = pairs
            .iter()
            .find(|(k, _)| k == API_KEY_PARAM)
            .and_then(|(_, v)| ApiKey::parse(v));
        QueryParams::new(api_key, "", ReturnIdType::default(), Vec::new())
    })
}

/// The search behind the displayed table, when the page showed one.
pub fn searched_params(pairs: &[(String, String)], catalog: &VocabularyCatalog) -> Option<QueryParams> {
    read_fields(pairs, catalog, &SEARCHED_FIELDS)
}

/// Drill-down actions act on the displayed results, not on edited inputs.
fn drill_down_params(pairs: &[(String, String)], catalog: &VocabularyCatalog) -> QueryParams {
    searched_params(pairs, catalog).unwrap_or_else(|| query_params(pairs, catalog))
}

fn page(state: &AppState, view: &View, params: &QueryParams, hint: Option<String>) -> Result<Html<String>, ApiError> {
    let page = IndexPage::new(view, params, &state.catalog, hint);
    Ok(Html(render::render(&state.templates, "index.html", &page)?))
}

/// `GET /`: restores the form from a shared link. Nothing is fetched.
pub async fn index(State(state): State<SharedState>, RawQuery(query): RawQuery) -> Result<Html<String>, ApiError> {
    let restored = AddressState::parse(query.as_deref().unwrap_or_default(), &state.catalog);
    let params = restored.query_params();
    let hint = render::restored_hint(&restored.address);
    let session = Session::restore(restored.address);
    page(&state, session.view(), &params, hint)
}

/// `POST /search`
pub async fn search(
    State(state): State<SharedState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, ApiError> {
    let params = query_params(&pairs, &state.catalog);
    let mut session = Session::new(params.return_id_type);
    if let Err(e) = session.search(&state.uts, &params).await {
        debug!(error = %e, "search ended without results");
    }
    page(&state, session.view(), &params, None)
}

/// `POST /select`: redraws the displayed results and opens the options for
/// one of their rows.
pub async fn select(
    State(state): State<SharedState>,
    Query(action): Query<ActionParams>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, ApiError> {
    let selection = action
        .selection()
        .ok_or_else(|| TermlensError::missing("No result was selected."))?;
    let searched = searched_params(&pairs, &state.catalog);
    let params = searched.clone().unwrap_or_else(|| query_params(&pairs, &state.catalog));
    let mut session = Session::new(params.return_id_type);
    let redrawn = match &searched {
        Some(searched) => session.search(&state.uts, searched).await.map(|_| ()),
        // No results were on the page; select refuses below.
        None => Ok(()),
    };
    match redrawn {
        Ok(()) => {
            if let Err(e) = session.select(selection) {
                debug!(error = %e, "selection refused");
            }
        }
        Err(e) => debug!(error = %e, "results unavailable, options not shown"),
    }
    page(&state, session.view(), &params, None)
}

/// `POST /results`: "Back to results" from a detail view.
pub async fn results(
    State(state): State<SharedState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, ApiError> {
    let params = drill_down_params(&pairs, &state.catalog);
    let mut session = Session::new(params.return_id_type);
    if let Err(e) = session.search(&state.uts, &params).await {
        debug!(error = %e, "results unavailable");
    }
    page(&state, session.view(), &params, None)
}

/// `POST /details`
pub async fn details(
    State(state): State<SharedState>,
    Query(action): Query<ActionParams>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, ApiError> {
    let params = drill_down_params(&pairs, &state.catalog);
    let (Some(selection), Some(kind)) = (action.selection(), action.kind()) else {
        return Err(TermlensError::missing("Choose a result and a detail view first.").into());
    };
    let mut session = Session::restore(AddressState::for_search(&params));
    if let Err(e) = session
        .fetch_details(&state.uts, params.api_key.as_ref(), selection, kind)
        .await
    {
        debug!(error = %e, kind = %kind, "detail fetch ended without records");
    }
    page(&state, session.view(), &params, None)
}

/// `POST /related`: follows a relation endpoint out of the relations table.
pub async fn related(
    State(state): State<SharedState>,
    Query(action): Query<ActionParams>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, ApiError> {
    let params = drill_down_params(&pairs, &state.catalog);
    let (Some(url), Some(direction)) = (action.url.as_deref(), action.direction()) else {
        return Err(TermlensError::missing("No related entity was chosen.").into());
    };
    let address = AddressState::for_search(&params).with_endpoint(DetailKind::Relations);
    let mut session = Session::restore(address);
    if let Err(e) = session
        .fetch_related(&state.uts, params.api_key.as_ref(), url, direction)
        .await
    {
        debug!(error = %e, direction = %direction, "related fetch ended without data");
    }
    page(&state, session.view(), &params, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_query_params_from_form() {
        let catalog = VocabularyCatalog::new(["SNOMEDCT_US", "ICD10CM", "MSH"]);
        let form = pairs(&[
            ("apiKey", " k "),
            ("string", "asthma"),
            ("returnIdType", "code"),
            ("sabs", "MSH"),
            ("sabs", "SNOMEDCT_US,BOGUS"),
        ]);
        let params = query_params(&form, &catalog);
        assert_eq!(params.api_key.as_ref().map(ApiKey::expose), Some("k"));
        assert_eq!(params.term, "asthma");
        assert_eq!(params.return_id_type, ReturnIdType::Code);
        assert_eq!(params.vocabularies, vec!["SNOMEDCT_US", "MSH"]);
    }

    #[test]
    fn test_action_params() {
        let action = ActionParams {
            id: Some("C1".into()),
            sab: Some(String::new()),
            kind: Some("relations".into()),
            direction: Some("sideways".into()),
            ..Default::default()
        };
        let selection = action.selection().unwrap();
        assert_eq!(selection.selected_vocabulary, None);
        assert_eq!(action.kind(), Some(DetailKind::Relations));
        assert_eq!(action.direction(), None);
        assert!(ActionParams::default().selection().is_none());
    }

    #[test]
    fn test_searched_fields_are_separate_from_inputs() {
        let catalog = VocabularyCatalog::new(["SNOMEDCT_US", "MSH"]);
        let form = pairs(&[
            ("apiKey", "k"),
            ("string", "asthma"),
            ("returnIdType", "concept"),
            ("searchedString", "flu"),
            ("searchedReturnIdType", "code"),
            ("searchedSabs", "MSH"),
        ]);
        let searched = searched_params(&form, &catalog).unwrap();
        assert_eq!(searched.term, "flu");
        assert_eq!(searched.return_id_type, ReturnIdType::Code);
        assert_eq!(searched.vocabularies, vec!["MSH"]);
        assert_eq!(searched.api_key.as_ref().map(ApiKey::expose), Some("k"));
        assert_eq!(drill_down_params(&form, &catalog).term, "flu");
        assert_eq!(query_params(&form, &catalog).term, "asthma");

        let inputs_only = pairs(&[("apiKey", "k"), ("string", "asthma")]);
        assert!(searched_params(&inputs_only, &catalog).is_none());
        assert_eq!(drill_down_params(&inputs_only, &catalog).term, "asthma");
    }
}

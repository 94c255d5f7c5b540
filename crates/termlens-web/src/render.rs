//! Template environment and page contexts.
//!
//! Templates are compiled into the binary and auto-escaped. Link targets
//! (`formaction` URLs) are built here so templates never encode anything.

use minijinja::{context, Environment};
use serde::Serialize;
use termlens_common::{ApiKey, Result, TermlensError};
use termlens_core::{
    AddressState, CellAction, NoticeKind, Output, Phase, QueryParams, RelatedDirection, Row, SelectionContext,
    Table, View, VocabularyCatalog,
};
use termlens_sources::models::{NdcConversion, RxcuiConversion};
use termlens_sources::rxnav::{rxnav_browser_link, RXNAV_DOCS_URL, TERM_TYPES};
use termlens_sources::{DetailKind, RequestTrace};
use url::form_urlencoded;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("rxnav.html", include_str!("../templates/rxnav.html")),
];

pub fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)
            .map_err(|e| TermlensError::Other(anyhow::Error::new(e)))?;
    }
    Ok(env)
}

pub fn render<S: Serialize>(env: &Environment<'_>, name: &str, page: &S) -> std::result::Result<String, minijinja::Error> {
    env.get_template(name)?.render(context! { page => page })
}

// ── Action URLs ───────────────────────────────────────────────────────────

fn action(path: &str, pairs: &[(&str, &str)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        query.append_pair(k, v);
    }
    format!("{path}?{}", query.finish())
}

fn selection_pairs(selection: &SelectionContext) -> Vec<(&str, &str)> {
    let mut pairs = vec![("id", selection.selected_id.as_str())];
    if let Some(sab) = &selection.selected_vocabulary {
        pairs.push(("sab", sab.as_str()));
    }
    if let Some(uri) = &selection.uri {
        pairs.push(("uri", uri.as_str()));
    }
    pairs
}

pub fn select_action(selection: &SelectionContext) -> String {
    action("/select", &selection_pairs(selection))
}

pub fn details_action(selection: &SelectionContext, kind: DetailKind) -> String {
    let mut pairs = vec![("kind", kind.as_str())];
    pairs.extend(selection_pairs(selection));
    action("/details", &pairs)
}

pub fn related_action(url: &str, direction: RelatedDirection) -> String {
    action("/related", &[("url", url), ("direction", direction.as_str())])
}

// ── Query page ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct VocabularyOption {
    pub code: String,
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    /// Echoed back into the password field of the same page only.
    pub api_key: String,
    pub term: String,
    pub code_mode: bool,
    pub vocabularies: Vec<VocabularyOption>,
}

impl FormView {
    pub fn new(params: &QueryParams, catalog: &VocabularyCatalog) -> Self {
        Self {
            api_key: params.api_key.as_ref().map(ApiKey::expose).unwrap_or_default().to_string(),
            term: params.term.clone(),
            code_mode: params.return_id_type.uses_vocabularies(),
            vocabularies: catalog
                .codes()
                .iter()
                .map(|code| VocabularyOption {
                    code: code.clone(),
                    checked: params.vocabularies.contains(code),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CellView {
    pub text: String,
    pub formaction: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoticeView {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RowView {
    pub notice: Option<NoticeView>,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub width: usize,
    pub rows: Vec<RowView>,
}

impl From<&Table> for TableView {
    fn from(table: &Table) -> Self {
        let rows = table
            .rows
            .iter()
            .map(|row| match row {
                Row::Notice { kind, text } => RowView {
                    notice: Some(NoticeView { kind: *kind, text: text.clone() }),
                    cells: Vec::new(),
                },
                Row::Data { cells } => RowView {
                    notice: None,
                    cells: cells
                        .iter()
                        .map(|cell| CellView {
                            text: cell.text.clone(),
                            formaction: cell.action.as_ref().map(|a| match a {
                                CellAction::Select(selection) => select_action(selection),
                                CellAction::Related { url, direction } => related_action(url, *direction),
                            }),
                        })
                        .collect(),
                },
            })
            .collect();
        Self {
            headers: table.headers.clone(),
            width: table.width(),
            rows,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailOption {
    pub label: &'static str,
    pub formaction: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionView {
    pub id: String,
    pub options: Vec<DetailOption>,
}

/// The search behind the displayed table, echoed into hidden fields.
#[derive(Debug, PartialEq, Serialize)]
pub struct SearchedView {
    pub string: String,
    pub return_id_type: &'static str,
    pub sabs: String,
}

impl SearchedView {
    fn from_view(view: &View) -> Option<Self> {
        if view.phase == Phase::Idle {
            return None;
        }
        let string = view.address.string.clone()?;
        Some(Self {
            string,
            return_id_type: view.address.return_id_type.unwrap_or_default().as_str(),
            sabs: view.address.sabs.join(","),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub form: FormView,
    pub phase: Phase,
    pub output: Output,
    pub trace: Option<RequestTrace>,
    pub table: TableView,
    pub alert: Option<String>,
    pub selection: Option<SelectionView>,
    pub searched: Option<SearchedView>,
    /// Shareable address pushed into the browser history.
    pub href: String,
    pub restored_hint: Option<String>,
    pub show_back: bool,
}

impl IndexPage {
    pub fn new(view: &View, params: &QueryParams, catalog: &VocabularyCatalog, restored_hint: Option<String>) -> Self {
        let selection = view.selection.as_ref().map(|selection| SelectionView {
            id: selection.selected_id.clone(),
            options: view
                .detail_options
                .iter()
                .map(|kind| DetailOption {
                    label: kind.title(),
                    formaction: details_action(selection, *kind),
                })
                .collect(),
        });
        let in_detail = view.address.endpoint.is_some() || view.address.related.is_some();
        Self {
            form: FormView::new(params, catalog),
            phase: view.phase,
            output: view.output.clone(),
            trace: view.trace.clone(),
            table: TableView::from(&view.table),
            alert: view.alert.clone(),
            selection,
            searched: SearchedView::from_view(view),
            href: view.address.href(),
            restored_hint,
            show_back: in_detail && view.phase != Phase::Idle,
        }
    }
}

/// Describes the detail view a shared link pointed at.
pub fn restored_hint(address: &AddressState) -> Option<String> {
    if !address.has_restorable_view() {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(kind) = address.endpoint {
        parts.push(kind.title().to_lowercase());
    }
    match (address.related, &address.related_id) {
        (Some(direction), Some(id)) => parts.push(format!("related {direction} entity {id}")),
        (Some(direction), None) => parts.push(format!("related {direction} entity")),
        (None, Some(id)) => parts.push(format!("entity {id}")),
        (None, None) => {}
    }
    Some(format!(
        "This link was showing {}. Search again and pick the result to reopen it.",
        parts.join(", ")
    ))
}

// ── RxNav page ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TermType {
    pub code: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Default, Serialize)]
pub struct RxNavPage {
    pub ndc: String,
    pub rxcui: String,
    pub show_urls: bool,
    pub ndc_result: Option<NdcConversion>,
    pub rxcui_result: Option<RxcuiConversion>,
    pub rxnav_link: Option<String>,
    pub error: Option<String>,
    pub term_types: Vec<TermType>,
    pub docs_url: &'static str,
}

impl RxNavPage {
    pub fn new(show_urls: bool) -> Self {
        Self {
            show_urls,
            term_types: TERM_TYPES.iter().map(|&(code, label)| TermType { code, label }).collect(),
            docs_url: RXNAV_DOCS_URL,
            ..Self::default()
        }
    }

    pub fn with_ndc_result(mut self, result: NdcConversion) -> Self {
        self.rxnav_link = Some(rxnav_browser_link(&result.rxcui));
        self.ndc_result = Some(result);
        self
    }

    pub fn with_rxcui_result(mut self, result: RxcuiConversion) -> Self {
        self.rxnav_link = Some(rxnav_browser_link(&result.rxcui));
        self.rxcui_result = Some(result);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use termlens_core::Session;
    use termlens_sources::ReturnIdType;

    #[test]
    fn test_templates_compile() {
        let env = environment().unwrap();
        for (name, _) in TEMPLATES {
            assert!(env.get_template(name).is_ok(), "{name} failed to load");
        }
    }

    #[test]
    fn test_action_urls_are_encoded() {
        let selection = SelectionContext {
            selected_id: "195967001".into(),
            selected_vocabulary: Some("SNOMEDCT_US".into()),
            uri: Some("https://uts-ws.nlm.nih.gov/rest/content/current/source/SNOMEDCT_US/195967001".into()),
        };
        assert_eq!(
            details_action(&selection, DetailKind::Atoms),
            "/details?kind=atoms&id=195967001&sab=SNOMEDCT_US&uri=https%3A%2F%2Futs-ws.nlm.nih.gov%2Frest%2Fcontent%2Fcurrent%2Fsource%2FSNOMEDCT_US%2F195967001"
        );
        assert_eq!(select_action(&SelectionContext::new("C1")), "/select?id=C1");
        assert_eq!(
            related_action("https://h/CUI/C2", RelatedDirection::To),
            "/related?url=https%3A%2F%2Fh%2FCUI%2FC2&direction=to"
        );
    }

    #[test]
    fn test_form_view_checks_selected_vocabularies() {
        let catalog = VocabularyCatalog::new(["SNOMEDCT_US", "MSH"]);
        let params = QueryParams::new(None, "flu", ReturnIdType::Code, vec!["MSH".into()]);
        let form = FormView::new(&params, &catalog);
        assert!(form.code_mode);
        assert_eq!(form.api_key, "");
        let checked: Vec<bool> = form.vocabularies.iter().map(|v| v.checked).collect();
        assert_eq!(checked, vec![false, true]);
    }

    #[test]
    fn test_restored_hint() {
        let catalog = VocabularyCatalog::new(["MSH"]);
        let address = AddressState::parse("string=x&endpoint=relations&related=to&relatedId=C2", &catalog).address;
        assert_eq!(
            restored_hint(&address).as_deref(),
            Some("This link was showing relations, related to entity C2. Search again and pick the result to reopen it.")
        );
        assert_eq!(restored_hint(&AddressState::default()), None);
    }

    #[test]
    fn test_searched_view_only_after_a_search() {
        let catalog = VocabularyCatalog::new(["MSH", "ICD10CM"]);
        let restored = AddressState::parse("string=flu&returnIdType=code&sabs=MSH", &catalog);
        let idle = Session::restore(restored.address.clone());
        assert_eq!(SearchedView::from_view(idle.view()), None);

        let mut view = idle.into_view();
        view.phase = Phase::Results;
        assert_eq!(
            SearchedView::from_view(&view),
            Some(SearchedView {
                string: "flu".into(),
                return_id_type: "code",
                sabs: "MSH".into(),
            })
        );
    }
}

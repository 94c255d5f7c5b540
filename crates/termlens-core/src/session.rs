//! Per-session state machine.
//!
//! ```text
//! Idle ──search──▶ Searching ──▶ Results | Error
//! Results ──select──▶ Results (options view open)
//! Results ──details──▶ DetailLoading ──▶ DetailResults | Error
//! DetailResults ──related──▶ DetailLoading
//! DetailResults | Error ──close──▶ Results (last search table)
//! ```
//!
//! Each `begin_*` transition returns a [`Ticket`] for its one network call.
//! Completions are applied only when their ticket is the latest one issued;
//! anything older is dropped.

use serde::Serialize;
use serde_json::Value;
use termlens_common::{ApiKey, ErrorKind, Result, TermlensError};
use termlens_sources::models::{DetailRecords, RelatedPayload, SearchHit};
use termlens_sources::uts::Fetched;
use termlens_sources::{DetailKind, PreparedRequest, RequestTrace, ReturnIdType, UtsClient};
use tracing::{debug, warn};

use crate::address::AddressState;
use crate::query::{QueryParams, MISSING_API_KEY};
use crate::selection::{RelatedDirection, SelectionContext};
use crate::table::{NoticeKind, Table};

pub const NOT_IN_RESULTS: &str = "That result is not in the current table. Run the search again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Searching,
    Results,
    DetailLoading,
    DetailResults,
    Error,
}

/// Text area above the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Output {
    Empty,
    Status(String),
    /// Pretty-printed response body.
    Raw(String),
    Error(String),
}

/// Everything a page needs to render the session.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub phase: Phase,
    pub return_id_type: ReturnIdType,
    pub output: Output,
    pub table: Table,
    /// Masked trace of the last request sent.
    pub trace: Option<RequestTrace>,
    pub address: AddressState,
    /// Blocking message for input that never reached the network.
    pub alert: Option<String>,
    /// Open options view.
    pub selection: Option<SelectionContext>,
    pub detail_options: Vec<DetailKind>,
}

impl View {
    fn idle(return_id_type: ReturnIdType, address: AddressState) -> Self {
        Self {
            phase: Phase::Idle,
            return_id_type,
            output: Output::Empty,
            table: Table::initial(return_id_type),
            trace: None,
            address,
            alert: None,
            selection: None,
            detail_options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum Effect {
    Search,
    Details { kind: DetailKind, selected_id: String },
    Related { direction: RelatedDirection },
}

/// Handle for one in-flight request.
#[derive(Debug)]
pub struct Ticket {
    generation: u64,
    request: PreparedRequest,
    key: ApiKey,
    effect: Effect,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    fn describe(&self) -> String {
        match &self.effect {
            Effect::Search => "search".to_string(),
            Effect::Details { kind, .. } => kind.to_string(),
            Effect::Related { direction } => format!("related {direction}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    view: View,
    generation: u64,
    /// View as it was when the last search completed.
    last_results: Option<View>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ReturnIdType::default())
    }
}

impl Session {
    pub fn new(return_id_type: ReturnIdType) -> Self {
        Self {
            view: View::idle(return_id_type, AddressState::default()),
            generation: 0,
            last_results: None,
        }
    }

    /// Idle session restored from a link; nothing is fetched.
    pub fn restore(address: AddressState) -> Self {
        let return_id_type = address.return_id_type.unwrap_or_default();
        Self {
            view: View::idle(return_id_type, address),
            generation: 0,
            last_results: None,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn into_view(self) -> View {
        self.view
    }

    pub fn phase(&self) -> Phase {
        self.view.phase
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
    }

    // ── Transitions ───────────────────────────────────────────────────────

    pub fn begin_search(&mut self, client: &UtsClient, params: &QueryParams) -> Result<Ticket> {
        let (key, term) = match params.require_search_input() {
            Ok(input) => input,
            Err(e) => return Err(self.alert(e)),
        };
        let id_type = params.return_id_type;
        let request = client.prepare_search(key, term, id_type, params.effective_vocabularies());
        let ticket = self.issue(request, key, Effect::Search);

        self.view = View {
            phase: Phase::Searching,
            output: Output::Status("Loading...".to_string()),
            trace: Some(ticket.request.trace().clone()),
            address: AddressState::for_search(params),
            ..View::idle(id_type, AddressState::default())
        };
        self.last_results = None;
        Ok(ticket)
    }

    pub fn complete_search(&mut self, ticket: &Ticket, result: &Result<Fetched<Vec<SearchHit>>>) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(fetched) => {
                self.view.phase = Phase::Results;
                self.view.output = Output::Raw(pretty(&fetched.raw));
                self.view.table = Table::search_results(&fetched.data, self.view.return_id_type);
                self.last_results = Some(self.view.clone());
            }
            Err(e) => self.fail(ticket, e, "Error fetching data", "Error loading data.".to_string()),
        }
        true
    }

    /// Opens the options view for a row of the displayed results. Ids that
    /// are not in the results table are refused with an alert.
    pub fn select(&mut self, selection: SelectionContext) -> Result<&[DetailKind]> {
        if self.view.phase != Phase::Results || !self.view.table.offers_selection(&selection.selected_id) {
            return Err(self.alert(TermlensError::missing(NOT_IN_RESULTS)));
        }
        self.view.alert = None;
        self.view.selection = Some(selection);
        self.view.detail_options = DetailKind::offered_for(self.view.return_id_type);
        Ok(&self.view.detail_options)
    }

    pub fn close_selection(&mut self) {
        self.view.selection = None;
        self.view.detail_options.clear();
    }

    /// Consumes the selection; the options view is closed either way.
    pub fn begin_details(
        &mut self,
        client: &UtsClient,
        key: Option<&ApiKey>,
        selection: SelectionContext,
        kind: DetailKind,
    ) -> Result<Ticket> {
        self.close_selection();
        let Some(key) = key else {
            return Err(self.alert(TermlensError::missing(MISSING_API_KEY)));
        };
        let prepared = match self.view.return_id_type {
            ReturnIdType::Concept => client.prepare_concept_detail(key, &selection.selected_id, kind),
            ReturnIdType::Code => client.prepare_code_detail(
                key,
                &selection.selected_id,
                selection.uri.as_deref(),
                selection.selected_vocabulary.as_deref(),
                kind,
            ),
        };
        let request = match prepared {
            Ok(request) => request,
            Err(e) => {
                let prefix = format!("Error fetching {kind}");
                return Err(self.refuse(e, key, &prefix, format!("Error loading {kind}."), Table::detail_headers(kind)));
            }
        };

        let address = self.view.address.with_endpoint(kind);
        let status = format!("Loading {kind} for {}...", selection.selected_id);
        let ticket = self.issue(
            request,
            key,
            Effect::Details {
                kind,
                selected_id: selection.selected_id,
            },
        );
        self.loading(&ticket, address, status, Table::detail_headers(kind));
        Ok(ticket)
    }

    pub fn complete_details(&mut self, ticket: &Ticket, result: &Result<Fetched<DetailRecords>>) -> bool {
        let Effect::Details { kind, selected_id } = &ticket.effect else {
            warn!(ticket = ticket.generation, "details completion with a non-detail ticket");
            return false;
        };
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(fetched) => {
                self.view.phase = Phase::DetailResults;
                self.view.output = Output::Raw(pretty(&fetched.raw));
                self.view.table = Table::details(&fetched.data, selected_id);
            }
            Err(e) => {
                let prefix = format!("Error fetching {kind}");
                self.fail(ticket, e, &prefix, format!("Error loading {kind}."));
            }
        }
        true
    }

    /// Follows one end of a relation row.
    pub fn begin_related(
        &mut self,
        client: &UtsClient,
        key: Option<&ApiKey>,
        url: &str,
        direction: RelatedDirection,
    ) -> Result<Ticket> {
        self.close_selection();
        let Some(key) = key else {
            return Err(self.alert(TermlensError::missing(MISSING_API_KEY)));
        };
        let request = match client.prepare_related(key, url) {
            Ok(request) => request,
            Err(e) => {
                let prefix = format!("Error fetching related {direction}");
                return Err(self.refuse(
                    e,
                    key,
                    &prefix,
                    format!("Error loading related {direction}."),
                    Table::related_headers(),
                ));
            }
        };

        let address = self.view.address.with_related(direction, url);
        let status = format!("Loading related {direction} information...");
        let ticket = self.issue(request, key, Effect::Related { direction });
        self.loading(&ticket, address, status, Table::related_headers());
        Ok(ticket)
    }

    pub fn complete_related(&mut self, ticket: &Ticket, result: &Result<Fetched<RelatedPayload>>) -> bool {
        let Effect::Related { direction } = ticket.effect else {
            warn!(ticket = ticket.generation, "related completion with a non-related ticket");
            return false;
        };
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(fetched) => {
                self.view.phase = Phase::DetailResults;
                self.view.output = Output::Raw(pretty(&fetched.raw));
                self.view.table = Table::related(&fetched.data);
            }
            Err(e) => {
                let prefix = format!("Error fetching related {direction}");
                self.fail(ticket, e, &prefix, format!("Error loading related {direction}."));
            }
        }
        true
    }

    /// Back to the last search table. Any detail request still in flight is
    /// dropped when it lands.
    pub fn close_detail(&mut self) -> bool {
        if !matches!(self.view.phase, Phase::DetailLoading | Phase::DetailResults | Phase::Error) {
            return false;
        }
        let Some(results) = &self.last_results else {
            return false;
        };
        self.generation += 1;
        self.view = results.clone();
        true
    }

    // ── One transition plus its effect ───────────────────────────────────

    pub async fn search(&mut self, client: &UtsClient, params: &QueryParams) -> Result<Vec<SearchHit>> {
        let ticket = self.begin_search(client, params)?;
        let result = client.search(ticket.request()).await;
        self.complete_search(&ticket, &result);
        result.map(|fetched| fetched.data)
    }

    pub async fn fetch_details(
        &mut self,
        client: &UtsClient,
        key: Option<&ApiKey>,
        selection: SelectionContext,
        kind: DetailKind,
    ) -> Result<DetailRecords> {
        let ticket = self.begin_details(client, key, selection, kind)?;
        let result = client.details(ticket.request(), kind).await;
        self.complete_details(&ticket, &result);
        result.map(|fetched| fetched.data)
    }

    pub async fn fetch_related(
        &mut self,
        client: &UtsClient,
        key: Option<&ApiKey>,
        url: &str,
        direction: RelatedDirection,
    ) -> Result<RelatedPayload> {
        let ticket = self.begin_related(client, key, url, direction)?;
        let result = client.related(ticket.request()).await;
        self.complete_related(&ticket, &result);
        result.map(|fetched| fetched.data)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn issue(&mut self, request: PreparedRequest, key: &ApiKey, effect: Effect) -> Ticket {
        self.generation += 1;
        debug!(generation = self.generation, url = %request.trace(), "request issued");
        Ticket {
            generation: self.generation,
            request,
            key: key.clone(),
            effect,
        }
    }

    fn accept(&self, ticket: &Ticket) -> bool {
        if self.is_current(ticket) {
            return true;
        }
        debug!(
            ticket = ticket.generation,
            current = self.generation,
            action = %ticket.describe(),
            "discarding stale completion"
        );
        false
    }

    fn loading(&mut self, ticket: &Ticket, address: AddressState, status: String, headers: Vec<String>) {
        self.view.phase = Phase::DetailLoading;
        self.view.output = Output::Status(status);
        self.view.table = Table::loading(headers);
        self.view.trace = Some(ticket.request.trace().clone());
        self.view.address = address;
        self.view.alert = None;
    }

    /// Input problems leave the table and trace untouched.
    fn alert(&mut self, err: TermlensError) -> TermlensError {
        warn!(error = %err, "action blocked");
        self.view.alert = Some(err.to_string());
        err
    }

    /// A request that could not be built: input problems become an alert,
    /// anything else is shown like a failed fetch.
    fn refuse(
        &mut self,
        err: TermlensError,
        key: &ApiKey,
        prefix: &str,
        row: String,
        headers: Vec<String>,
    ) -> TermlensError {
        if err.kind() == ErrorKind::MissingInput {
            return self.alert(err);
        }
        self.generation += 1;
        let message = key.redact(&err.to_string());
        warn!(error = %message, "request could not be built");
        self.view.phase = Phase::Error;
        self.view.output = Output::Error(format!("{prefix}: {message}"));
        self.view.table = Table::notice(headers, NoticeKind::Error, row);
        err
    }

    fn fail(&mut self, ticket: &Ticket, err: &TermlensError, prefix: &str, row: String) {
        let message = ticket.key.redact(&err.to_string());
        warn!(action = %ticket.describe(), error = %message, "request failed");
        self.view.phase = Phase::Error;
        self.view.output = Output::Error(format!("{prefix}: {message}"));
        let headers = self.view.table.headers.clone();
        self.view.table = Table::notice(headers, NoticeKind::Error, row);
    }
}

fn pretty(raw: &Value) -> String {
    serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string())
}

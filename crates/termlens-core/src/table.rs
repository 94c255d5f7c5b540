//! Response → table mapping.
//!
//! Missing fields become placeholders; a table never mixes data rows with a
//! notice row.

use serde::Serialize;
use termlens_sources::models::{DetailRecords, RelatedPayload, SearchHit};
use termlens_sources::{DetailKind, ReturnIdType};

use crate::selection::{RelatedDirection, SelectionContext};

const NA: &str = "N/A";
const INITIAL: &str = "No information yet...";
const LOADING: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CellAction {
    /// Opens the detail options for a search hit.
    Select(SelectionContext),
    /// Follows one end of a relation.
    Related { url: String, direction: RelatedDirection },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    pub action: Option<CellAction>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), action: None }
    }

    fn or(value: &Option<String>, placeholder: &str) -> Self {
        Self::text(value.clone().unwrap_or_else(|| placeholder.to_string()))
    }

    fn with_action(mut self, action: Option<CellAction>) -> Self {
        self.action = action;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Placeholder,
    Loading,
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Row {
    Data { cells: Vec<Cell> },
    Notice { kind: NoticeKind, text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn notice(headers: Vec<String>, kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            headers,
            rows: vec![Row::Notice { kind, text: text.into() }],
        }
    }

    fn data(headers: Vec<String>, rows: Vec<Vec<Cell>>, empty_text: String) -> Self {
        if rows.is_empty() {
            return Self::notice(headers, NoticeKind::Empty, empty_text);
        }
        Self {
            headers,
            rows: rows.into_iter().map(|cells| Row::Data { cells }).collect(),
        }
    }

    /// Search headers; Root Source only for code searches.
    pub fn search_headers(id_type: ReturnIdType) -> Vec<String> {
        let mut headers = vec!["UI".to_string(), "Name".to_string()];
        if id_type.uses_vocabularies() {
            headers.push("Root Source".to_string());
        }
        headers
    }

    pub fn detail_headers(kind: DetailKind) -> Vec<String> {
        let headers: &[&str] = match kind {
            DetailKind::Atoms => &["Name", "Root Source"],
            DetailKind::Definitions => &["Definition", "Root Source"],
            DetailKind::Relations => &["From Name", "Relation Label", "To Name", "Root Source"],
        };
        headers.iter().map(|h| h.to_string()).collect()
    }

    pub fn related_headers() -> Vec<String> {
        vec!["Name".to_string(), "Root Source".to_string(), "UI".to_string()]
    }

    /// Empty search table shown before the first search.
    pub fn initial(id_type: ReturnIdType) -> Self {
        Self::notice(Self::search_headers(id_type), NoticeKind::Placeholder, INITIAL)
    }

    pub fn loading(headers: Vec<String>) -> Self {
        Self::notice(headers, NoticeKind::Loading, LOADING)
    }

    /// One row per hit, in response order. Identifiers link to the options view.
    pub fn search_results(hits: &[SearchHit], id_type: ReturnIdType) -> Self {
        let code_mode = id_type.uses_vocabularies();
        let rows = hits
            .iter()
            .map(|hit| {
                let select = SelectionContext::from_hit(hit).map(CellAction::Select);
                let mut cells = vec![Cell::or(&hit.ui, NA).with_action(select), Cell::or(&hit.name, NA)];
                if code_mode {
                    cells.push(Cell::or(&hit.root_source, NA));
                }
                cells
            })
            .collect();
        Self::data(Self::search_headers(id_type), rows, "No results found.".to_string())
    }

    pub fn details(records: &DetailRecords, selected_id: &str) -> Self {
        let kind = records.kind();
        let rows: Vec<Vec<Cell>> = match records {
            DetailRecords::Atoms(atoms) => atoms
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    vec![
                        Cell::or(&a.name, &format!("(Atom #{})", i + 1)),
                        Cell::or(&a.root_source, "(no rootSource)"),
                    ]
                })
                .collect(),
            DetailRecords::Definitions(defs) => defs
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    vec![
                        Cell::or(&d.value, &format!("(Definition #{})", i + 1)),
                        Cell::or(&d.root_source, "(no rootSource)"),
                    ]
                })
                .collect(),
            DetailRecords::Relations(relations) => relations
                .iter()
                .map(|r| {
                    let from = r.from_id.as_ref().map(|url| CellAction::Related {
                        url: url.clone(),
                        direction: RelatedDirection::From,
                    });
                    let to = r.to_id.as_ref().map(|url| CellAction::Related {
                        url: url.clone(),
                        direction: RelatedDirection::To,
                    });
                    vec![
                        Cell::or(&r.from_name, "(no relatedFromIdName)").with_action(from),
                        Cell::or(&r.relation_label, "(no relation label)"),
                        Cell::or(&r.to_name, "(no relatedIdName)").with_action(to),
                        Cell::or(&r.root_source, "(no rootSource)"),
                    ]
                })
                .collect(),
        };
        Self::data(Self::detail_headers(kind), rows, format!("No {kind} found for this {selected_id}."))
    }

    /// Related entities, or a field/value dump when the body held one object.
    pub fn related(payload: &RelatedPayload) -> Self {
        const EMPTY: &str = "No data found for the selected concept.";
        match payload {
            RelatedPayload::Entities(entities) => {
                let rows = entities
                    .iter()
                    .map(|e| vec![Cell::or(&e.name, NA), Cell::or(&e.root_source, NA), Cell::or(&e.ui, NA)])
                    .collect();
                Self::data(Self::related_headers(), rows, EMPTY.to_string())
            }
            RelatedPayload::Fields(fields) => {
                let rows = fields
                    .iter()
                    .map(|(k, v)| vec![Cell::text(k.as_str()), Cell::text(v.as_str())])
                    .collect();
                Self::data(vec!["Field".to_string(), "Value".to_string()], rows, EMPTY.to_string())
            }
            RelatedPayload::Empty => Self::notice(Self::related_headers(), NoticeKind::Empty, EMPTY),
        }
    }

    /// True when a data row links to the result `id`.
    pub fn offers_selection(&self, id: &str) -> bool {
        self.rows.iter().any(|row| match row {
            Row::Data { cells } => cells
                .iter()
                .any(|cell| matches!(&cell.action, Some(CellAction::Select(s)) if s.selected_id == id)),
            Row::Notice { .. } => false,
        })
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.iter().filter(|r| matches!(r, Row::Data { .. })).count()
    }

    /// The notice row, when the table holds one instead of data.
    pub fn notice_row(&self) -> Option<(NoticeKind, &str)> {
        self.rows.iter().find_map(|r| match r {
            Row::Notice { kind, text } => Some((*kind, text.as_str())),
            Row::Data { .. } => None,
        })
    }

    /// Column span for notice rows.
    pub fn width(&self) -> usize {
        self.headers.len().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use termlens_sources::models::{Atom, Definition, RelatedEntity, Relation};

    fn hit(ui: &str, name: &str) -> SearchHit {
        SearchHit {
            ui: Some(ui.into()),
            name: Some(name.into()),
            root_source: Some("MTH".into()),
            uri: None,
        }
    }

    #[test]
    fn test_search_rows_preserve_order() {
        let hits = vec![hit("C1", "first"), hit("C2", "second"), hit("C3", "third")];
        let table = Table::search_results(&hits, ReturnIdType::Concept);
        assert_eq!(table.headers, vec!["UI", "Name"]);
        assert_eq!(table.data_row_count(), 3);
        let names: Vec<&str> = table
            .rows
            .iter()
            .filter_map(|r| match r {
                Row::Data { cells } => Some(cells[1].text.as_str()),
                Row::Notice { .. } => None,
            })
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_search_ui_links_to_selection() {
        let table = Table::search_results(&[hit("C1", "x")], ReturnIdType::Concept);
        let Row::Data { cells } = &table.rows[0] else { panic!("expected data row") };
        assert_eq!(
            cells[0].action,
            Some(CellAction::Select(SelectionContext {
                selected_id: "C1".into(),
                selected_vocabulary: Some("MTH".into()),
                uri: None,
            }))
        );
    }

    #[test]
    fn test_offers_selection_only_for_listed_ids() {
        let table = Table::search_results(&[hit("C1", "x"), hit("C2", "y")], ReturnIdType::Concept);
        assert!(table.offers_selection("C2"));
        assert!(!table.offers_selection("C3"));
        assert!(!Table::initial(ReturnIdType::Concept).offers_selection("C1"));
    }

    #[test]
    fn test_code_mode_adds_root_source_and_placeholders() {
        let table = Table::search_results(&[SearchHit::default()], ReturnIdType::Code);
        assert_eq!(table.headers, vec!["UI", "Name", "Root Source"]);
        let Row::Data { cells } = &table.rows[0] else { panic!("expected data row") };
        let texts: Vec<&str> = cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["N/A", "N/A", "N/A"]);
        assert_eq!(cells[0].action, None);
    }

    #[test]
    fn test_empty_search_is_single_notice() {
        let table = Table::search_results(&[], ReturnIdType::Concept);
        assert_eq!(table.data_row_count(), 0);
        assert_eq!(table.notice_row(), Some((NoticeKind::Empty, "No results found.")));
    }

    #[test]
    fn test_atom_and_definition_placeholders() {
        let atoms = DetailRecords::Atoms(vec![Atom::default(), Atom { name: Some("Asthma".into()), root_source: None }]);
        let table = Table::details(&atoms, "C0004096");
        let Row::Data { cells } = &table.rows[0] else { panic!("expected data row") };
        assert_eq!(cells[0].text, "(Atom #1)");
        assert_eq!(cells[1].text, "(no rootSource)");

        let defs = DetailRecords::Definitions(vec![Definition::default(), Definition::default()]);
        let table = Table::details(&defs, "C0004096");
        let Row::Data { cells } = &table.rows[1] else { panic!("expected data row") };
        assert_eq!(cells[0].text, "(Definition #2)");
    }

    #[test]
    fn test_relations_link_both_ends() {
        let rel = Relation {
            from_name: None,
            relation_label: Some("has_finding_site".into()),
            to_name: Some("Lung".into()),
            root_source: Some("SNOMEDCT_US".into()),
            from_id: Some("https://uts/CUI/C1".into()),
            to_id: None,
        };
        let table = Table::details(&DetailRecords::Relations(vec![rel]), "C1");
        assert_eq!(table.headers.len(), 4);
        let Row::Data { cells } = &table.rows[0] else { panic!("expected data row") };
        assert_eq!(cells[0].text, "(no relatedFromIdName)");
        assert_eq!(
            cells[0].action,
            Some(CellAction::Related { url: "https://uts/CUI/C1".into(), direction: RelatedDirection::From })
        );
        assert_eq!(cells[2].action, None);
    }

    #[test]
    fn test_empty_details_name_kind_and_id() {
        let table = Table::details(&DetailRecords::Definitions(vec![]), "C0011849");
        assert_eq!(
            table.notice_row(),
            Some((NoticeKind::Empty, "No definitions found for this C0011849."))
        );
    }

    #[test]
    fn test_related_shapes() {
        let entities = RelatedPayload::Entities(vec![RelatedEntity { name: Some("Lung".into()), root_source: None, ui: Some("C2".into()) }]);
        let table = Table::related(&entities);
        let Row::Data { cells } = &table.rows[0] else { panic!("expected data row") };
        assert_eq!(cells[1].text, "N/A");

        let fields = RelatedPayload::Fields(vec![("ui".into(), "A1".into()), ("suppressible".into(), "false".into())]);
        let table = Table::related(&fields);
        assert_eq!(table.headers, vec!["Field", "Value"]);
        assert_eq!(table.data_row_count(), 2);

        let table = Table::related(&RelatedPayload::Empty);
        assert_eq!(table.notice_row(), Some((NoticeKind::Empty, "No data found for the selected concept.")));
    }
}

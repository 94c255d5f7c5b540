//! Response schemas for the UTS and RxNav endpoints.
//!
//! Every field is optional: the services omit fields freely and the tables
//! render a placeholder for anything missing. Records are built from
//! `serde_json::Value` by hand so one odd field never discards a whole row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether search hits are concept identifiers (CUIs) or source codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnIdType {
    #[default]
    Concept,
    Code,
}

impl ReturnIdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnIdType::Concept => "concept",
            ReturnIdType::Code => "code",
        }
    }

    /// Vocabulary filtering only applies to code searches.
    pub fn uses_vocabularies(&self) -> bool {
        matches!(self, ReturnIdType::Code)
    }
}

impl fmt::Display for ReturnIdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnIdType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "concept" => Ok(ReturnIdType::Concept),
            "code" => Ok(ReturnIdType::Code),
            other => Err(format!("unknown returnIdType: {other}")),
        }
    }
}

/// Content sub-resource of a concept or code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    Atoms,
    Relations,
    Definitions,
}

impl DetailKind {
    pub const ALL: [DetailKind; 3] = [DetailKind::Atoms, DetailKind::Relations, DetailKind::Definitions];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailKind::Atoms => "atoms",
            DetailKind::Relations => "relations",
            DetailKind::Definitions => "definitions",
        }
    }

    /// Capitalised label for buttons.
    pub fn title(&self) -> &'static str {
        match self {
            DetailKind::Atoms => "Atoms",
            DetailKind::Relations => "Relations",
            DetailKind::Definitions => "Definitions",
        }
    }

    /// Definitions exist for concepts only.
    pub fn is_offered_for(&self, id_type: ReturnIdType) -> bool {
        match id_type {
            ReturnIdType::Concept => true,
            ReturnIdType::Code => !matches!(self, DetailKind::Definitions),
        }
    }

    pub fn offered_for(id_type: ReturnIdType) -> Vec<DetailKind> {
        Self::ALL.into_iter().filter(|k| k.is_offered_for(id_type)).collect()
    }
}

impl fmt::Display for DetailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "atoms" => Ok(DetailKind::Atoms),
            "relations" => Ok(DetailKind::Relations),
            "definitions" => Ok(DetailKind::Definitions),
            other => Err(format!("unknown detail kind: {other}")),
        }
    }
}

// ── UTS records ────────────────────────────────────────────────────────────

/// One entry of `result.results` from `/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub ui: Option<String>,
    pub name: Option<String>,
    pub root_source: Option<String>,
    /// Content URL of the hit; present for code searches.
    pub uri: Option<String>,
}

impl SearchHit {
    pub fn from_json(v: &Value) -> Self {
        Self {
            ui: text(&v["ui"]),
            name: text(&v["name"]),
            root_source: text(&v["rootSource"]),
            uri: text(&v["uri"]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Atom {
    pub name: Option<String>,
    pub root_source: Option<String>,
}

impl Atom {
    pub fn from_json(v: &Value) -> Self {
        Self {
            name: text(&v["name"]),
            root_source: text(&v["rootSource"]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub value: Option<String>,
    pub root_source: Option<String>,
}

impl Definition {
    pub fn from_json(v: &Value) -> Self {
        Self {
            value: text(&v["value"]),
            root_source: text(&v["rootSource"]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub from_name: Option<String>,
    pub relation_label: Option<String>,
    pub to_name: Option<String>,
    pub root_source: Option<String>,
    /// Absolute URL of the "from" entity.
    pub from_id: Option<String>,
    /// Absolute URL of the "to" entity.
    pub to_id: Option<String>,
}

impl Relation {
    pub fn from_json(v: &Value) -> Self {
        Self {
            from_name: text(&v["relatedFromIdName"]),
            // additionalRelationLabel is the readable one; fall back to the short code
            relation_label: text(&v["additionalRelationLabel"]).or_else(|| text(&v["relationLabel"])),
            to_name: text(&v["relatedIdName"]),
            root_source: text(&v["rootSource"]),
            from_id: text(&v["relatedFromId"]),
            to_id: text(&v["relatedId"]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEntity {
    pub name: Option<String>,
    pub root_source: Option<String>,
    pub ui: Option<String>,
}

impl RelatedEntity {
    pub fn from_json(v: &Value) -> Self {
        Self {
            name: text(&v["name"]),
            root_source: text(&v["rootSource"]),
            ui: text(&v["ui"]),
        }
    }
}

/// Records of one detail request; the variant follows the requested kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "lowercase")]
pub enum DetailRecords {
    Atoms(Vec<Atom>),
    Relations(Vec<Relation>),
    Definitions(Vec<Definition>),
}

impl DetailRecords {
    /// Maps the top-level `result` array; anything else is an empty list.
    pub fn from_envelope(kind: DetailKind, body: &Value) -> Self {
        let items: &[Value] = body["result"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        match kind {
            DetailKind::Atoms => DetailRecords::Atoms(items.iter().map(Atom::from_json).collect()),
            DetailKind::Relations => DetailRecords::Relations(items.iter().map(Relation::from_json).collect()),
            DetailKind::Definitions => DetailRecords::Definitions(items.iter().map(Definition::from_json).collect()),
        }
    }

    pub fn kind(&self) -> DetailKind {
        match self {
            DetailRecords::Atoms(_) => DetailKind::Atoms,
            DetailRecords::Relations(_) => DetailKind::Relations,
            DetailRecords::Definitions(_) => DetailKind::Definitions,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DetailRecords::Atoms(v) => v.len(),
            DetailRecords::Relations(v) => v.len(),
            DetailRecords::Definitions(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Body of a related-entity follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "lowercase")]
pub enum RelatedPayload {
    /// `result.results` was a non-empty array.
    Entities(Vec<RelatedEntity>),
    /// `result` was a single object with no result list: key/value dump.
    Fields(Vec<(String, String)>),
    Empty,
}

impl RelatedPayload {
    pub fn from_envelope(body: &Value) -> Self {
        let result = &body["result"];
        if let Some(items) = result["results"].as_array() {
            if items.is_empty() {
                return RelatedPayload::Empty;
            }
            return RelatedPayload::Entities(items.iter().map(RelatedEntity::from_json).collect());
        }
        match result.as_object() {
            Some(obj) if !obj.is_empty() => RelatedPayload::Fields(
                obj.iter().map(|(k, v)| (k.clone(), dump_value(v))).collect(),
            ),
            _ => RelatedPayload::Empty,
        }
    }
}

/// Maps `result.results` of a search body; missing or mistyped is empty.
pub fn search_hits(body: &Value) -> Vec<SearchHit> {
    body["result"]["results"]
        .as_array()
        .map(|items| items.iter().map(SearchHit::from_json).collect())
        .unwrap_or_default()
}

// ── RxNav records ──────────────────────────────────────────────────────────

/// `properties` object of `rxcui/{id}/properties.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RxcuiProperties {
    pub rxcui: Option<String>,
    pub name: Option<String>,
    pub tty: Option<String>,
    pub synonym: Option<String>,
}

impl RxcuiProperties {
    pub fn from_json(v: &Value) -> Self {
        Self {
            rxcui: text(&v["rxcui"]),
            name: text(&v["name"]),
            tty: text(&v["tty"]),
            synonym: text(&v["synonym"]),
        }
    }
}

/// Outcome of NDC → RXCUI, also the JSON download format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdcConversion {
    pub ndc: String,
    pub rxcui: String,
    pub term_type: String,
    pub name: String,
    pub ndc_url: String,
    pub rxcui_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdcName {
    pub ndc: String,
    pub name: String,
}

/// Outcome of RXCUI → NDC list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxcuiConversion {
    pub rxcui: String,
    pub ndcs: Vec<NdcName>,
    pub api_url: String,
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Non-empty string, or a number rendered as text.
pub(crate) fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn dump_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_search_hits_preserve_order_and_tolerate_gaps() {
        let body = json!({
            "result": { "results": [
                { "ui": "C0011849", "name": "Diabetes Mellitus", "rootSource": "MTH" },
                { "ui": "C0011860", "name": "" },
                "not-an-object"
            ]}
        });
        let hits = search_hits(&body);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].ui.as_deref(), Some("C0011849"));
        assert_eq!(hits[1].name, None);
        assert_eq!(hits[2], SearchHit::default());
    }

    #[test]
    fn test_search_hits_missing_envelope() {
        assert!(search_hits(&json!({"pageSize": 25})).is_empty());
        assert!(search_hits(&json!({"result": {"results": "nope"}})).is_empty());
        assert!(search_hits(&Value::Null).is_empty());
    }

    #[test]
    fn test_relation_prefers_additional_label() {
        let rel = Relation::from_json(&json!({
            "relatedFromIdName": "Diabetes",
            "relationLabel": "RO",
            "additionalRelationLabel": "has_finding_site",
            "relatedIdName": "Pancreas",
            "relatedId": "https://uts-ws.nlm.nih.gov/rest/content/current/CUI/C0030274",
            "rootSource": "SNOMEDCT_US"
        }));
        assert_eq!(rel.relation_label.as_deref(), Some("has_finding_site"));
        assert_eq!(rel.from_id, None);

        let short = Relation::from_json(&json!({ "relationLabel": "RB", "additionalRelationLabel": "" }));
        assert_eq!(short.relation_label.as_deref(), Some("RB"));
    }

    #[test]
    fn test_detail_records_require_array_result() {
        let records = DetailRecords::from_envelope(DetailKind::Atoms, &json!({"result": {"name": "x"}}));
        assert!(records.is_empty());
        assert_eq!(records.kind(), DetailKind::Atoms);

        let defs = DetailRecords::from_envelope(
            DetailKind::Definitions,
            &json!({"result": [{"value": "A metabolic disease", "rootSource": "MSH"}]}),
        );
        assert_eq!(
            defs,
            DetailRecords::Definitions(vec![Definition {
                value: Some("A metabolic disease".into()),
                root_source: Some("MSH".into()),
            }])
        );
    }

    #[test]
    fn test_related_payload_shapes() {
        let list = RelatedPayload::from_envelope(&json!({
            "result": { "results": [{ "ui": "C1", "name": "One", "rootSource": "MSH" }] }
        }));
        assert!(matches!(list, RelatedPayload::Entities(ref v) if v.len() == 1));

        let single = RelatedPayload::from_envelope(&json!({
            "result": { "ui": "C0030274", "name": "Pancreas", "atomCount": 42, "suppressible": false, "definitions": null }
        }));
        match single {
            RelatedPayload::Fields(fields) => {
                assert!(fields.contains(&("name".to_string(), "Pancreas".to_string())));
                assert!(fields.contains(&("atomCount".to_string(), "42".to_string())));
                assert!(fields.contains(&("definitions".to_string(), "N/A".to_string())));
            }
            other => panic!("expected fields, got {other:?}"),
        }

        assert_eq!(RelatedPayload::from_envelope(&json!({"result": {"results": []}})), RelatedPayload::Empty);
        assert_eq!(RelatedPayload::from_envelope(&json!({"error": "nope"})), RelatedPayload::Empty);
    }

    #[test]
    fn test_kind_parsing_and_offering() {
        assert_eq!("relations".parse::<DetailKind>().unwrap(), DetailKind::Relations);
        assert!("synonyms".parse::<DetailKind>().is_err());
        assert_eq!(DetailKind::offered_for(ReturnIdType::Code), vec![DetailKind::Atoms, DetailKind::Relations]);
        assert_eq!(DetailKind::offered_for(ReturnIdType::Concept).len(), 3);
        assert_eq!("code".parse::<ReturnIdType>().unwrap(), ReturnIdType::Code);
        assert!(ReturnIdType::Code.uses_vocabularies());
        assert!(!ReturnIdType::Concept.uses_vocabularies());
    }
}

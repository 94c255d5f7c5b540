//! What the user drilled into.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use termlens_sources::models::SearchHit;

/// The result row chosen for a detail view.
///
/// Passed by value into the detail fetch and consumed by it; the session never
/// keeps one around after the options view closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionContext {
    pub selected_id: String,
    pub selected_vocabulary: Option<String>,
    /// Content URL reported by the search hit (code searches).
    pub uri: Option<String>,
}

impl SelectionContext {
    pub fn new(selected_id: impl Into<String>) -> Self {
        Self {
            selected_id: selected_id.into(),
            selected_vocabulary: None,
            uri: None,
        }
    }

    /// Hits without an identifier cannot be drilled into.
    pub fn from_hit(hit: &SearchHit) -> Option<Self> {
        let id = hit.ui.as_ref()?;
        Some(Self {
            selected_id: id.clone(),
            selected_vocabulary: hit.root_source.clone(),
            uri: hit.uri.clone(),
        })
    }
}

/// Which end of a relation row was followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedDirection {
    From,
    To,
}

impl RelatedDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelatedDirection::From => "from",
            RelatedDirection::To => "to",
        }
    }
}

impl fmt::Display for RelatedDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelatedDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "from" => Ok(RelatedDirection::From),
            "to" => Ok(RelatedDirection::To),
            other => Err(format!("unknown related direction: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hit_requires_ui() {
        let hit = SearchHit {
            ui: Some("195967001".into()),
            name: Some("Asthma".into()),
            root_source: Some("SNOMEDCT_US".into()),
            uri: Some("https://uts-ws.nlm.nih.gov/rest/content/current/source/SNOMEDCT_US/195967001".into()),
        };
        let ctx = SelectionContext::from_hit(&hit).unwrap();
        assert_eq!(ctx.selected_id, "195967001");
        assert_eq!(ctx.selected_vocabulary.as_deref(), Some("SNOMEDCT_US"));

        assert!(SelectionContext::from_hit(&SearchHit::default()).is_none());
    }

    #[test]
    fn test_direction_round_trip() {
        assert_eq!("to".parse::<RelatedDirection>().unwrap(), RelatedDirection::To);
        assert_eq!(RelatedDirection::From.to_string(), "from");
        assert!("sideways".parse::<RelatedDirection>().is_err());
    }
}

//! Search form parameters.

use termlens_common::{ApiKey, Result, TermlensError};
use termlens_sources::ReturnIdType;

pub const MISSING_SEARCH_INPUT: &str = "Please enter both an API key and a search term.";
pub const MISSING_API_KEY: &str = "Please enter an API key first.";

/// The vocabulary checkboxes, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyCatalog {
    codes: Vec<String>,
}

impl VocabularyCatalog {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = Vec::new();
        for code in codes {
            let code = code.as_ref().trim();
            if !code.is_empty() && !seen.iter().any(|c: &String| c == code) {
                seen.push(code.to_string());
            }
        }
        Self { codes: seen }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Known codes among `chosen`, in catalog order. Unknown codes are dropped.
    pub fn select<'a, I>(&self, chosen: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let chosen: Vec<&str> = chosen.into_iter().map(str::trim).collect();
        self.codes
            .iter()
            .filter(|code| chosen.contains(&code.as_str()))
            .cloned()
            .collect()
    }

    /// Same as [`select`](Self::select) for a comma-separated list.
    pub fn select_csv(&self, csv: &str) -> Vec<String> {
        self.select(csv.split(','))
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub api_key: Option<ApiKey>,
    pub term: String,
    pub return_id_type: ReturnIdType,
    /// Catalog-ordered selection; see [`VocabularyCatalog::select`].
    pub vocabularies: Vec<String>,
}

impl QueryParams {
    pub fn new(api_key: Option<ApiKey>, term: &str, return_id_type: ReturnIdType, vocabularies: Vec<String>) -> Self {
        Self {
            api_key,
            term: term.trim().to_string(),
            return_id_type,
            vocabularies,
        }
    }

    /// Vocabularies actually sent: none in concept mode.
    pub fn effective_vocabularies(&self) -> &[String] {
        if self.return_id_type.uses_vocabularies() {
            &self.vocabularies
        } else {
            &[]
        }
    }

    /// Key and term, both required before a search is sent.
    pub fn require_search_input(&self) -> Result<(&ApiKey, &str)> {
        match (&self.api_key, self.term.trim()) {
            (Some(key), term) if !term.is_empty() => Ok((key, term)),
            _ => Err(TermlensError::missing(MISSING_SEARCH_INPUT)),
        }
    }

    pub fn require_key(&self) -> Result<&ApiKey> {
        self.api_key.as_ref().ok_or_else(|| TermlensError::missing(MISSING_API_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> VocabularyCatalog {
        VocabularyCatalog::new(["SNOMEDCT_US", "ICD10CM", "MSH", "RXNORM"])
    }

    #[test]
    fn test_select_uses_catalog_order() {
        let chosen = catalog().select(["RXNORM", "SNOMEDCT_US", "BOGUS"]);
        assert_eq!(chosen, vec!["SNOMEDCT_US", "RXNORM"]);
    }

    #[test]
    fn test_select_csv_trims() {
        assert_eq!(catalog().select_csv("MSH, ICD10CM"), vec!["ICD10CM", "MSH"]);
        assert!(catalog().select_csv("").is_empty());
    }

    #[test]
    fn test_catalog_dedups() {
        let c = VocabularyCatalog::new(["MSH", " MSH ", "", "LNC"]);
        assert_eq!(c.codes(), &["MSH".to_string(), "LNC".to_string()]);
    }

    #[test]
    fn test_concept_mode_drops_vocabularies() {
        let q = QueryParams::new(None, "flu", ReturnIdType::Concept, vec!["MSH".into()]);
        assert!(q.effective_vocabularies().is_empty());
        let q = QueryParams { return_id_type: ReturnIdType::Code, ..q };
        assert_eq!(q.effective_vocabularies(), &["MSH".to_string()]);
    }

    #[test]
    fn test_missing_input() {
        let no_key = QueryParams::new(None, "flu", ReturnIdType::Concept, vec![]);
        assert_eq!(no_key.require_search_input().unwrap_err().to_string(), MISSING_SEARCH_INPUT);

        let no_term = QueryParams::new(ApiKey::parse("k"), "   ", ReturnIdType::Concept, vec![]);
        assert!(no_term.require_search_input().is_err());
        assert!(no_term.require_key().is_ok());

        let ok = QueryParams::new(ApiKey::parse("k"), " flu ", ReturnIdType::Concept, vec![]);
        assert_eq!(ok.require_search_input().unwrap().1, "flu");
    }
}

//! API key handling.
//!
//! The UTS key lives in a single form field and travels as the `apiKey`
//! query parameter. It is held as a [`SecretString`] and every URL that is
//! shown or logged goes through [`mask_url`] first.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Query parameter the terminology service reads the key from.
pub const API_KEY_PARAM: &str = "apiKey";

/// Placeholder shown in place of the key.
pub const MASK: &str = "***";

pub struct ApiKey(SecretString);

impl ApiKey {
    /// Trims the raw field value; an empty field is no key.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(SecretString::from(trimmed.to_string())))
        }
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Replaces every occurrence of the key in free text (error messages).
    pub fn redact(&self, text: &str) -> String {
        text.replace(self.expose(), MASK)
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self(SecretString::from(self.expose().to_string()))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({MASK})")
    }
}

/// Copy of `url` with every `apiKey` value replaced by [`MASK`].
/// Parameter order is preserved.
pub fn mask_url(url: &Url) -> Url {
    let mut masked = url.clone();
    if url.query().is_none() {
        return masked;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == API_KEY_PARAM { MASK.to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert!(ApiKey::parse("   ").is_none());
        assert_eq!(ApiKey::parse("  abc-123 ").unwrap().expose(), "abc-123");
    }

    #[test]
    fn test_debug_never_shows_key() {
        let key = ApiKey::parse("super-secret").unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert_eq!(rendered, "ApiKey(***)");
    }

    #[test]
    fn test_mask_url_keeps_parameter_order() {
        let url = Url::parse(
            "https://uts-ws.nlm.nih.gov/rest/search/current?string=heart&returnIdType=concept&apiKey=k3y&sabs=MSH",
        )
        .unwrap();
        let masked = mask_url(&url);
        assert_eq!(
            masked.as_str(),
            "https://uts-ws.nlm.nih.gov/rest/search/current?string=heart&returnIdType=concept&apiKey=***&sabs=MSH"
        );
    }

    #[test]
    fn test_mask_url_without_query_is_unchanged() {
        let url = Url::parse("https://rxnav.nlm.nih.gov/REST/rxcui/1/ndcs.json").unwrap();
        assert_eq!(mask_url(&url), url);
    }

    #[test]
    fn test_redact_free_text() {
        let key = ApiKey::parse("k3y").unwrap();
        assert_eq!(key.redact("failed for apiKey=k3y"), "failed for apiKey=***");
    }
}

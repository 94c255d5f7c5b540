use thiserror::Error;

/// How an error is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field was empty; nothing was sent.
    MissingInput,
    /// Transport, status, parse or sandbox failure.
    Network,
    /// The service answered without the expected record.
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum TermlensError {
    #[error("{0}")]
    MissingInput(String),

    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API request failed with status code {status} ({url})")]
    Status { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    NotFound(String),

    #[error("Network capabilities capped: {0}")]
    Security(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for TermlensError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest keeps the request URL, and with it the apiKey parameter
        TermlensError::Http(err.without_url())
    }
}

impl TermlensError {
    pub fn missing(what: impl Into<String>) -> Self {
        TermlensError::MissingInput(what.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        TermlensError::NotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TermlensError::MissingInput(_) => ErrorKind::MissingInput,
            TermlensError::Http(_)
            | TermlensError::Transport(_)
            | TermlensError::Status { .. }
            | TermlensError::Serialization(_)
            | TermlensError::Url(_)
            | TermlensError::Security(_) => ErrorKind::Network,
            TermlensError::NotFound(_) => ErrorKind::NotFound,
            TermlensError::Config(_) | TermlensError::Other(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, TermlensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_kind() {
        let err = TermlensError::missing("Please enter both an API key and a search term.");
        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert_eq!(err.to_string(), "Please enter both an API key and a search term.");
    }

    #[test]
    fn test_parse_failures_are_network_errors() {
        let parse = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert_eq!(TermlensError::from(parse).kind(), ErrorKind::Network);

        let url = url::Url::parse("not a url").unwrap_err();
        assert_eq!(TermlensError::from(url).kind(), ErrorKind::Network);
    }

    #[test]
    fn test_status_message_mentions_code() {
        let err = TermlensError::Status {
            status: 401,
            url: "https://uts-ws.nlm.nih.gov/rest/search/current?apiKey=***".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("401"));
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("no listing id found in {url}")]
    IdentifierNotFound { url: String },

    #[error("failed to fetch {url} after {attempts} attempts: {last_error}")]
    FetchFailed {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("unexpected payload structure for {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("insufficient vehicle data extracted from {url}")]
    InsufficientData { url: String },
}

impl ScraperError {
    /// Short machine-readable code used by the HTTP layer.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ScraperError::InvalidUrl { .. } => "invalid_url",
            ScraperError::InvalidInput { .. } => "invalid_input",
            ScraperError::IdentifierNotFound { .. } => "identifier_not_found",
            ScraperError::Http(_)
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::FetchFailed { .. } => "fetch_failed",
            ScraperError::Deserialize { .. } | ScraperError::Parse { .. } => "parse_failed",
            ScraperError::InsufficientData { .. } => "insufficient_data",
        }
    }
}

use serde_json::Value;

use crate::error::ScraperError;

/// An upstream response body, classified by its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Html(String),
}

impl Payload {
    /// Classifies `body` as JSON when `content_type` mentions `json`, and as
    /// markup otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Deserialize`] when the content type claims JSON
    /// but the body does not parse.
    pub fn from_body(content_type: &str, body: String, url: &str) -> Result<Self, ScraperError> {
        if content_type.to_ascii_lowercase().contains("json") {
            serde_json::from_str(&body)
                .map(Payload::Json)
                .map_err(|source| ScraperError::Deserialize {
                    context: url.to_owned(),
                    source,
                })
        } else {
            Ok(Payload::Html(body))
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Payload::Json(_))
    }

    /// Body as text, re-serializing JSON payloads.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Html(html) => html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_type_parses_body() {
        let payload = Payload::from_body(
            "application/json;charset=UTF-8",
            r#"{"listing":{"id":1}}"#.to_owned(),
            "https://www.cargurus.com/x",
        )
        .unwrap();
        assert_eq!(payload, Payload::Json(serde_json::json!({"listing": {"id": 1}})));
    }

    #[test]
    fn html_content_type_keeps_text() {
        let payload =
            Payload::from_body("text/html", "<html></html>".to_owned(), "https://x").unwrap();
        assert!(!payload.is_json());
        assert_eq!(payload.into_text(), "<html></html>");
    }

    #[test]
    fn malformed_json_is_a_deserialize_error() {
        let err = Payload::from_body("application/json", "<html>".to_owned(), "https://x")
            .unwrap_err();
        assert!(
            matches!(err, ScraperError::Deserialize { .. }),
            "expected Deserialize, got: {err:?}"
        );
    }
}

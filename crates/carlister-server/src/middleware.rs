use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is propagated as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id for one API call, stored as a request extension and logged
/// alongside every scrape, search, and dealer request.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Caller-supplied id, if it is short and made only of `[A-Za-z0-9._-]`.
fn caller_request_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let acceptable = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    acceptable.then(|| raw.to_owned())
}

/// Tags each request with a [`RequestId`] and echoes it on the response.
///
/// A usable `x-request-id` from the caller is kept; anything else is replaced
/// with a fresh `UUIDv4`.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = caller_request_id(req.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

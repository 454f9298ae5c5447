//! Single-listing extraction: structured JSON first, rendered page as fallback.

mod html;
mod json;

pub use html::extract_html;
pub use json::{extract_json, ADDITIONAL_INFO_MARKER};
pub(crate) use json::split_description;

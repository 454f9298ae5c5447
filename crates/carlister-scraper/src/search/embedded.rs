//! JSON state blobs that the search page embeds in its scripts.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Script globals that carry page state, in lookup order.
const STATE_GLOBALS: [&str; 3] = [
    "window.__PREFLIGHT__",
    "window.__INITIAL_STATE__",
    "window.__SRP_DATA__",
];

/// Nesting depth searched for a `tiles` array inside a blob.
const MAX_TILE_DEPTH: usize = 8;

static NEXT_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*\bid\s*=\s*["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// Returns every embedded state blob that parses as JSON, in lookup order.
#[must_use]
pub fn extract_blobs(html: &str) -> Vec<Value> {
    let mut blobs = Vec::new();

    for global in STATE_GLOBALS {
        let mut search_from = 0;
        while let Some(found) = html[search_from..].find(global) {
            let after = search_from + found + global.len();
            search_from = after;
            let Some(body) = assignment_body(&html[after..]) else {
                continue;
            };
            match extract_balanced(body).map(serde_json::from_str::<Value>) {
                Some(Ok(value)) => blobs.push(value),
                Some(Err(e)) => {
                    tracing::debug!(global, error = %e, "embedded state blob is not valid JSON");
                }
                None => {}
            }
        }
    }

    for caps in NEXT_DATA.captures_iter(html) {
        if let Some(body) = caps.get(1) {
            match serde_json::from_str::<Value>(body.as_str().trim()) {
                Ok(value) => blobs.push(value),
                Err(e) => {
                    tracing::debug!(error = %e, "__NEXT_DATA__ script is not valid JSON");
                }
            }
        }
    }

    blobs
}

/// Skips `\s*=\s*` after a global name and returns the assigned text.
fn assignment_body(s: &str) -> Option<&str> {
    let rest = s.trim_start().strip_prefix('=')?;
    Some(rest.trim_start())
}

/// Try to extract a balanced JSON object or array from the start of `s`.
///
/// Tracks bracket depth while respecting string literals and escape
/// sequences. Returns the shortest complete prefix, or `None` if it never
/// closes.
pub(crate) fn extract_balanced(s: &str) -> Option<&str> {
    let close = match s.chars().next()? {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return (c == close).then(|| &s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Depth-first search for the first object that holds a `tiles` array.
#[must_use]
pub fn find_tiles_container(value: &Value) -> Option<&Value> {
    find_tiles_at(value, 0)
}

fn find_tiles_at(value: &Value, depth: usize) -> Option<&Value> {
    if depth > MAX_TILE_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            if map.get("tiles").is_some_and(Value::is_array) {
                return Some(value);
            }
            map.values().find_map(|child| find_tiles_at(child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|child| find_tiles_at(child, depth + 1)),
        _ => None,
    }
}

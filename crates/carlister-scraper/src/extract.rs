//! Field-level extraction primitives shared by the detail and search paths.
//!
//! Every helper returns `Option`: a missing or malformed subtree yields
//! `None` for that field only and never aborts the record.

use std::sync::LazyLock;

use carlister_core::vehicle::is_plausible_year;
use regex::Regex;
use serde_json::Value;

/// Makes that span two words in free-text titles.
const MULTI_WORD_MAKES: [&str; 3] = ["Land Rover", "Alfa Romeo", "Aston Martin"];

static YEAR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid regex"));

/// One way of resolving a field from `I`.
pub(crate) type Strategy<'s, I, T> = &'s dyn Fn(&I) -> Option<T>;

/// Runs `strategies` in order and returns the first `Some`.
pub(crate) fn first_match<I: ?Sized, T>(
    input: &I,
    strategies: &[Strategy<'_, I, T>],
) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(input))
}

/// Follows `path` through nested objects.
pub(crate) fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Non-blank string at `path`, trimmed.
pub(crate) fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    value_at(value, path)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Non-negative integer at `path`; numeric strings such as `"45,210"` count.
/// A fractional part in a string is dropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn u64_at(value: &Value, path: &[&str]) -> Option<u64> {
    match value_at(value, path)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => {
            let whole = s.split('.').next().unwrap_or_default();
            let digits: String = whole.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Positive amount at `path`; numeric strings such as `"$18,500"` count.
pub(crate) fn f64_at(value: &Value, path: &[&str]) -> Option<f64> {
    match value_at(value, path)? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite() && *f > 0.0),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

/// Model year at `path`, either a number or the first year token of a string.
pub(crate) fn year_at(value: &Value, path: &[&str]) -> Option<u16> {
    match value_at(value, path)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|y| u16::try_from(y).ok())
            .filter(|y| is_plausible_year(*y)),
        Value::String(s) => parse_year(s),
        _ => None,
    }
}

/// Strips everything except digits and `.` and parses the remainder.
pub(crate) fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok().filter(|p| *p > 0.0)
}

/// First `19xx`/`20xx` token in `text` inside the plausible year window.
pub(crate) fn parse_year(text: &str) -> Option<u16> {
    YEAR_TOKEN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u16>().ok())
        .find(|y| is_plausible_year(*y))
}

/// Appends `item` unless it is blank or already present.
pub(crate) fn push_unique(items: &mut Vec<String>, item: impl Into<String>) {
    let item = item.into();
    let trimmed = item.trim();
    if trimmed.is_empty() || items.iter().any(|existing| existing == trimmed) {
        return;
    }
    items.push(trimmed.to_owned());
}

/// Resolves `href` against `base`. Protocol-relative links become `https:`.
pub(crate) fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_owned());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    reqwest::Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .ok()
}

/// Picture URL from one entry of a `pictures` array.
pub(crate) fn picture_url(picture: &Value) -> Option<String> {
    if let Some(url) = picture.as_str() {
        return Some(url.trim().to_owned()).filter(|u| !u.is_empty());
    }
    ["url", "fullSizeUrl", "pictureUrl"]
        .iter()
        .find_map(|key| str_at(picture, &[*key]))
}

/// Collapses whitespace runs to single spaces.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Formats an odometer reading as `"45,210 mi"`.
pub(crate) fn format_mileage(miles: u64) -> String {
    let digits = miles.to_string();
    let mut out = String::with_capacity(digits.len() + 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push_str(" mi");
    out
}

/// Year, make, model and trim recovered from a free-text listing title.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct TitleParts {
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
}

/// Splits `"2019 Land Rover Discovery HSE"` into its parts.
///
/// A leading year token is optional. Two-word makes from
/// [`MULTI_WORD_MAKES`] are recognized; otherwise make and model are one word
/// each and the remainder is the trim.
pub(crate) fn parse_title(title: &str) -> TitleParts {
    let normalized = normalize_whitespace(title);
    let mut rest = normalized.as_str();
    let mut parts = TitleParts::default();

    if let Some((first, tail)) = rest.split_once(' ') {
        if let Some(year) = first.parse::<u16>().ok().filter(|y| is_plausible_year(*y)) {
            parts.year = Some(year);
            rest = tail;
        }
    }

    let make = MULTI_WORD_MAKES
        .iter()
        .find(|m| {
            rest.len() >= m.len()
                && rest.is_char_boundary(m.len())
                && rest[..m.len()].eq_ignore_ascii_case(m)
                && rest[m.len()..].chars().next().map_or(true, char::is_whitespace)
        })
        .map(|m| (*m).to_owned());
    match make {
        Some(make) => {
            rest = rest[make.len()..].trim_start();
            parts.make = Some(make);
        }
        None => {
            let mut words = rest.splitn(2, ' ');
            parts.make = words.next().filter(|w| !w.is_empty()).map(str::to_owned);
            rest = words.next().unwrap_or_default();
        }
    }

    let mut words = rest.splitn(2, ' ');
    parts.model = words.next().filter(|w| !w.is_empty()).map(str::to_owned);
    parts.trim = words
        .next()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_owned);
    parts
}

/// Text following the first occurrence of `model` in `title`, if any.
pub(crate) fn trim_after_model(title: &str, model: &str) -> Option<String> {
    if model.is_empty() {
        return None;
    }
    let idx = title.find(model)?;
    let remainder = title[idx + model.len()..].trim();
    (!remainder.is_empty()).then(|| normalize_whitespace(remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_match_takes_earliest_some() {
        fn none(_: &str) -> Option<u8> {
            None
        }
        fn one(_: &str) -> Option<u8> {
            Some(1)
        }
        fn two(_: &str) -> Option<u8> {
            Some(2)
        }
        assert_eq!(
            first_match("x", &[&none as Strategy<'_, str, u8>, &one, &two]),
            Some(1)
        );
        assert_eq!(first_match("x", &[&none as Strategy<'_, str, u8>]), None);
    }

    #[test]
    fn json_accessors_accept_numeric_strings() {
        let v = json!({"a": {"price": "$18,500", "miles": "45,210", "year": "2019"}});
        assert_eq!(f64_at(&v, &["a", "price"]), Some(18_500.0));
        assert_eq!(u64_at(&v, &["a", "miles"]), Some(45_210));
        assert_eq!(year_at(&v, &["a", "year"]), Some(2019));
    }

    #[test]
    fn integer_strings_drop_the_fraction() {
        let v = json!({"price": "12,995.50", "miles": ".5", "none": "n/a"});
        assert_eq!(u64_at(&v, &["price"]), Some(12_995));
        assert_eq!(u64_at(&v, &["miles"]), None);
        assert_eq!(u64_at(&v, &["none"]), None);
    }

    #[test]
    fn json_accessors_reject_wrong_shapes() {
        let v = json!({"price": {"nested": true}, "year": 1850, "name": "   "});
        assert_eq!(f64_at(&v, &["price"]), None);
        assert_eq!(year_at(&v, &["year"]), None);
        assert_eq!(str_at(&v, &["name"]), None);
        assert_eq!(str_at(&v, &["missing", "deeper"]), None);
    }

    #[test]
    fn parse_year_skips_out_of_range_tokens() {
        assert_eq!(parse_year("Call 2099 or see our 2018 Accord"), Some(2018));
        assert_eq!(parse_year("no year here 12345"), None);
    }

    #[test]
    fn push_unique_is_exact_match() {
        let mut items = vec!["Sunroof".to_owned()];
        push_unique(&mut items, "Sunroof");
        push_unique(&mut items, "sunroof");
        push_unique(&mut items, "  ");
        assert_eq!(items, vec!["Sunroof", "sunroof"]);
    }

    #[test]
    fn absolutize_handles_relative_forms() {
        let base = "https://www.cargurus.com/Cars/inventorylisting/vdp.action?listingId=1";
        assert_eq!(
            absolutize(base, "/images/a.jpg").as_deref(),
            Some("https://www.cargurus.com/images/a.jpg")
        );
        assert_eq!(
            absolutize(base, "//static.cargurus.com/b.jpg").as_deref(),
            Some("https://static.cargurus.com/b.jpg")
        );
        assert_eq!(absolutize(base, ""), None);
    }

    #[test]
    fn picture_url_reads_known_shapes() {
        assert_eq!(picture_url(&json!("https://x/a.jpg")).as_deref(), Some("https://x/a.jpg"));
        assert_eq!(
            picture_url(&json!({"fullSizeUrl": "https://x/b.jpg"})).as_deref(),
            Some("https://x/b.jpg")
        );
        assert_eq!(picture_url(&json!({"thumb": "https://x/c.jpg"})), None);
    }

    #[test]
    fn mileage_is_grouped() {
        assert_eq!(format_mileage(45_210), "45,210 mi");
        assert_eq!(format_mileage(999), "999 mi");
        assert_eq!(format_mileage(1_000_000), "1,000,000 mi");
    }

    #[test]
    fn title_with_multi_word_make() {
        let parts = parse_title("2017 Land Rover Discovery Sport HSE");
        assert_eq!(parts.year, Some(2017));
        assert_eq!(parts.make.as_deref(), Some("Land Rover"));
        assert_eq!(parts.model.as_deref(), Some("Discovery"));
        assert_eq!(parts.trim.as_deref(), Some("Sport HSE"));
    }

    #[test]
    fn title_without_year_or_trim() {
        let parts = parse_title("Honda Civic");
        assert_eq!(parts.year, None);
        assert_eq!(parts.make.as_deref(), Some("Honda"));
        assert_eq!(parts.model.as_deref(), Some("Civic"));
        assert_eq!(parts.trim, None);
    }

    #[test]
    fn trim_follows_model_substring() {
        assert_eq!(
            trim_after_model("2019 Toyota Camry  SE Sedan", "Camry").as_deref(),
            Some("SE Sedan")
        );
        assert_eq!(trim_after_model("2019 Toyota Camry", "Camry"), None);
        assert_eq!(trim_after_model("2019 Toyota Camry", "Corolla"), None);
    }
}

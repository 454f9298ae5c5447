use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for a make or model that no strategy could resolve.
pub const UNKNOWN: &str = "Unknown";

pub const NO_DESCRIPTION: &str = "No description available.";

pub const FEATURES_NOT_AVAILABLE: &str = "Features not available";

/// Substituted when a listing yields no image URLs at all.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1549317661-bd32c8ce0db2?w=800&h=600&fit=crop";

pub const MIN_YEAR: u16 = 1900;
pub const MAX_YEAR: u16 = 2030;

/// One label/value row of the flattened specification tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRow {
    pub header: String,
    pub value: String,
}

impl StatRow {
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            value: value.into(),
        }
    }
}

/// A single normalized vehicle listing.
///
/// Produced by both the detail and search extractors. `year == 0` means the
/// year was never resolved; such records fail [`VehicleRecord::is_valid`] and
/// are never handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub make: String,
    pub model: String,
    pub year: u16,
    pub price: f64,
    pub description: String,
    pub features: Vec<String>,
    pub stats: Vec<StatRow>,
    pub images: Vec<String>,
    pub original_url: String,
    pub full_title: String,
    /// Site-assigned listing id, when one could be derived.
    pub listing_id: Option<String>,
    pub trim: Option<String>,
    pub mileage: Option<u64>,
    pub scraped_at: DateTime<Utc>,
}

impl VehicleRecord {
    /// A record is usable only when make, model and year all resolved.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_resolved_name(&self.make) && is_resolved_name(&self.model) && self.year != 0
    }
}

fn is_resolved_name(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != UNKNOWN
}

/// Builds `"{year} {make} {model}"`, appending `" {trim}"` when the trim is
/// non-blank.
#[must_use]
pub fn full_title(year: u16, make: &str, model: &str, trim: Option<&str>) -> String {
    match trim.map(str::trim).filter(|t| !t.is_empty()) {
        Some(trim) => format!("{year} {make} {model} {trim}"),
        None => format!("{year} {make} {model}"),
    }
}

/// Returns `true` when `year` lies inside the accepted model-year window.
#[must_use]
pub fn is_plausible_year(year: u16) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(make: &str, model: &str, year: u16) -> VehicleRecord {
        VehicleRecord {
            make: make.to_string(),
            model: model.to_string(),
            year,
            price: 18_500.0,
            description: NO_DESCRIPTION.to_string(),
            features: vec![FEATURES_NOT_AVAILABLE.to_string()],
            stats: vec![],
            images: vec![PLACEHOLDER_IMAGE_URL.to_string()],
            original_url: "https://www.cargurus.com/Cars/l-123456789".to_string(),
            full_title: full_title(year, make, model, None),
            listing_id: Some("123456789".to_string()),
            trim: None,
            mileage: None,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn full_title_without_trim() {
        assert_eq!(full_title(2019, "Toyota", "Camry", None), "2019 Toyota Camry");
    }

    #[test]
    fn full_title_blank_trim_is_ignored() {
        assert_eq!(
            full_title(2019, "Toyota", "Camry", Some("   ")),
            "2019 Toyota Camry"
        );
    }

    #[test]
    fn full_title_with_trim_uses_single_spaces() {
        assert_eq!(
            full_title(2019, "Toyota", "Camry", Some(" XSE V6 ")),
            "2019 Toyota Camry XSE V6"
        );
    }

    #[test]
    fn record_with_all_core_fields_is_valid() {
        assert!(make_record("Honda", "Civic", 2021).is_valid());
    }

    #[test]
    fn record_with_zero_year_is_invalid() {
        assert!(!make_record("Honda", "Civic", 0).is_valid());
    }

    #[test]
    fn record_with_unknown_make_is_invalid() {
        assert!(!make_record(UNKNOWN, "Civic", 2021).is_valid());
        assert!(!make_record("Honda", "", 2021).is_valid());
    }

    #[test]
    fn year_window_bounds() {
        assert!(is_plausible_year(1900));
        assert!(is_plausible_year(2030));
        assert!(!is_plausible_year(1899));
        assert!(!is_plausible_year(2031));
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(make_record("Ford", "F-150", 2018)).expect("serialize");
        assert_eq!(json["fullTitle"], "2018 Ford F-150");
        assert_eq!(json["originalUrl"], "https://www.cargurus.com/Cars/l-123456789");
        assert!(json.get("scrapedAt").is_some());
    }
}

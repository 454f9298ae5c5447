//! Detail extraction from the structured listing JSON.

use carlister_core::{StatRow, VehicleRecord};
use serde_json::Value;

use crate::error::ScraperError;
use crate::extract::{
    f64_at, first_match, format_mileage, parse_title, picture_url, str_at, trim_after_model,
    u64_at, value_at, year_at, Strategy,
};
use crate::listing_id::extract_listing_id;
use crate::record::RecordDraft;

/// Separates free-form description text from the comma list of extras that
/// dealers append to it.
pub const ADDITIONAL_INFO_MARKER: &str = "[!@@Additional Info@@!]";

const CHECKMARK: &str = "✓";

/// The payload root plus its required `listing` object.
pub(crate) struct DetailSource<'a> {
    root: &'a Value,
    listing: &'a Value,
}

impl<'a> DetailSource<'a> {
    fn new(root: &'a Value, source_url: &str) -> Result<Self, ScraperError> {
        let listing = root
            .get("listing")
            .filter(|l| l.is_object())
            .ok_or_else(|| ScraperError::Parse {
                context: format!("detail payload for {source_url}"),
                reason: "missing `listing` object".to_owned(),
            })?;
        Ok(Self { root, listing })
    }

    /// Looks `keys` up on the listing first, then at payload top level.
    fn fallback<T>(&self, keys: &[&str], read: fn(&Value, &[&str]) -> Option<T>) -> Option<T> {
        [self.listing, self.root]
            .iter()
            .find_map(|scope| keys.iter().find_map(|key| read(scope, &[*key])))
    }

    fn title(&self) -> Option<String> {
        str_at(self.listing, &["listingTitle"])
            .or_else(|| str_at(self.listing, &["autoEntityInfo", "title"]))
    }
}

fn entity_year(src: &DetailSource<'_>) -> Option<u16> {
    year_at(src.listing, &["autoEntityInfo", "year"])
}

fn fallback_year(src: &DetailSource<'_>) -> Option<u16> {
    src.fallback(&["year", "carYear"], year_at)
}

fn title_year(src: &DetailSource<'_>) -> Option<u16> {
    src.title().and_then(|t| parse_title(&t).year)
}

fn entity_make(src: &DetailSource<'_>) -> Option<String> {
    str_at(src.listing, &["autoEntityInfo", "make"])
}

fn fallback_make(src: &DetailSource<'_>) -> Option<String> {
    src.fallback(&["makeName"], str_at)
}

fn title_make(src: &DetailSource<'_>) -> Option<String> {
    src.title().and_then(|t| parse_title(&t).make)
}

fn entity_model(src: &DetailSource<'_>) -> Option<String> {
    str_at(src.listing, &["autoEntityInfo", "model"])
}

fn fallback_model(src: &DetailSource<'_>) -> Option<String> {
    src.fallback(&["modelName"], str_at)
}

fn title_model(src: &DetailSource<'_>) -> Option<String> {
    src.title().and_then(|t| parse_title(&t).model)
}

fn explicit_trim(src: &DetailSource<'_>) -> Option<String> {
    str_at(src.listing, &["autoEntityInfo", "trim"]).or_else(|| str_at(src.listing, &["trim"]))
}

fn trim_name(src: &DetailSource<'_>) -> Option<String> {
    src.fallback(&["trimName"], str_at)
}

fn resolve_trim(src: &DetailSource<'_>, model: Option<&str>) -> Option<String> {
    explicit_trim(src)
        .or_else(|| {
            let title = src.title()?;
            trim_after_model(&title, model?)
        })
        .or_else(|| trim_name(src))
}

fn listed_price(src: &DetailSource<'_>) -> Option<f64> {
    src.fallback(&["price"], f64_at)
}

fn expected_price(src: &DetailSource<'_>) -> Option<f64> {
    src.fallback(&["expectedPrice"], f64_at)
}

fn price_string(src: &DetailSource<'_>) -> Option<f64> {
    src.fallback(&["priceString"], f64_at)
}

/// Splits a raw description into its prose and the extras after the marker.
pub(crate) fn split_description(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once(ADDITIONAL_INFO_MARKER) {
        Some((prose, extras)) => (prose.trim(), Some(extras)),
        None => (raw.trim(), None),
    }
}

/// Name of an option entry, which is either a bare string or `{name}`.
fn option_name(option: &Value) -> Option<String> {
    option
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .or_else(|| str_at(option, &["name"]))
        .or_else(|| str_at(option, &["displayName"]))
}

fn option_names(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|options| options.iter().filter_map(option_name).collect())
        .unwrap_or_default()
}

fn first_str(scope: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| str_at(scope, &[*key]))
}

fn collect_features(src: &DetailSource<'_>, extras: Option<&str>, draft: &mut RecordDraft) {
    for option in option_names(src.listing.get("options")) {
        draft.add_feature(option);
    }
    if let Some(extras) = extras {
        for token in extras.split(',') {
            draft.add_feature(token);
        }
    }

    let listing = src.listing;
    let labelled = [
        ("Transmission", first_str(listing, &["localizedTransmission", "transmission"])),
        ("Drivetrain", first_str(listing, &["localizedDriveTrain", "driveTrain"])),
        ("Engine", first_str(listing, &["localizedEngineDisplayName", "engine"])),
        (
            "Mileage",
            first_str(listing, &["localizedMileage"])
                .or_else(|| u64_at(listing, &["mileage"]).map(format_mileage)),
        ),
    ];
    for (label, value) in labelled {
        if let Some(value) = value {
            draft.add_feature(format!("{label}: {value}"));
        }
    }
}

fn spec_categories<'a>(src: &DetailSource<'a>) -> Option<&'a Vec<Value>> {
    [src.listing, src.root].into_iter().find_map(|scope| {
        ["specificationCategories", "specifications"]
            .iter()
            .find_map(|key| scope.get(*key).and_then(Value::as_array))
    })
}

/// Flattens the category tree into header-then-children rows, preserving
/// source order. Categories without items contribute nothing.
fn flatten_stats(src: &DetailSource<'_>) -> Vec<StatRow> {
    let mut rows = Vec::new();
    let Some(categories) = spec_categories(src) else {
        return rows;
    };

    for category in categories {
        let items: Vec<(String, String)> = category
            .get("items")
            .or_else(|| category.get("specifications"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let label = first_str(item, &["label", "name"])?;
                        let value = first_str(item, &["displayValue", "value"]).unwrap_or_default();
                        Some((label, value))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if items.is_empty() {
            continue;
        }

        let name = first_str(category, &["category", "name", "title"])
            .unwrap_or_else(|| "Specifications".to_owned());
        rows.push(StatRow::new(format!("{name} ({} items)", items.len()), ""));
        rows.extend(items.into_iter().map(|(label, value)| StatRow::new(label, value)));

        let options = option_names(category.get("options"));
        if !options.is_empty() {
            rows.push(StatRow::new(format!("Options ({} items)", options.len()), ""));
            rows.extend(options.into_iter().map(|o| StatRow::new(o, CHECKMARK)));
        }
    }
    rows
}

fn listing_id_of(src: &DetailSource<'_>, source_url: &str) -> Option<String> {
    match src.listing.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => extract_listing_id(source_url).map(|id| id.as_str().to_owned()),
    }
}

/// Builds a record from a structured detail payload.
///
/// # Errors
///
/// - [`ScraperError::Parse`] when the payload has no `listing` object.
/// - [`ScraperError::InsufficientData`] when make, model, or year cannot be
///   resolved.
pub fn extract_json(payload: &Value, source_url: &str) -> Result<VehicleRecord, ScraperError> {
    let src = DetailSource::new(payload, source_url)?;
    let mut draft = RecordDraft::new(source_url);

    draft.year = first_match(
        &src,
        &[&entity_year as Strategy<'_, _, _>, &fallback_year, &title_year],
    );
    draft.make = first_match(
        &src,
        &[&entity_make as Strategy<'_, _, _>, &fallback_make, &title_make],
    );
    draft.model = first_match(
        &src,
        &[&entity_model as Strategy<'_, _, _>, &fallback_model, &title_model],
    );
    draft.trim = resolve_trim(&src, draft.model.as_deref());
    draft.price = first_match(
        &src,
        &[&listed_price as Strategy<'_, _, _>, &expected_price, &price_string],
    );
    draft.mileage = u64_at(src.listing, &["mileage"]);
    draft.listing_id = listing_id_of(&src, source_url);

    let raw_description = str_at(src.listing, &["description"]).unwrap_or_default();
    let (prose, extras) = split_description(&raw_description);
    if !prose.is_empty() {
        draft.description = Some(prose.to_owned());
    }
    collect_features(&src, extras, &mut draft);
    draft.stats = flatten_stats(&src);

    if let Some(pictures) = value_at(src.listing, &["pictures"]).and_then(Value::as_array) {
        for url in pictures.iter().filter_map(picture_url) {
            draft.add_image(url);
        }
    }

    draft.finish()
}

#[cfg(test)]
#[path = "json_test.rs"]
mod tests;

//! Records from the tiles JSON that search and dealer endpoints return.

use carlister_core::{StatRow, VehicleRecord};
use serde_json::Value;

use crate::client::VDP_PATH;
use crate::detail::split_description;
use crate::extract::{
    absolutize, f64_at, first_match, format_mileage, parse_title, picture_url, str_at, u64_at,
    value_at, year_at, Strategy, TitleParts,
};
use crate::listing_id::extract_listing_id;
use crate::record::RecordDraft;

const LISTING_PREFIX: &str = "LISTING_";
const MERCH: &str = "MERCH";

/// A `MERCH` tile is a vehicle only if it carries one of these keys.
const VEHICLE_KEYS: [&str; 5] = ["makeName", "modelName", "carYear", "listingTitle", "vin"];

/// One tile's data plus the title parse used as a fallback source.
struct TileData<'a> {
    data: &'a Value,
    title: TitleParts,
}

fn is_vehicle_tile(kind: &str, data: &Value) -> bool {
    kind.starts_with(LISTING_PREFIX)
        || (kind == MERCH && VEHICLE_KEYS.iter().any(|k| data.get(*k).is_some()))
}

fn condition_for(kind: &str) -> Option<&'static str> {
    match kind {
        "LISTING_NEW_STANDARD" => Some("New"),
        "LISTING_USED_STANDARD" => Some("Used"),
        _ => None,
    }
}

fn make_name(t: &TileData<'_>) -> Option<String> {
    str_at(t.data, &["makeName"])
}

fn title_make(t: &TileData<'_>) -> Option<String> {
    t.title.make.clone()
}

fn model_name(t: &TileData<'_>) -> Option<String> {
    str_at(t.data, &["modelName"])
}

fn title_model(t: &TileData<'_>) -> Option<String> {
    t.title.model.clone()
}

fn car_year(t: &TileData<'_>) -> Option<u16> {
    year_at(t.data, &["carYear"]).or_else(|| year_at(t.data, &["year"]))
}

fn title_year(t: &TileData<'_>) -> Option<u16> {
    t.title.year
}

fn trim_name(t: &TileData<'_>) -> Option<String> {
    str_at(t.data, &["trimName"])
}

fn title_trim(t: &TileData<'_>) -> Option<String> {
    t.title.trim.clone()
}

fn price(t: &TileData<'_>) -> Option<f64> {
    f64_at(t.data, &["price"])
}

fn expected_price(t: &TileData<'_>) -> Option<f64> {
    f64_at(t.data, &["expectedPrice"])
}

fn price_string(t: &TileData<'_>) -> Option<f64> {
    f64_at(t.data, &["priceString"])
}

fn tile_listing_id(data: &Value) -> Option<String> {
    ["id", "listingId"].iter().find_map(|key| match data.get(*key) {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    })
}

fn tile_images(data: &Value, base_url: &str, draft: &mut RecordDraft) {
    let singles = [
        str_at(data, &["pictureUrl"]),
        str_at(data, &["originalPictureData", "url"]),
    ];
    for url in singles.into_iter().flatten() {
        if let Some(url) = absolutize(base_url, &url) {
            draft.add_image(url);
        }
    }
    if let Some(pictures) = value_at(data, &["pictures"]).and_then(Value::as_array) {
        for url in pictures.iter().filter_map(picture_url) {
            if let Some(url) = absolutize(base_url, &url) {
                draft.add_image(url);
            }
        }
    }
}

fn tile_features(data: &Value, extras: Option<&str>, draft: &mut RecordDraft) {
    if let Some(options) = data.get("options").and_then(Value::as_array) {
        for option in options {
            if let Some(name) = option
                .as_str()
                .map(str::to_owned)
                .or_else(|| str_at(option, &["name"]))
            {
                draft.add_feature(name);
            }
        }
    }
    for token in extras.into_iter().flat_map(|e| e.split(',')) {
        draft.add_feature(token);
    }
    let labelled = [
        ("Transmission", str_at(data, &["localizedTransmission"])),
        ("Drivetrain", str_at(data, &["localizedDriveTrain"])),
        ("Engine", str_at(data, &["localizedEngineDisplayName"])),
        (
            "Mileage",
            str_at(data, &["localizedMileage"])
                .or_else(|| u64_at(data, &["mileage"]).map(format_mileage)),
        ),
    ];
    for (label, value) in labelled {
        if let Some(value) = value {
            draft.add_feature(format!("{label}: {value}"));
        }
    }
}

/// Turns one tile into a record, or `None` for non-vehicle and unusable
/// tiles.
fn tile_record(tile: &Value, base_url: &str) -> Option<VehicleRecord> {
    let kind = tile.get("type").and_then(Value::as_str).unwrap_or_default();
    let data = tile.get("data").unwrap_or(tile);
    if !is_vehicle_tile(kind, data) {
        return None;
    }

    let src = TileData {
        data,
        title: str_at(data, &["listingTitle"])
            .map(|t| parse_title(&t))
            .unwrap_or_default(),
    };

    let linked_url = ["vdpUrl", "listingUrl"]
        .iter()
        .find_map(|key| str_at(data, &[*key]))
        .and_then(|href| absolutize(base_url, &href));
    let listing_id = tile_listing_id(data).or_else(|| {
        linked_url
            .as_deref()
            .and_then(extract_listing_id)
            .map(|id| id.as_str().to_owned())
    });
    let original_url = linked_url
        .or_else(|| {
            listing_id
                .as_ref()
                .map(|id| format!("{base_url}{VDP_PATH}?listingId={id}"))
        })
        .unwrap_or_else(|| base_url.to_owned());

    let mut draft = RecordDraft::new(original_url);
    draft.listing_id = listing_id;
    draft.make = first_match(&src, &[&make_name as Strategy<'_, _, _>, &title_make]);
    draft.model = first_match(&src, &[&model_name as Strategy<'_, _, _>, &title_model]);
    draft.year = first_match(&src, &[&car_year as Strategy<'_, _, _>, &title_year]);
    draft.trim = first_match(&src, &[&trim_name as Strategy<'_, _, _>, &title_trim]);
    draft.price = first_match(
        &src,
        &[&price as Strategy<'_, _, _>, &expected_price, &price_string],
    );
    draft.mileage = u64_at(data, &["mileage"]);

    let raw_description = str_at(data, &["description"]).unwrap_or_default();
    let (prose, extras) = split_description(&raw_description);
    if !prose.is_empty() {
        draft.description = Some(prose.to_owned());
    }
    tile_features(data, extras, &mut draft);
    tile_images(data, base_url, &mut draft);
    if let Some(condition) = condition_for(kind) {
        draft.stats.push(StatRow::new("Condition", condition));
    }

    match draft.finish() {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!(tile_type = kind, error = %e, "skipping unusable tile");
            None
        }
    }
}

/// Records for every usable vehicle tile, in tile order.
#[must_use]
pub fn records_from_tiles(tiles: &[Value], base_url: &str) -> Vec<VehicleRecord> {
    tiles
        .iter()
        .filter_map(|tile| tile_record(tile, base_url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://www.cargurus.com";

    #[test]
    fn used_tile_becomes_record_with_condition() {
        let tiles = vec![json!({
            "type": "LISTING_USED_STANDARD",
            "data": {
                "id": 412_345_678,
                "makeName": "Honda",
                "modelName": "Civic",
                "carYear": 2018,
                "trimName": "EX",
                "price": 17_250,
                "mileage": 38_000,
                "localizedTransmission": "Automatic",
                "pictureUrl": "https://static.cargurus.com/images/civic.jpg",
                "vdpUrl": "/Cars/inventorylisting/vdp.action?listingId=412345678"
            }
        })];
        let records = records_from_tiles(&tiles, BASE);
        assert_eq!(records.len(), 1);
        let car = &records[0];
        assert_eq!(car.full_title, "2018 Honda Civic EX");
        assert_eq!(car.listing_id.as_deref(), Some("412345678"));
        assert_eq!(
            car.original_url,
            "https://www.cargurus.com/Cars/inventorylisting/vdp.action?listingId=412345678"
        );
        assert_eq!(car.stats, vec![StatRow::new("Condition", "Used")]);
        assert_eq!(
            car.features,
            vec!["Transmission: Automatic", "Mileage: 38,000 mi"]
        );
        assert_eq!(car.images, vec!["https://static.cargurus.com/images/civic.jpg"]);
    }

    #[test]
    fn new_tile_condition_and_fallback_url() {
        let tiles = vec![json!({
            "type": "LISTING_NEW_STANDARD",
            "data": {"listingId": "499000111", "makeName": "Kia", "modelName": "Telluride", "carYear": 2024}
        })];
        let car = &records_from_tiles(&tiles, BASE)[0];
        assert_eq!(car.stats, vec![StatRow::new("Condition", "New")]);
        assert_eq!(
            car.original_url,
            "https://www.cargurus.com/Cars/inventorylisting/vdp.action?listingId=499000111"
        );
    }

    #[test]
    fn other_listing_types_have_no_condition_row() {
        let tiles = vec![json!({
            "type": "LISTING_CPO_FEATURED",
            "data": {"makeName": "Lexus", "modelName": "RX", "carYear": 2020}
        })];
        let car = &records_from_tiles(&tiles, BASE)[0];
        assert!(car.stats.is_empty());
        assert_eq!(car.original_url, BASE);
    }

    #[test]
    fn merch_tiles_need_vehicle_keys() {
        let tiles = vec![
            json!({"type": "MERCH", "data": {"headline": "Get pre-approved"}}),
            json!({"type": "MERCH", "data": {"listingTitle": "2015 Land Rover Range Rover Sport HSE"}}),
            json!({"type": "AD_SLOT", "data": {"makeName": "Ford", "modelName": "Focus", "carYear": 2014}}),
        ];
        let records = records_from_tiles(&tiles, BASE);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].make, "Land Rover");
        assert_eq!(records[0].model, "Range");
        assert_eq!(records[0].year, 2015);
    }

    #[test]
    fn description_extras_become_features() {
        let tiles = vec![json!({
            "type": "LISTING_USED_STANDARD",
            "data": {
                "makeName": "Mazda",
                "modelName": "CX-5",
                "carYear": 2021,
                "description": "Clean car[!@@Additional Info@@!]Heated Seats, Sunroof"
            }
        })];
        let car = &records_from_tiles(&tiles, BASE)[0];
        assert_eq!(car.description, "Clean car");
        assert_eq!(car.features, vec!["Heated Seats", "Sunroof"]);
    }

    #[test]
    fn unusable_tiles_are_dropped() {
        let tiles = vec![json!({
            "type": "LISTING_USED_STANDARD",
            "data": {"makeName": "Ford", "modelName": "Focus"}
        })];
        assert!(records_from_tiles(&tiles, BASE).is_empty());
    }
}

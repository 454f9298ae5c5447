//! Detail extraction from the rendered listing page.
//!
//! Used only when the JSON endpoint is unreachable or answers with markup.
//! Each field tries an ordered list of loose CSS selectors; the first
//! non-empty match wins.

use carlister_core::VehicleRecord;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::extract::{
    absolutize, first_match, normalize_whitespace, parse_price, parse_year, Strategy,
};
use crate::listing_id::extract_listing_id;
use crate::record::RecordDraft;

const MAKE_SELECTORS: &[&str] = &[
    r#"span[class*="make"]"#,
    r#"div[class*="vehicle-title"] span[class*="make"]"#,
    r#"h1[class*="title"] span[class*="make"]"#,
    r#"div[class*="car-info"] span[class*="make"]"#,
];

const MODEL_SELECTORS: &[&str] = &[
    r#"span[class*="model"]"#,
    r#"div[class*="vehicle-title"] span[class*="model"]"#,
    r#"h1[class*="title"] span[class*="model"]"#,
    r#"div[class*="car-info"] span[class*="model"]"#,
];

const YEAR_SELECTORS: &[&str] = &[
    r#"span[class*="year"]"#,
    r#"div[class*="vehicle-title"] span[class*="year"]"#,
    r#"h1[class*="title"] span[class*="year"]"#,
];

const TRIM_SELECTORS: &[&str] = &[
    r#"span[class*="trim"]"#,
    r#"h1[class*="title"] span[class*="trim"]"#,
];

const PRICE_SELECTORS: &[&str] = &[
    r#"span[class*="price"]"#,
    r#"div[class*="price"]"#,
    r#"span[class*="listing-price"]"#,
    r#"div[class*="listing-price"]"#,
    r#"span[class*="car-price"]"#,
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"div[class*="description"]"#,
    r#"div[class*="overview"]"#,
    r#"div[class*="vehicle-description"]"#,
    r#"p[class*="description"]"#,
    r#"div[class*="car-description"]"#,
];

const FEATURE_SELECTORS: &[&str] = &[
    r#"div[class*="features"] li"#,
    r#"div[class*="specs"] li"#,
    r#"ul[class*="features"] li"#,
    r#"div[class*="vehicle-features"] li"#,
    r#"div[class*="car-features"] li"#,
];

const IMAGE_SELECTORS: &[&str] = &[
    r#"img[class*="vehicle-image"]"#,
    r#"img[class*="car-image"]"#,
    r#"div[class*="gallery"] img"#,
    r#"img[class*="listing-image"]"#,
    r#"div[class*="car-gallery"] img"#,
];

/// Manufacturers recognized in the page `<title>`, matched in list order.
const KNOWN_MAKES: &[&str] = &[
    "Toyota",
    "Honda",
    "Ford",
    "Chevrolet",
    "Nissan",
    "BMW",
    "Mercedes",
    "Audi",
    "Lexus",
    "Hyundai",
    "Kia",
    "Subaru",
    "Volkswagen",
    "Mazda",
    "Jeep",
    "Dodge",
    "Tesla",
    "Cadillac",
    "Acura",
    "Infiniti",
];

/// Descriptions shorter than this are layout fragments, not prose.
const MIN_DESCRIPTION_LEN: usize = 10;

fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

/// Elements matched by each selector in turn. Unparseable selectors are
/// skipped.
fn select_all<'a>(doc: &'a Html, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .flat_map(|sel| doc.select(&sel).collect::<Vec<_>>())
        .collect()
}

/// First element text across `selectors` accepted by `accept`.
fn first_text<T>(
    doc: &Html,
    selectors: &[&str],
    accept: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    for sel_str in selectors {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(found) = doc
            .select(&sel)
            .next()
            .map(element_text)
            .and_then(|text| accept(&text))
        {
            return Some(found);
        }
    }
    None
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_owned())
}

fn selector_make(doc: &Html) -> Option<String> {
    first_text(doc, MAKE_SELECTORS, non_empty)
}

fn page_title_make(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").ok()?;
    let title = doc.select(&sel).next().map(element_text)?.to_lowercase();
    KNOWN_MAKES
        .iter()
        .find(|make| title.contains(&make.to_lowercase()))
        .map(|make| (*make).to_owned())
}

fn selector_model(doc: &Html) -> Option<String> {
    first_text(doc, MODEL_SELECTORS, non_empty)
}

fn selector_year(doc: &Html) -> Option<u16> {
    first_text(doc, YEAR_SELECTORS, parse_year)
}

fn page_text_year(doc: &Html) -> Option<u16> {
    parse_year(&doc.root_element().text().collect::<Vec<_>>().join(" "))
}

fn selector_trim(doc: &Html) -> Option<String> {
    first_text(doc, TRIM_SELECTORS, non_empty)
}

fn selector_price(doc: &Html) -> Option<f64> {
    first_text(doc, PRICE_SELECTORS, parse_price)
}

fn selector_description(doc: &Html) -> Option<String> {
    first_text(doc, DESCRIPTION_SELECTORS, |text| {
        (text.len() > MIN_DESCRIPTION_LEN).then(|| text.to_owned())
    })
}

/// Builds a record from a rendered listing page.
///
/// # Errors
///
/// Returns [`ScraperError::InsufficientData`] when make, model, or year
/// cannot be resolved.
pub fn extract_html(html: &str, source_url: &str) -> Result<VehicleRecord, ScraperError> {
    let doc = Html::parse_document(html);
    let mut draft = RecordDraft::new(source_url);

    draft.make = first_match(&doc, &[&selector_make as Strategy<'_, _, _>, &page_title_make]);
    draft.model = selector_model(&doc);
    draft.year = first_match(&doc, &[&selector_year as Strategy<'_, _, _>, &page_text_year]);
    draft.trim = selector_trim(&doc);
    draft.price = selector_price(&doc);
    draft.description = selector_description(&doc);
    draft.listing_id = extract_listing_id(source_url).map(|id| id.as_str().to_owned());

    for el in select_all(&doc, FEATURE_SELECTORS) {
        draft.add_feature(element_text(el));
    }
    for el in select_all(&doc, IMAGE_SELECTORS) {
        if let Some(src) = el
            .value()
            .attr("src")
            .and_then(|src| absolutize(source_url, src))
        {
            draft.add_image(src);
        }
    }

    draft.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carlister_core::vehicle::PLACEHOLDER_IMAGE_URL;

    const URL: &str = "https://www.cargurus.com/Cars/inventorylisting/vdp.action?listingId=418183121";

    const PAGE: &str = r#"<html>
        <head><title>Used 2018 Honda Accord Sport for sale</title></head>
        <body>
          <h1 class="vehicle-title-main">
            <span class="vehicle-year">2018</span>
            <span class="vehicle-make">Honda</span>
            <span class="vehicle-model">Accord</span>
            <span class="vehicle-trim">Sport</span>
          </h1>
          <span class="listing-price">$21,995</span>
          <div class="vehicle-description">Single owner, dealer maintained, no accidents.</div>
          <ul class="features-list"><li>Bluetooth</li><li>Sunroof</li><li>Bluetooth</li></ul>
          <div class="photo-gallery">
            <img src="/images/accord-1.jpg">
            <img src="//static.cargurus.com/images/accord-2.jpg">
            <img src="/images/accord-1.jpg">
          </div>
        </body></html>"#;

    #[test]
    fn selectors_populate_every_field() {
        let record = extract_html(PAGE, URL).unwrap();
        assert_eq!(record.make, "Honda");
        assert_eq!(record.model, "Accord");
        assert_eq!(record.year, 2018);
        assert_eq!(record.full_title, "2018 Honda Accord Sport");
        assert!((record.price - 21_995.0).abs() < f64::EPSILON);
        assert_eq!(
            record.description,
            "Single owner, dealer maintained, no accidents."
        );
        assert_eq!(record.features, vec!["Bluetooth", "Sunroof"]);
        assert_eq!(record.listing_id.as_deref(), Some("418183121"));
    }

    #[test]
    fn relative_images_resolve_against_listing_url() {
        let record = extract_html(PAGE, URL).unwrap();
        assert_eq!(
            record.images,
            vec![
                "https://www.cargurus.com/images/accord-1.jpg",
                "https://static.cargurus.com/images/accord-2.jpg",
            ]
        );
    }

    #[test]
    fn make_and_year_fall_back_to_page_scans() {
        let page = r#"<html><head><title>Great deal on a HYUNDAI</title></head>
            <body><span class="model-name">Elantra</span><p>Model year 2016, low miles.</p></body></html>"#;
        let record = extract_html(page, URL).unwrap();
        assert_eq!(record.make, "Hyundai");
        assert_eq!(record.model, "Elantra");
        assert_eq!(record.year, 2016);
        assert_eq!(record.images, vec![PLACEHOLDER_IMAGE_URL]);
    }

    #[test]
    fn page_without_identity_is_insufficient() {
        let err = extract_html("<html><body><p>Access denied</p></body></html>", URL).unwrap_err();
        assert!(
            matches!(err, ScraperError::InsufficientData { .. }),
            "expected InsufficientData, got: {err:?}"
        );
    }
}

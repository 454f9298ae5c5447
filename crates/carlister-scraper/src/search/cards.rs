//! Records from rendered result cards when no structured data is embedded.

use std::collections::HashSet;

use carlister_core::VehicleRecord;
use scraper::{ElementRef, Html, Selector};

use crate::extract::{absolutize, normalize_whitespace, parse_price, parse_title};
use crate::listing_id::extract_listing_id;
use crate::record::RecordDraft;

const CARD_SELECTORS: &[&str] = &[
    r#"article[class*="listing"]"#,
    r#"div[class*="result-tile"]"#,
    r#"div[class*="listing-row"]"#,
    r#"div[data-cg-ft="car-blade"]"#,
    r#"div[class*="car-blade"]"#,
];

const TITLE_SELECTOR: &str = r#"h4, h3, h2, [class*="title"]"#;
const PRICE_SELECTOR: &str = r#"[class*="price"]"#;
const MILEAGE_SELECTOR: &str = r#"[class*="mileage"], [class*="miles"]"#;

/// Upper bound on cards read from one page.
pub const MAX_CARDS: usize = 50;

fn text_of(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .map(text_of)
        .find(|text| !text.is_empty())
}

fn first_attr(card: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    card.select(selector)
        .find_map(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

struct CardSelectors {
    title: Selector,
    price: Selector,
    link: Selector,
    image: Selector,
    mileage: Selector,
}

impl CardSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            title: Selector::parse(TITLE_SELECTOR).ok()?,
            price: Selector::parse(PRICE_SELECTOR).ok()?,
            link: Selector::parse("a[href]").ok()?,
            image: Selector::parse("img[src]").ok()?,
            mileage: Selector::parse(MILEAGE_SELECTOR).ok()?,
        })
    }
}

fn card_record(card: ElementRef<'_>, sel: &CardSelectors, base_url: &str) -> Option<VehicleRecord> {
    let title = parse_title(&first_text(card, &sel.title)?);
    let link = first_attr(card, &sel.link, "href").and_then(|href| absolutize(base_url, &href));
    let listing_id = link
        .as_deref()
        .and_then(extract_listing_id)
        .map(|id| id.as_str().to_owned());

    let mut draft = RecordDraft::new(link.unwrap_or_else(|| base_url.to_owned()));
    draft.listing_id = listing_id;
    draft.year = title.year;
    draft.make = title.make;
    draft.model = title.model;
    draft.trim = title.trim;
    draft.price = first_text(card, &sel.price).and_then(|p| parse_price(&p));
    draft.mileage = first_text(card, &sel.mileage).and_then(|m| {
        m.chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok()
    });
    if let Some(src) = first_attr(card, &sel.image, "src").and_then(|s| absolutize(base_url, &s)) {
        draft.add_image(src);
    }

    draft.finish().ok()
}

/// Records from up to [`MAX_CARDS`] result cards, in document order per
/// selector. Cards matched by more than one selector are read once, and a
/// card nested inside another card of the same listing yields one record.
#[must_use]
pub fn records_from_cards(html: &str, base_url: &str) -> Vec<VehicleRecord> {
    let Some(sel) = CardSelectors::new() else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let mut seen_nodes = HashSet::new();
    let mut cards = Vec::new();

    for card_sel in CARD_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()) {
        for card in doc.select(&card_sel) {
            if seen_nodes.insert(card.id()) {
                cards.push(card);
            }
        }
    }

    tracing::debug!(cards = cards.len(), "parsing rendered result cards");
    let mut seen_ids = HashSet::new();
    cards
        .into_iter()
        .filter_map(|card| card_record(card, &sel, base_url))
        .filter(|record| match &record.listing_id {
            Some(id) => seen_ids.insert(id.clone()),
            None => true,
        })
        .take(MAX_CARDS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.cargurus.com";

    #[test]
    fn cards_yield_records() {
        let html = r#"<html><body>
            <div data-cg-ft="car-blade" class="car-blade-wrapper">
              <a href="/Cars/inventorylisting/vdp.action?listingId=401234567">
                <h4>2016 Mazda CX-5 Touring</h4>
              </a>
              <span class="price-value">$14,900</span>
              <span class="mileage-text">61,250 mi</span>
              <img src="https://static.cargurus.com/images/cx5.jpg">
            </div>
            <article class="listing-card">
              <h3>2012 Jeep Wrangler</h3>
              <a href="/Cars/l-401234999">details</a>
            </article>
            <div class="result-tile"><p>Sponsored</p></div>
        </body></html>"#;
        let records = records_from_cards(html, BASE);
        assert_eq!(records.len(), 2);

        let jeep = &records[0];
        assert_eq!(jeep.full_title, "2012 Jeep Wrangler");
        assert_eq!(jeep.listing_id.as_deref(), Some("401234999"));

        let mazda = &records[1];
        assert_eq!(mazda.full_title, "2016 Mazda CX-5 Touring");
        assert!((mazda.price - 14_900.0).abs() < f64::EPSILON);
        assert_eq!(mazda.mileage, Some(61_250));
        assert_eq!(mazda.listing_id.as_deref(), Some("401234567"));
        assert_eq!(
            mazda.original_url,
            "https://www.cargurus.com/Cars/inventorylisting/vdp.action?listingId=401234567"
        );
    }

    #[test]
    fn card_count_is_capped() {
        let card = r#"<div class="result-tile"><h4>2019 Ford Escape SE</h4></div>"#;
        let html = format!("<html><body>{}</body></html>", card.repeat(MAX_CARDS + 10));
        assert_eq!(records_from_cards(&html, BASE).len(), MAX_CARDS);
    }

    #[test]
    fn nested_cards_for_one_listing_are_read_once() {
        let html = r#"<html><body>
            <div class="listing-row">
              <div class="result-tile">
                <a href="/Cars/inventorylisting/vdp.action?listingId=405550001">
                  <h4>2020 Subaru Outback Premium</h4>
                </a>
              </div>
            </div>
            <div class="result-tile">
              <a href="/Cars/inventorylisting/vdp.action?listingId=405550002">
                <h4>2018 Toyota Tacoma SR5</h4>
              </a>
            </div>
        </body></html>"#;
        let ids: Vec<_> = records_from_cards(html, BASE)
            .into_iter()
            .filter_map(|r| r.listing_id)
            .collect();
        assert_eq!(ids, vec!["405550001", "405550002"]);
    }

    #[test]
    fn page_without_cards_is_empty() {
        assert!(records_from_cards("<html><body><p>No results</p></body></html>", BASE).is_empty());
    }
}

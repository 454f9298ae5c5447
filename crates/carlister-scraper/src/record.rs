//! Assembly of partially extracted fields into a validated [`VehicleRecord`].

use carlister_core::vehicle::{
    full_title, FEATURES_NOT_AVAILABLE, NO_DESCRIPTION, PLACEHOLDER_IMAGE_URL, UNKNOWN,
};
use carlister_core::{StatRow, VehicleRecord};
use chrono::Utc;

use crate::error::ScraperError;
use crate::extract::push_unique;

/// Fields gathered by an extractor before sentinels are applied.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordDraft {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<u16>,
    pub trim: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub stats: Vec<StatRow>,
    pub images: Vec<String>,
    pub mileage: Option<u64>,
    pub listing_id: Option<String>,
    pub original_url: String,
}

impl RecordDraft {
    pub(crate) fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            ..Self::default()
        }
    }

    pub(crate) fn add_feature(&mut self, feature: impl Into<String>) {
        push_unique(&mut self.features, feature);
    }

    pub(crate) fn add_image(&mut self, url: impl Into<String>) {
        push_unique(&mut self.images, url);
    }

    /// Applies sentinels, derives the full title, and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InsufficientData`] when make, model, or year
    /// did not resolve.
    pub(crate) fn finish(self) -> Result<VehicleRecord, ScraperError> {
        let make = self.make.unwrap_or_else(|| UNKNOWN.to_owned());
        let model = self.model.unwrap_or_else(|| UNKNOWN.to_owned());
        let year = self.year.unwrap_or(0);
        let trim = self
            .trim
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        let mut features = self.features;
        if features.is_empty() {
            features.push(FEATURES_NOT_AVAILABLE.to_owned());
        }
        let mut images = self.images;
        if images.is_empty() {
            images.push(PLACEHOLDER_IMAGE_URL.to_owned());
        }

        let record = VehicleRecord {
            full_title: full_title(year, &make, &model, trim.as_deref()),
            make,
            model,
            year,
            price: self.price.filter(|p| *p >= 0.0).unwrap_or(0.0),
            description: self
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_owned()),
            features,
            stats: self.stats,
            images,
            original_url: self.original_url,
            listing_id: self.listing_id,
            trim,
            mileage: self.mileage,
            scraped_at: Utc::now(),
        };

        if record.is_valid() {
            Ok(record)
        } else {
            tracing::debug!(
                url = %record.original_url,
                make = %record.make,
                model = %record.model,
                year = record.year,
                "discarding record with unresolved identity"
            );
            Err(ScraperError::InsufficientData {
                url: record.original_url,
            })
        }
    }
}

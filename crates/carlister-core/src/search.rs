use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::vehicle::VehicleRecord;
use crate::CoreError;

/// Dealer inventory filter accepted by the dealer pagination endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryType {
    #[default]
    All,
    New,
    Used,
    NewCertified,
}

impl std::fmt::Display for InventoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InventoryType::All => write!(f, "ALL"),
            InventoryType::New => write!(f, "NEW"),
            InventoryType::Used => write!(f, "USED"),
            InventoryType::NewCertified => write!(f, "NEW_CERTIFIED"),
        }
    }
}

impl FromStr for InventoryType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ALL" => Ok(InventoryType::All),
            "NEW" => Ok(InventoryType::New),
            "USED" => Ok(InventoryType::Used),
            "NEW_CERTIFIED" => Ok(InventoryType::NewCertified),
            _ => Err(CoreError::InvalidInventoryType(s.to_string())),
        }
    }
}

/// One page of search or dealer results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub cars: Vec<VehicleRecord>,
    pub total_count: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub success: bool,
    pub error_message: Option<String>,
    pub processing_time_secs: f64,
}

impl SearchResult {
    /// Builds a successful page. Navigation flags are derived from
    /// `current_page` and `total_pages`.
    #[must_use]
    pub fn page(
        cars: Vec<VehicleRecord>,
        total_count: u64,
        current_page: u32,
        total_pages: u32,
    ) -> Self {
        Self {
            cars,
            total_count,
            current_page,
            total_pages,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
            success: true,
            error_message: None,
            processing_time_secs: 0.0,
        }
    }

    /// A failed search: no cars, `success == false`, and a readable message.
    #[must_use]
    pub fn failure(current_page: u32, message: impl Into<String>) -> Self {
        Self {
            cars: Vec::new(),
            total_count: 0,
            current_page,
            total_pages: 0,
            has_next_page: false,
            has_previous_page: current_page > 1,
            success: false,
            error_message: Some(message.into()),
            processing_time_secs: 0.0,
        }
    }

    #[must_use]
    pub fn with_processing_time(mut self, secs: f64) -> Self {
        self.processing_time_secs = secs;
        self
    }
}

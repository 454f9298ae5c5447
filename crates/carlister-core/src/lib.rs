pub mod app_config;
pub mod config;
pub mod search;
pub mod vehicle;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use search::{InventoryType, SearchResult};
pub use vehicle::{StatRow, VehicleRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid inventory type: {0}")]
    InvalidInventoryType(String),
}

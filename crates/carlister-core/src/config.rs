use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://www.cargurus.com";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const DEFAULT_CORS_ORIGINS: &str = "https://car-lister-be093.web.app,https://car-lister-be093.firebaseapp.com,http://localhost:5212,http://localhost:3000";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a working
/// development config pointed at the live site.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("CARLISTER_ENV", "development"))?;

    let bind_addr = or_default("CARLISTER_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("CARLISTER_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("CARLISTER_LOG_LEVEL", "info");

    let base_url = or_default("CARLISTER_BASE_URL", DEFAULT_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "CARLISTER_BASE_URL",
            format!("\"{base_url}\" must start with http:// or https://"),
        ));
    }

    let request_timeout_secs = parse_u64("CARLISTER_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CARLISTER_USER_AGENT", DEFAULT_USER_AGENT);

    let max_attempts = parse_u32("CARLISTER_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid(
            "CARLISTER_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let retry_backoff_base_secs = parse_u64("CARLISTER_RETRY_BACKOFF_BASE_SECS", "1")?;

    let cors_origins = or_default("CARLISTER_CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        base_url,
        request_timeout_secs,
        user_agent,
        max_attempts,
        retry_backoff_base_secs,
        cors_origins,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CARLISTER_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

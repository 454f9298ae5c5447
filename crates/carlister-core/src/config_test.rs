use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CARLISTER_ENV"));
}

#[test]
fn build_app_config_defaults_from_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8000");
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.retry_backoff_base_secs, 1);
    assert_eq!(cfg.cors_origins.len(), 4);
}

#[test]
fn build_app_config_trims_trailing_slash_from_base_url() {
    let mut map = HashMap::new();
    map.insert("CARLISTER_BASE_URL", "http://127.0.0.1:9000/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.base_url, "http://127.0.0.1:9000");
}

#[test]
fn build_app_config_rejects_base_url_without_scheme() {
    let mut map = HashMap::new();
    map.insert("CARLISTER_BASE_URL", "www.cargurus.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLISTER_BASE_URL"),
        "expected InvalidEnvVar(CARLISTER_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("CARLISTER_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLISTER_BIND_ADDR"),
        "expected InvalidEnvVar(CARLISTER_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("CARLISTER_REQUEST_TIMEOUT_SECS", "thirty");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLISTER_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(CARLISTER_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_attempts() {
    let mut map = HashMap::new();
    map.insert("CARLISTER_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARLISTER_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(CARLISTER_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn build_app_config_splits_cors_origins() {
    let mut map = HashMap::new();
    map.insert(
        "CARLISTER_CORS_ORIGINS",
        " https://a.example.com , ,https://b.example.com",
    );
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.cors_origins,
        vec![
            "https://a.example.com".to_string(),
            "https://b.example.com".to_string()
        ]
    );
}

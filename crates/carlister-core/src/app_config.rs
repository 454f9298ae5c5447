use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Origin every upstream request is sent to.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Total attempts per upstream request, including the first.
    pub max_attempts: u32,
    pub retry_backoff_base_secs: u64,
    pub cors_origins: Vec<String>,
}

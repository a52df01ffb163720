//! Client configuration

use std::time::Duration;

/// Default collection holding employee rows
pub const DEFAULT_TABLE: &str = "employees";

/// Client configuration for connecting to the backend
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | STAFF_API_URL | http://localhost:54321 | Backend base URL |
/// | STAFF_API_KEY | (empty) | Project API key, sent as `apikey` |
/// | STAFF_REQUEST_TIMEOUT_SECS | 30 | Per-request timeout |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:54321")
    pub base_url: String,

    /// Project API key
    pub api_key: String,

    /// Collection holding employee rows
    pub table: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            timeout: 30,
        }
    }

    /// Load configuration from the environment (and `.env` if present)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let base_url =
            std::env::var("STAFF_API_URL").unwrap_or_else(|_| "http://localhost:54321".into());
        let api_key = std::env::var("STAFF_API_KEY").unwrap_or_default();
        let timeout = std::env::var("STAFF_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self::new(base_url, api_key).with_timeout(timeout)
    }

    /// Set the collection name
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("http://localhost:8080/", "key");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_builder_setters() {
        let config = ClientConfig::new("http://h", "k")
            .with_table("staff")
            .with_timeout(5);
        assert_eq!(config.table, "staff");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}

//! Mock backend configuration

/// Account the mock accepts at the password grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
}

/// Mock backend configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | MOCK_HTTP_PORT | 54321 | HTTP port |
/// | MOCK_JWT_SECRET | (development secret) | HS256 signing secret |
/// | MOCK_API_KEY | staff-mock-anon-key | Project key expected in `apikey` |
/// | MOCK_SEED_USERS | ana@example.com:password | `email:password` pairs, comma separated |
/// | MOCK_TOKEN_TTL_SECS | 3600 | Access token lifetime |
/// | LOG_LEVEL | info | Log filter |
/// | LOG_JSON | false | JSON log output |
/// | LOG_DIR | (none) | Daily rotating log files |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub jwt_secret: String,
    pub api_key: String,
    pub seed_users: Vec<SeedUser>,
    pub token_ttl_secs: i64,
    /// Collection served under `/rest/v1/{table}`
    pub table: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 54321,
            jwt_secret: "staff-mock-development-secret-change-me".into(),
            api_key: "staff-mock-anon-key".into(),
            seed_users: vec![SeedUser {
                email: "ana@example.com".into(),
                password: "password".into(),
            }],
            token_ttl_secs: 3600,
            table: "employees".into(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load from the environment, reading `.env` first
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        Self {
            http_port: std::env::var("MOCK_HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.http_port),
            jwt_secret: std::env::var("MOCK_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            api_key: std::env::var("MOCK_API_KEY").unwrap_or(defaults.api_key),
            seed_users: std::env::var("MOCK_SEED_USERS")
                .map(|v| parse_seed_users(&v))
                .unwrap_or(defaults.seed_users),
            token_ttl_secs: std::env::var("MOCK_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.token_ttl_secs),
            table: defaults.table,
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: std::env::var("LOG_JSON")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    pub fn with_seed_user(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.seed_users.push(SeedUser {
            email: email.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_token_ttl(mut self, seconds: i64) -> Self {
        self.token_ttl_secs = seconds;
        self
    }
}

/// Parses `a@x.com:pw1,b@x.com:pw2`; malformed entries are skipped
pub fn parse_seed_users(raw: &str) -> Vec<SeedUser> {
    raw.split(',')
        .filter_map(|entry| {
            let (email, password) = entry.trim().split_once(':')?;
            if email.is_empty() || password.is_empty() {
                tracing::warn!(entry, "Ignoring malformed seed user");
                return None;
            }
            Some(SeedUser {
                email: email.to_string(),
                password: password.to_string(),
            })
        })
        .collect()
}

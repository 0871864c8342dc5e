/*
 * Responsibility
 * - Client configuration from environment variables (.env is loaded first)
 * - Validation of required values (missing provider settings fail startup)
 */
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// What the consent gate does when the consent record cannot be written.
///
/// `FailOpen` lets the user past the gate with an in-memory record only.
/// `FailClosed` surfaces the storage error and keeps the gate shut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsentPersistPolicy {
    #[default]
    FailOpen,
    FailClosed,
}

impl FromStr for ConsentPersistPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(Self::FailOpen),
            "fail-closed" | "closed" => Ok(Self::FailClosed),
            _ => Err(ConfigError::Invalid("CONSENT_PERSIST_POLICY")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app_env: AppEnv,

    pub auth_domain: String,
    pub client_id: String,
    pub audience: String,
    pub redirect_uri: Url,

    pub api_base_url: Url,

    pub consent_store_dir: PathBuf,
    pub consent_persist_policy: ConsentPersistPolicy,

    pub step_up_lenient_codes: bool,
    pub require_customer_type: bool,

    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let auth_domain = required("AUTH0_DOMAIN")?;
        let client_id = required("AUTH0_CLIENT_ID")?;
        let audience = required("AUTH0_AUDIENCE")?;

        let redirect_uri = lookup("REDIRECT_URI")
            .unwrap_or_else(|| "http://127.0.0.1:8765/callback".to_string())
            .parse::<Url>()
            .map_err(|_| ConfigError::Invalid("REDIRECT_URI"))?;

        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .parse::<Url>()
            .map_err(|_| ConfigError::Invalid("API_BASE_URL"))?;

        let consent_store_dir = lookup("CONSENT_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".ciam"));

        let consent_persist_policy = match lookup("CONSENT_PERSIST_POLICY") {
            Some(raw) => raw.parse()?,
            None => ConsentPersistPolicy::default(),
        };

        let step_up_lenient_codes = parse_bool(
            lookup("STEP_UP_LENIENT_CODES"),
            true,
            "STEP_UP_LENIENT_CODES",
        )?;
        let require_customer_type = parse_bool(
            lookup("REQUIRE_CUSTOMER_TYPE"),
            true,
            "REQUIRE_CUSTOMER_TYPE",
        )?;

        let http_timeout = lookup("HTTP_TIMEOUT_SECONDS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"))?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(15));

        Ok(Self {
            app_env,
            auth_domain,
            client_id,
            audience,
            redirect_uri,
            api_base_url,
            consent_store_dir,
            consent_persist_policy,
            step_up_lenient_codes,
            require_customer_type,
            http_timeout,
        })
    }

    /// `https://{domain}/`, the base every provider endpoint hangs off.
    pub fn provider_base_url(&self) -> Result<Url, ConfigError> {
        let domain = self.auth_domain.trim_end_matches('/');
        let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{domain}/")
        } else {
            format!("https://{domain}/")
        };
        raw.parse().map_err(|_| ConfigError::Invalid("AUTH0_DOMAIN"))
    }
}

fn parse_bool(raw: Option<String>, default: bool, key: &'static str) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key)),
    }
}

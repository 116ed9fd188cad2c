use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Legacy environment variables the original deployment used for the
/// public-facing application URL, checked in this order when the explicit
/// `APP__APP_BASE_URL` setting is absent.
const LEGACY_BASE_URL_VARS: [&str; 4] = [
    "WEB_APP_URL",
    "NEXT_PUBLIC_WEB_URL",
    "NEXT_PUBLIC_APP_URL",
    "APP_URL",
];

/// Application configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key (minimum 64 characters)
    #[validate(length(min = 64), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    pub jwt_expiration: usize,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Public application base URL used for checkout callback links.
    /// When absent or invalid the request's own origin is used instead.
    #[serde(default)]
    pub app_base_url: Option<String>,

    /// Stripe secret API key
    #[serde(default)]
    pub stripe_secret_key: String,

    /// ISO 4217 currency code used for checkout line items
    #[serde(default = "default_currency")]
    pub currency: String,

    /// JWT issuer name
    #[serde(default = "default_auth_issuer")]
    pub auth_issuer: String,

    /// JWT audience
    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,
}

/// Configuration handed to the payment component at construction, so the
/// checkout flow never reads ambient environment state.
#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub base_url_override: Option<String>,
    pub stripe_secret_key: String,
    pub currency: String,
}

impl AppConfig {
    /// Creates a new configuration (primarily for tests)
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            app_base_url: None,
            stripe_secret_key: String::new(),
            currency: default_currency(),
            auth_issuer: default_auth_issuer(),
            auth_audience: default_auth_audience(),
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Extracts the explicit configuration object the payment component
    /// receives at construction.
    pub fn payment_config(&self) -> PaymentConfig {
        PaymentConfig {
            base_url_override: self.app_base_url.clone(),
            stripe_secret_key: self.stripe_secret_key.clone(),
            currency: self.currency.clone(),
        }
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or opt in via APP__CORS_ALLOW_ANY_ORIGIN=true"
                    .into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default");
            err.message =
                Some("The built-in development JWT secret cannot be used outside development".into());
            errors.add("jwt_secret", err);
        }

        if !self.is_development() && self.stripe_secret_key.trim().is_empty() {
            let mut err = ValidationError::new("stripe_secret_key_required");
            err.message =
                Some("APP__STRIPE_SECRET_KEY (or STRIPE_SECRET_KEY) must be set outside development".into());
            errors.add("stripe_secret_key", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    if secret.trim().is_empty() {
        let mut err = ValidationError::new("jwt_secret_empty");
        err.message = Some("JWT secret must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_currency() -> String {
    "zar".to_string()
}
fn default_auth_issuer() -> String {
    "plateful-auth".to_string()
}
fn default_auth_audience() -> String {
    "plateful-api".to_string()
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("plateful_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration.
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. config/default.toml and config/{env}.toml (both optional)
/// 3. Environment variables (APP__*)
/// 4. Legacy environment variables for the base URL and Stripe key
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://plateful.db?mode=rwc")?
        .set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?
        .set_default("jwt_expiration", 3600)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let mut cfg: AppConfig = config.try_deserialize()?;

    if cfg.app_base_url.is_none() {
        cfg.app_base_url = LEGACY_BASE_URL_VARS
            .iter()
            .find_map(|name| env::var(name).ok())
            .filter(|value| !value.trim().is_empty());
    }

    if cfg.stripe_secret_key.trim().is_empty() {
        if let Ok(key) = env::var("STRIPE_SECRET_KEY") {
            cfg.stripe_secret_key = key;
        }
    }

    cfg.validate()?;
    cfg.validate_additional_constraints()?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".to_string(),
            DEV_DEFAULT_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            8080,
            "development".to_string(),
        )
    }

    #[test]
    fn development_allows_permissive_cors() {
        let cfg = dev_config();
        assert!(cfg.should_allow_permissive_cors());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn production_rejects_dev_jwt_secret() {
        let mut cfg = dev_config();
        cfg.environment = "production".to_string();
        cfg.cors_allowed_origins = Some("https://plateful.app".to_string());
        cfg.stripe_secret_key = "sk_live_123".to_string();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn payment_config_carries_override_and_currency() {
        let mut cfg = dev_config();
        cfg.app_base_url = Some("https://app.example.com".to_string());
        cfg.stripe_secret_key = "sk_test_abc".to_string();

        let payment = cfg.payment_config();
        assert_eq!(
            payment.base_url_override.as_deref(),
            Some("https://app.example.com")
        );
        assert_eq!(payment.currency, "zar");
        assert_eq!(payment.stripe_secret_key, "sk_test_abc");
    }
}

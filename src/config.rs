use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_BUCKET: &str = "private";
const DEFAULT_CACHE_CONTROL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_NOTES_DEBOUNCE_MS: u64 = 2500;
const DEFAULT_SAVED_VIEWS_DEBOUNCE_MS: u64 = 500;
const DEFAULT_MESSAGE_QUEUE_NAMESPACE: &str = "erp:tasks";
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Object storage settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// "in-memory" or "s3"
    #[serde(default = "default_storage_backend")]
    #[validate(custom = "validate_storage_backend")]
    pub backend: String,

    /// Bucket holding company documents
    #[serde(default = "default_bucket")]
    #[validate(length(min = 1))]
    pub bucket: String,

    /// Cache-Control max-age applied to uploaded documents
    #[serde(default = "default_cache_control_secs")]
    pub cache_control_secs: u64,

    #[serde(default)]
    pub s3_region: Option<String>,

    #[serde(default)]
    pub s3_endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            bucket: default_bucket(),
            cache_control_secs: default_cache_control_secs(),
            s3_region: None,
            s3_endpoint: None,
        }
    }
}

/// Document renderer settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RendererConfig {
    /// Base URL of the PDF rendering service
    #[serde(default = "default_renderer_base_url")]
    pub base_url: String,

    #[serde(default = "default_renderer_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_url: default_renderer_base_url(),
            timeout_secs: default_renderer_timeout_secs(),
        }
    }
}

/// Outbound email settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// "log" or "smtp"
    #[serde(default = "default_email_backend")]
    #[validate(custom = "validate_email_backend")]
    pub backend: String,

    /// Sender used for system mail such as invites
    #[serde(default = "default_email_from")]
    pub from: String,

    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: default_email_backend(),
            from: default_email_from(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DebounceConfig {
    /// Quiet period after the last edit before the pending write is flushed
    #[validate(range(min = 1, max = 60000))]
    pub debounce_ms: u64,
}

impl DebounceConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_notes_config() -> DebounceConfig {
    DebounceConfig {
        debounce_ms: DEFAULT_NOTES_DEBOUNCE_MS,
    }
}

fn default_saved_views_config() -> DebounceConfig {
    DebounceConfig {
        debounce_ms: DEFAULT_SAVED_VIEWS_DEBOUNCE_MS,
    }
}

/// Release pipeline settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
    /// "status-last" commits the status after the document is stored,
    /// "status-first" commits it before rendering
    #[serde(default = "default_release_ordering")]
    #[validate(custom = "validate_release_ordering")]
    pub ordering: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            ordering: default_release_ordering(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Redis connection URL, used when the task queue backend is redis
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// JWT secret key (minimum 64 characters)
    #[validate(length(min = 64), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_auth_issuer")]
    pub auth_issuer: String,

    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,

    /// Secret used to sign flash cookies; falls back to the JWT secret
    #[serde(default)]
    pub flash_secret: Option<String>,

    /// Public URL of the web application, used in invite links
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Capacity of the in-process domain event channel
    #[serde(default = "default_event_channel_capacity")]
    #[validate(range(min = 1))]
    pub event_channel_capacity: usize,

    /// "in-memory" or "redis"
    #[serde(default = "default_message_queue_backend")]
    #[validate(custom = "validate_message_queue_backend")]
    pub message_queue_backend: String,

    #[serde(default = "default_message_queue_namespace")]
    pub message_queue_namespace: String,

    /// Poll interval of the background task worker
    #[serde(default = "default_task_poll_interval_ms")]
    #[validate(range(min = 10))]
    pub task_poll_interval_ms: u64,

    #[serde(default)]
    #[validate]
    pub storage: StorageConfig,

    #[serde(default)]
    #[validate]
    pub renderer: RendererConfig,

    #[serde(default)]
    #[validate]
    pub email: EmailConfig,

    #[serde(default = "default_notes_config")]
    #[validate]
    pub notes: DebounceConfig,

    #[serde(default = "default_saved_views_config")]
    #[validate]
    pub saved_views: DebounceConfig,

    #[serde(default)]
    #[validate]
    pub release: ReleaseConfig,
}

impl AppConfig {
    /// Creates a configuration with defaults for every optional section
    pub fn new(
        database_url: String,
        jwt_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            redis_url: default_redis_url(),
            jwt_secret,
            auth_issuer: default_auth_issuer(),
            auth_audience: default_auth_audience(),
            flash_secret: None,
            app_url: default_app_url(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            message_queue_backend: default_message_queue_backend(),
            message_queue_namespace: default_message_queue_namespace(),
            task_poll_interval_ms: default_task_poll_interval_ms(),
            storage: StorageConfig::default(),
            renderer: RendererConfig::default(),
            email: EmailConfig::default(),
            notes: default_notes_config(),
            saved_views: default_saved_views_config(),
            release: ReleaseConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
            || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn flash_secret(&self) -> &str {
        self.flash_secret.as_deref().unwrap_or(&self.jwt_secret)
    }

    pub fn task_poll_interval(&self) -> Duration {
        Duration::from_millis(self.task_poll_interval_ms)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used outside development. Set APP__JWT_SECRET to a unique, secure value."
                    .into(),
            );
            errors.add("jwt_secret", err);
        }

        if self.storage.backend.eq_ignore_ascii_case("s3") && !cfg!(feature = "s3") {
            let mut err = ValidationError::new("storage_backend_unavailable");
            err.message = Some("storage.backend = \"s3\" requires the `s3` feature".into());
            errors.add("storage", err);
        }

        if self.email.backend.eq_ignore_ascii_case("smtp") {
            if !cfg!(feature = "smtp") {
                let mut err = ValidationError::new("email_backend_unavailable");
                err.message = Some("email.backend = \"smtp\" requires the `smtp` feature".into());
                errors.add("email", err);
            } else if self.email.smtp_host.is_none() {
                let mut err = ValidationError::new("smtp_host_required");
                err.message = Some("email.smtp_host is required for the smtp backend".into());
                errors.add("email", err);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}
fn default_auth_issuer() -> String {
    "erp-api".to_string()
}
fn default_auth_audience() -> String {
    "erp-web".to_string()
}
fn default_app_url() -> String {
    "http://localhost:3000".to_string()
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
fn default_event_channel_capacity() -> usize {
    1024
}
fn default_message_queue_backend() -> String {
    "in-memory".to_string()
}
fn default_message_queue_namespace() -> String {
    DEFAULT_MESSAGE_QUEUE_NAMESPACE.to_string()
}
fn default_task_poll_interval_ms() -> u64 {
    250
}
fn default_storage_backend() -> String {
    "in-memory".to_string()
}
fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}
fn default_cache_control_secs() -> u64 {
    DEFAULT_CACHE_CONTROL_SECS
}
fn default_renderer_base_url() -> String {
    "http://localhost:3001".to_string()
}
fn default_renderer_timeout_secs() -> u64 {
    30
}
fn default_email_backend() -> String {
    "log".to_string()
}
fn default_email_from() -> String {
    "ERP <no-reply@erp.local>".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_release_ordering() -> String {
    "status-last".to_string()
}

fn one_of(value: &str, code: &'static str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.iter().any(|a| value.eq_ignore_ascii_case(a)) {
        Ok(())
    } else {
        let mut err = ValidationError::new(code);
        err.message = Some(format!("Must be one of: {}", allowed.join(", ")).into());
        Err(err)
    }
}

fn validate_storage_backend(value: &str) -> Result<(), ValidationError> {
    one_of(value, "storage_backend", &["in-memory", "s3"])
}

fn validate_email_backend(value: &str) -> Result<(), ValidationError> {
    one_of(value, "email_backend", &["log", "smtp"])
}

fn validate_message_queue_backend(value: &str) -> Result<(), ValidationError> {
    one_of(value, "message_queue_backend", &["in-memory", "redis"])
}

fn validate_release_ordering(value: &str) -> Result<(), ValidationError> {
    one_of(value, "release_ordering", &["status-last", "status-first"])
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    one_of(
        level,
        "log_level",
        &["trace", "debug", "info", "warn", "error"],
    )
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    if trimmed.len() < 64 {
        let mut err = ValidationError::new("jwt_secret");
        err.message =
            Some("JWT secret must be at least 64 characters for adequate security".into());
        return Err(err);
    }

    if let Some(first) = trimmed.chars().next() {
        if trimmed.chars().all(|c| c == first) {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some("JWT secret cannot be a repeated character sequence".into());
            return Err(err);
        }
    }

    let unique_chars: std::collections::HashSet<char> = trimmed.chars().collect();
    if unique_chars.len() < 10 {
        let mut err = ValidationError::new("jwt_secret");
        err.message =
            Some("JWT secret must have at least 10 unique characters for adequate entropy".into());
        return Err(err);
    }

    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("erp_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Loads configuration from an explicit directory and profile
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let default_file = config_dir.join("default");
    let env_file = config_dir.join(run_env);

    // jwt_secret has no default on purpose
    let config = Config::builder()
        .set_default("database_url", "sqlite://erp.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_file.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET (minimum 64 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

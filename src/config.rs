use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Application configuration, loaded from `config/*.toml` plus `APP__`
/// prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment ("development", "production", ...)
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

    /// Maximum number of database connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Minimum number of database connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Comma-separated list of allowed CORS origins; unset means permissive
    /// CORS in development and an error in production.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
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

impl AppConfig {
    /// Programmatic constructor used by tests and tools.
    pub fn new(
        database_url: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            host: host.into(),
            port,
            environment: environment.into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            cors_allowed_origins: None,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
            || self.environment.eq_ignore_ascii_case("dev")
            || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Loads configuration from layered sources: `config/default.toml`, then
/// `config/<environment>.toml`, then `APP__*` environment variables.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("APP__ENVIRONMENT")
        .or_else(|_| env::var("APP_ENVIRONMENT"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let default_path = Path::new(CONFIG_DIR).join("default");
    let env_path = Path::new(CONFIG_DIR).join(&run_env);

    let cfg: AppConfig = Config::builder()
        .set_default("environment", run_env.clone())?
        .set_default("host", "0.0.0.0")?
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    Ok(cfg)
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("metalworks_api={level},tower_http=info");
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::try_new(filter_directive)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programmatic_config_validates() {
        let cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18080, "test");
        assert!(cfg.validate().is_ok());
        assert!(cfg.is_development());
    }

    #[test]
    fn empty_database_url_is_rejected() {
        let cfg = AppConfig::new("", "127.0.0.1", 18080, "test");
        assert!(cfg.validate().is_err());
    }
}

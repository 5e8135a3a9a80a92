use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::mailer::mailer_from_config;
use crate::schemas::AppState;

/// Runtime settings of the service.
///
/// Every field can be set in an optional `ums.{toml,yaml,json}` file next to
/// the binary or through the upper-case environment variable of the same
/// name (`DATABASE_URL`, `JWT_SECRET`, ...). Environment wins.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub jwt_expiration_seconds: i64,
    /// Base URL of the admin frontend, used to build password reset links
    pub frontend_url: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub metrics_enabled: bool,
    pub bcrypt_cost: u32,
    pub cache_ttl_seconds: u64,
    /// Lifetime of a password reset token
    pub reset_token_ttl_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ums.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            jwt_secret: "change-me".to_string(),
            jwt_expiration_seconds: 86_400,
            frontend_url: "http://localhost:5173".to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "no-reply@university.local".to_string(),
            metrics_enabled: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cache_ttl_seconds: 60,
            reset_token_ttl_minutes: 60,
        }
    }
}

impl AppConfig {
    /// Loads `.env`, the optional `ums` config file and the environment.
    pub fn load() -> Result<Self> {
        trace!("Loading application configuration");
        dotenvy::dotenv().ok();

        let defaults = AppConfig::default();
        let settings = config::Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_seconds", defaults.jwt_expiration_seconds)?
            .set_default("frontend_url", defaults.frontend_url)?
            .set_default("smtp_port", i64::from(defaults.smtp_port))?
            .set_default("smtp_from", defaults.smtp_from)?
            .set_default("metrics_enabled", defaults.metrics_enabled)?
            .set_default("bcrypt_cost", i64::from(defaults.bcrypt_cost))?
            .set_default("cache_ttl_seconds", defaults.cache_ttl_seconds)?
            .set_default("reset_token_ttl_minutes", defaults.reset_token_ttl_minutes)?
            .add_source(config::File::with_name("ums").required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        if config.jwt_secret == "change-me" {
            tracing::warn!("JWT_SECRET is not set, using the built-in development secret");
        }
        debug!("Configuration loaded, database: {}", config.database_url);
        Ok(config)
    }
}

/// Initialize application state from a loaded configuration
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    let cache = Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
        .build();

    let mailer = mailer_from_config(&config)?;

    Ok(AppState {
        db,
        cache,
        config: Arc::new(config),
        mailer,
    })
}

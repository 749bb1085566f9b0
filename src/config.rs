use crate::auth::AuthConfig;
use crate::schemas::AppState;
use anyhow::Result;
use config::{Config, Environment};
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Runtime settings, layered from defaults, `.env` and the process environment.
///
/// Every field maps to the upper-case environment variable of the same name,
/// e.g. `database_url` is read from `DATABASE_URL`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("database_url", "sqlite://socialnet.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("token_ttl_minutes", 60_i64)?
            .set_default("request_timeout_secs", 30_i64)?
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET is not set, using the built-in development secret");
        }
        debug!(
            "Loaded settings: bind_address={}, token_ttl_minutes={}, request_timeout_secs={}",
            settings.bind_address, settings.token_ttl_minutes, settings.request_timeout_secs
        );

        Ok(settings)
    }

    /// Applies command line values on top of the loaded settings
    pub fn override_with(&mut self, database_url: Option<String>, bind_address: Option<String>) {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connect to the database and build the shared application state
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let auth = AuthConfig::new(settings.jwt_secret.clone(), settings.token_ttl_minutes);

    Ok(AppState {
        db,
        auth: Arc::new(auth),
    })
}

use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::Context;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub bind_addr: String,
    pub max_db_connections: u32,
    pub comments_stale_after: Duration,
    pub comments_cache_time: Duration,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let secret_key = env::var("SECRET_KEY").context("SECRET_KEY must be set")?;

        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://recipe_box.db")?,
            secret_key,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:8000")?,
            max_db_connections: try_load("MAX_DB_CONNECTIONS", "5")?,
            comments_stale_after: Duration::from_secs(try_load("COMMENTS_STALE_SECS", "30")?),
            comments_cache_time: Duration::from_secs(try_load("COMMENTS_CACHE_SECS", "300")?),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("invalid {key} value {raw:?}: {e}")
    })
}

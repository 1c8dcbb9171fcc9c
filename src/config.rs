use std::{env, fmt::Display, str::FromStr};

use anyhow::Context;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub frontend_url: Option<String>,
    pub preview_origin_suffix: Option<String>,
    pub static_dir: String,
    pub mode: RuntimeMode,
    pub trust_proxy: bool,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max: usize,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mode = match try_load::<String>("APP_ENV", "production").as_str() {
            "development" => RuntimeMode::Development,
            _ => RuntimeMode::Production,
        };

        Ok(Self {
            port: try_load("PORT", "3000"),
            database_url: env::var("DATABASE_URL").context("DATABASE_URL")?,
            frontend_url: var("FRONTEND_URL").ok().filter(|s| !s.is_empty()),
            preview_origin_suffix: var("PREVIEW_ORIGIN_SUFFIX")
                .ok()
                .filter(|s| !s.is_empty()),
            static_dir: try_load("STATIC_DIR", "public"),
            mode,
            trust_proxy: try_load("TRUST_PROXY", "false"),
            rate_limit_window_secs: try_load("RATE_LIMIT_WINDOW_SECS", "900"),
            rate_limit_max: try_load("RATE_LIMIT_MAX", "100"),
        })
    }

    pub fn is_development(&self) -> bool {
        self.mode == RuntimeMode::Development
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

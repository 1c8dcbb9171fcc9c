use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    database::init_postgres,
    middleware::RateLimiter,
    repository::{ExperienceRepository, PgExperienceRepository},
};

pub struct AppState {
    pub config: Config,
    pub repository: Arc<dyn ExperienceRepository>,
    pub limiter: RateLimiter,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Arc<Self>> {
        let config = Config::load()?;

        let pool = init_postgres(&config.database_url).await?;
        let repository = Arc::new(PgExperienceRepository::new(pool));

        Ok(Arc::new(Self::with_repository(config, repository)))
    }

    /// Assembles state around an already-built repository; tests use this to
    /// inject an in-memory one.
    pub fn with_repository(config: Config, repository: Arc<dyn ExperienceRepository>) -> Self {
        let limiter = RateLimiter::new(
            Duration::from_secs(config.rate_limit_window_secs),
            config.rate_limit_max,
        );

        Self {
            config,
            repository,
            limiter,
        }
    }
}

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{CountryCount, Experience};

/// Storage port for experience records. The route layer only sees this
/// trait, so tests can substitute an in-memory implementation.
#[async_trait]
pub trait ExperienceRepository: Send + Sync {
    /// All records, newest first.
    async fn list_all(&self) -> Result<Vec<Experience>, sqlx::Error>;

    /// Records whose country exactly equals the argument, newest first.
    /// No matches is an empty list, not an error.
    async fn list_by_country(&self, country: &str) -> Result<Vec<Experience>, sqlx::Error>;

    /// Record count per distinct country, largest first.
    async fn count_by_country(&self) -> Result<Vec<CountryCount>, sqlx::Error>;

    /// Persists a new record; id and timestamp are storage-assigned.
    async fn create(
        &self,
        country: &str,
        name: &str,
        content: &str,
    ) -> Result<Experience, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgExperienceRepository {
    pool: PgPool,
}

impl PgExperienceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExperienceRepository for PgExperienceRepository {
    async fn list_all(&self) -> Result<Vec<Experience>, sqlx::Error> {
        sqlx::query_as::<_, Experience>(
            "SELECT id, country, name, content, created_at
             FROM experiences
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_by_country(&self, country: &str) -> Result<Vec<Experience>, sqlx::Error> {
        sqlx::query_as::<_, Experience>(
            "SELECT id, country, name, content, created_at
             FROM experiences
             WHERE country = $1
             ORDER BY created_at DESC",
        )
        .bind(country)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_by_country(&self) -> Result<Vec<CountryCount>, sqlx::Error> {
        // country ASC breaks count ties deterministically
        sqlx::query_as::<_, CountryCount>(
            "SELECT country, COUNT(*) AS count
             FROM experiences
             GROUP BY country
             ORDER BY count DESC, country ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create(
        &self,
        country: &str,
        name: &str,
        content: &str,
    ) -> Result<Experience, sqlx::Error> {
        sqlx::query_as::<_, Experience>(
            "INSERT INTO experiences (country, name, content)
             VALUES ($1, $2, $3)
             RETURNING id, country, name, content, created_at",
        )
        .bind(country)
        .bind(name)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }
}

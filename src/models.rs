use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted travel note tied to a country. Immutable once created.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub country: String,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Per-country record count for the stats endpoint, ordered by count desc.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

/// Body of POST /api/countries/:name/experiences.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewExperience {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use crate::{
    error::AppError,
    models::{CountryCount, Experience, NewExperience},
    state::AppState,
    validate::validate_experience,
};

pub async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Travel backend API is running" }))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

pub async fn list_experiences_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Experience>>, AppError> {
    info!("Attempting to fetch all experiences");

    let experiences = state.repository.list_all().await.map_err(|e| {
        AppError::storage(
            "Error fetching all experiences",
            e,
            state.config.is_development(),
        )
    })?;

    info!("Found {} experiences", experiences.len());
    Ok(Json(experiences))
}

pub async fn experience_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CountryCount>>, AppError> {
    info!("GET /api/experiences/stats");

    let stats = state.repository.count_by_country().await.map_err(|e| {
        AppError::storage(
            "Error fetching experience statistics",
            e,
            state.config.is_development(),
        )
    })?;

    Ok(Json(stats))
}

pub async fn country_experiences_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Experience>>, AppError> {
    info!("GET /api/countries/{name}/experiences");

    let experiences = state
        .repository
        .list_by_country(&name)
        .await
        .map_err(|e| {
            AppError::storage("Error fetching experiences", e, state.config.is_development())
        })?;

    Ok(Json(experiences))
}

pub async fn create_experience_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<NewExperience>,
) -> Result<Json<Experience>, AppError> {
    info!(
        "POST /api/countries/{name}/experiences: {}",
        json!(payload)
    );

    let violations = validate_experience(&name, &payload.name, &payload.content);
    if !violations.is_empty() {
        return Err(AppError::Validation(violations));
    }

    let experience = state
        .repository
        .create(name.trim(), payload.name.trim(), payload.content.trim())
        .await
        .map_err(|e| {
            AppError::storage("Error creating experience", e, state.config.is_development())
        })?;

    Ok(Json(experience))
}

pub async fn not_found_handler(method: Method, uri: Uri) -> AppError {
    info!("404 Not Found: {method} {uri}");

    AppError::NotFound {
        path: uri.path().to_string(),
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::validate::Violation;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<Violation>),

    #[error("{message}")]
    Storage {
        message: String,
        // populated only in development mode
        details: Option<String>,
    },

    #[error("Not Found")]
    NotFound { path: String },
}

impl AppError {
    pub fn storage(message: &str, source: sqlx::Error, expose_details: bool) -> Self {
        tracing::error!("Database Error: {source}");

        AppError::Storage {
            message: message.to_string(),
            details: expose_details.then(|| source.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": violations })),
            )
                .into_response(),

            AppError::Storage { message, details } => {
                let mut body = json!({ "error": message });
                if let Some(details) = details {
                    body["details"] = json!(details);
                }

                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }

            AppError::NotFound { path } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Not Found", "path": path })),
            )
                .into_response(),
        }
    }
}

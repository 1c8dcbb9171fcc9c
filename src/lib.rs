//! Backend for country-scoped travel experience notes.
//!
//! A single axum server fronting a Postgres store: inbound requests pass
//! through the rate limiter, the CORS policy, and body parsing before the
//! route handlers validate input and call into the experience repository.
//! Unmatched paths fall through to static assets, then to a JSON 404.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    handler::HandlerWithoutStateExt,
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod validate;

use config::Config;
use middleware::rate_limit;
use routes::{
    country_experiences_handler, create_experience_handler, experience_stats_handler,
    health_handler, list_experiences_handler, not_found_handler, root_handler,
};
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address} in {:?} mode", state.config.mode);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    println!("Server shutting down...");
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    let static_files = ServeDir::new(&state.config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found_handler.into_service());

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/experiences", get(list_experiences_handler))
        .route("/api/experiences/stats", get(experience_stats_handler))
        .route(
            "/api/countries/{name}/experiences",
            get(country_experiences_handler).post(create_experience_handler),
        )
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom({
            let expose_details = state.config.is_development();
            move |err: Box<dyn std::any::Any + Send + 'static>| handle_panic(err, expose_details)
        }))
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}

/// Last-resort handler: anything escaping a route becomes a 5xx response and
/// the process keeps serving. Detail leaves the server only in development.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>, expose_details: bool) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!("Error: {detail}");

    let mut body = json!({ "error": "Internal Server Error" });
    if expose_details {
        body["message"] = json!(detail);
    }

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Exact-match allow-list (local dev plus the configured front-end) with an
/// optional suffix match for preview-deployment origins. Requests without an
/// Origin header bypass CORS entirely.
fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins = vec![HeaderValue::from_static("http://localhost:5173")];
    if let Some(frontend) = config
        .frontend_url
        .as_deref()
        .and_then(|url| HeaderValue::from_str(url).ok())
    {
        origins.push(frontend);
    }

    let suffix = config.preview_origin_suffix.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origins.iter().any(|allowed| allowed == origin)
                || suffix.as_deref().is_some_and(|suffix| {
                    origin.to_str().is_ok_and(|origin| origin.ends_with(suffix))
                })
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

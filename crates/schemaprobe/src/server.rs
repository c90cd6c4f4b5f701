//! HTTP front end for discovery runs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use schemaprobe_config::DiscoveryDefaults;
use schemaprobe_discovery::{DiscoverRequest, Discoverer, DiscoveryError, Transport};
use schemaprobe_provider::Provider;

pub type SharedDiscoverer = Arc<Discoverer<dyn Provider, dyn Transport>>;

#[derive(Clone)]
pub struct AppState {
    pub discoverer: SharedDiscoverer,
    pub defaults: DiscoveryDefaults,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/discover", post(discover))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn discover(
    State(state): State<AppState>,
    payload: Result<Json<DiscoverRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("◆ rejected discover request: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let target = match request.into_target(&state.defaults.method, state.defaults.max_iterations)
    {
        Ok(target) => target,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    info!("◆ discover {} {}", target.method, target.url);

    match state.discoverer.run(target).await {
        Ok(schema) => (StatusCode::OK, Json(schema)).into_response(),
        Err(DiscoveryError::Setup(reason)) => {
            error!("◆ discovery agent unavailable: {}", reason);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to initialize discovery agent: {}", reason),
            )
        }
        Err(e) => {
            error!("◆ discovery failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

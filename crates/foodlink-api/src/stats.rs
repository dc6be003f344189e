use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::error;

use foodlink_types::api::Claims;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

pub async fn welcome() -> &'static str {
    "Welcome to FoodLink API"
}

/// Public liveness check that also confirms the store answers queries.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.store.backend();
    let result = blocking(move || Ok(state.store.stats()?)).await;

    match result {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "message": "FoodLink API is running",
                "database": backend,
                "stats": {
                    "users": stats.total_donors + stats.total_ngos + stats.total_receivers,
                    "donations": stats.total_donations,
                    "requests": stats.total_requests,
                },
                "timestamp": chrono::Utc::now(),
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Database connection failed",
                    "database": backend,
                })),
            )
        }
    }
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = blocking(move || Ok(state.store.stats()?)).await?;
    Ok(Json(stats))
}

pub mod auth;
pub mod donations;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod middleware;
pub mod notifications;
pub mod requests;
pub mod stats;
pub mod transactions;
pub mod validate;

#[cfg(test)]
mod testing;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use chrono::Utc;
use tracing::{error, warn};

use foodlink_db::Store;
use foodlink_db::models::NewActivity;

use crate::auth::AppState;
use crate::error::ApiError;

/// All FoodLink routes, served at the root and again under `/api`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(stats::welcome))
        .route("/health", get(stats::health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/feedback/ngo/{id}", get(feedback::list_for_ngo));

    let protected_routes = Router::new()
        .route("/profile/{id}", get(auth::profile))
        .route("/donations", post(donations::create).get(donations::list_all))
        .route("/donations/{id}", get(donations::list_by_donor))
        .route("/donations/{id}/status", put(donations::update_status))
        .route("/requests", post(requests::create))
        .route("/requests/{id}", get(requests::list_by_receiver))
        .route("/requests/{id}/status", put(requests::update_status))
        .route("/feedback", post(feedback::create))
        .route("/transactions", post(transactions::create).get(transactions::list))
        .route("/notifications", get(notifications::list))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route("/stats", get(stats::stats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let api = public_routes.merge(protected_routes).with_state(state);

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .fallback(endpoint_not_found)
}

async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound("Endpoint")
}

/// Run store and hashing work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(format!("blocking task failed: {}", e))
    })?
}

/// Append to the activity log. A failed write is logged, never surfaced.
pub(crate) fn audit(store: &dyn Store, user_id: i64, action: &str, details: String) {
    let entry = NewActivity {
        user_id,
        action: action.to_string(),
        details: Some(details),
        created_at: Utc::now(),
    };
    if let Err(e) = store.record_activity(&entry) {
        warn!("Failed to record {} for account {}: {}", action, user_id, e);
    }
}

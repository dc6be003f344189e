use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::warn;

use foodlink_db::Store;
use foodlink_db::models::NewNotification;
use foodlink_types::api::{Claims, MessageResponse};
use foodlink_types::models::{Notification, NotificationKind};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiPath;

const INBOX_LIMIT: u32 = 50;

/// Tell a record's owner its status changed.
///
/// Delivery is best effort: the status change has already been committed, so
/// a failed insert is logged and dropped.
pub(crate) fn notify_status_change(
    store: &dyn Store,
    owner_id: i64,
    kind: NotificationKind,
    related_id: i64,
    status: &str,
) {
    let (title, noun) = match kind {
        NotificationKind::DonationUpdate => ("Donation Status Updated", "donation"),
        NotificationKind::RequestUpdate => ("Request Status Updated", "request"),
    };

    let notification = NewNotification {
        user_id: owner_id,
        title: title.to_string(),
        message: format!("Your {} has been {}", noun, status),
        kind,
        related_id: Some(related_id),
        created_at: Utc::now(),
    };

    if let Err(e) = store.insert_notification(&notification) {
        warn!("Failed to notify account {} about {} {}: {}", owner_id, noun, related_id, e);
    }
}

pub fn inbox(store: &dyn Store, claims: &Claims) -> Result<Vec<Notification>, ApiError> {
    Ok(store.notifications_for(claims.sub, INBOX_LIMIT)?)
}

pub fn mark_notification_read(
    store: &dyn Store,
    claims: &Claims,
    id: i64,
) -> Result<MessageResponse, ApiError> {
    if !store.mark_notification_read(id, claims.sub)? {
        return Err(ApiError::NotFound("Notification"));
    }
    Ok(MessageResponse {
        message: "Notification marked as read".to_string(),
    })
}

// -- Handlers --

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || inbox(state.store.as_ref(), &claims)).await?;
    Ok(Json(rows))
}

pub async fn mark_read(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let res = blocking(move || mark_notification_read(state.store.as_ref(), &claims, id)).await?;
    Ok(Json(res))
}

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::info;

use foodlink_db::Store;
use foodlink_db::models::NewFeedback;
use foodlink_types::api::{Claims, CreateFeedbackRequest};
use foodlink_types::models::{Feedback, Role};

use crate::auth::{AppState, caller_account};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::{audit, blocking};

pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

/// Any account may rate an NGO.
pub fn create_feedback(
    store: &dyn Store,
    claims: &Claims,
    req: CreateFeedbackRequest,
) -> Result<Feedback, ApiError> {
    let author = caller_account(store, claims)?;

    let (Some(ngo_id), Some(rating)) = (req.ngo_id, req.rating) else {
        return Err(ApiError::invalid("NGO ID and rating are required"));
    };
    if !RATING_RANGE.contains(&rating) {
        return Err(ApiError::invalid("Rating must be between 1 and 5"));
    }

    let ngo = store
        .account_by_id(ngo_id)?
        .filter(|account| account.role == Role::Ngo)
        .ok_or(ApiError::NotFound("NGO"))?;

    let feedback = store.insert_feedback(&NewFeedback {
        user_id: author.id,
        ngo_id: ngo.id,
        rating,
        comments: req.comments.filter(|c| !c.trim().is_empty()),
        created_at: Utc::now(),
    })?;

    audit(
        store,
        author.id,
        "FEEDBACK_CREATED",
        format!("Rated NGO {} with {}", ngo.id, rating),
    );
    info!("Feedback {} left for NGO {} by account {}", feedback.id, ngo.id, author.id);

    Ok(feedback)
}

pub fn ngo_feedback(store: &dyn Store, ngo_id: i64) -> Result<Vec<Feedback>, ApiError> {
    Ok(store.feedback_for_ngo(ngo_id)?)
}

// -- Handlers --

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateFeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let feedback = blocking(move || create_feedback(state.store.as_ref(), &claims, req)).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn list_for_ngo(
    State(state): State<AppState>,
    ApiPath(ngo_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || ngo_feedback(state.store.as_ref(), ngo_id)).await?;
    Ok(Json(rows))
}

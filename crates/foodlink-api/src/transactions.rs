use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::info;

use foodlink_db::Store;
use foodlink_db::models::{NewTransaction, Page};
use foodlink_types::api::{Claims, CreateTransactionRequest, PageQuery};
use foodlink_types::models::{Role, Transaction};

use crate::auth::{AppState, acting_account};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::validate::required;
use crate::{audit, blocking};

pub const MAX_STATUS_LEN: usize = 50;

/// NGO-only. Records that a donation is being used to serve a request.
pub fn create_transaction(
    store: &dyn Store,
    claims: &Claims,
    req: CreateTransactionRequest,
) -> Result<Transaction, ApiError> {
    let ngo = acting_account(store, claims, Role::Ngo, "Only NGOs can create transactions")?;

    let donation_id = req
        .donation_id
        .ok_or_else(|| ApiError::invalid("Missing required field: donationId"))?;
    let request_id = req
        .request_id
        .ok_or_else(|| ApiError::invalid("Missing required field: requestId"))?;
    let status = required(req.status, "status")?;
    if status.chars().count() > MAX_STATUS_LEN {
        return Err(ApiError::invalid(format!(
            "status must be at most {} characters",
            MAX_STATUS_LEN
        )));
    }

    let donation = store
        .donation_by_id(donation_id)?
        .ok_or(ApiError::NotFound("Donation"))?;
    let request = store
        .request_by_id(request_id)?
        .ok_or(ApiError::NotFound("Request"))?;

    let transaction = store.insert_transaction(&NewTransaction {
        donation_id: donation.id,
        request_id: request.id,
        ngo_id: ngo.id,
        status,
        created_at: Utc::now(),
    })?;

    audit(
        store,
        ngo.id,
        "TRANSACTION_CREATED",
        format!("Matched donation {} to request {}", donation.id, request.id),
    );
    info!(
        "Transaction {} links donation {} to request {} (NGO {})",
        transaction.id, donation.id, request.id, ngo.id
    );

    Ok(transaction)
}

pub fn all_transactions(store: &dyn Store, query: &PageQuery) -> Result<Vec<Transaction>, ApiError> {
    Ok(store.list_transactions(Page::new(query.page, query.limit))?)
}

// -- Handlers --

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction =
        blocking(move || create_transaction(state.store.as_ref(), &claims, req)).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || all_transactions(state.store.as_ref(), &query)).await?;
    Ok(Json(rows))
}

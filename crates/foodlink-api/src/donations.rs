use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use foodlink_db::Store;
use foodlink_db::models::{NewDonation, Page};
use foodlink_types::api::{Claims, CreateDonationRequest, PageQuery, UpdateStatusRequest};
use foodlink_types::models::{Donation, DonationStatus, NotificationKind, Role};

use crate::auth::{AppState, acting_account};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::notifications::notify_status_change;
use crate::validate::{required, timestamp};
use crate::{audit, blocking};

// -- Operations --

pub fn create_donation(
    store: &dyn Store,
    claims: &Claims,
    req: CreateDonationRequest,
) -> Result<Donation, ApiError> {
    let owner = acting_account(store, claims, Role::Donor, "Only donors can create donations")?;

    let food_type = required(req.food_type, "foodType")?;
    let quantity = required(req.quantity, "quantity")?;
    let pickup_address = required(req.pickup_address, "pickupAddress")?;
    let expiry_time = timestamp(&required(req.expiry_time, "expiryTime")?, "expiryTime")?;

    let donation = store.insert_donation(&NewDonation {
        donor_id: owner.id,
        food_type,
        quantity,
        pickup_address,
        latitude: req.latitude,
        longitude: req.longitude,
        expiry_time,
        image_url: req.image_url,
        created_at: Utc::now(),
    })?;

    audit(
        store,
        owner.id,
        "DONATION_CREATED",
        format!("Created donation: {}", donation.food_type),
    );
    info!("Donation {} created by donor {}", donation.id, owner.id);

    Ok(donation)
}

pub fn all_donations(store: &dyn Store, query: &PageQuery) -> Result<Vec<Donation>, ApiError> {
    Ok(store.list_donations(Page::new(query.page, query.limit))?)
}

pub fn donor_donations(store: &dyn Store, donor_id: i64) -> Result<Vec<Donation>, ApiError> {
    Ok(store.donations_by_donor(donor_id)?)
}

/// NGO-only. Any status in the vocabulary may follow any other.
pub fn update_donation_status(
    store: &dyn Store,
    claims: &Claims,
    id: i64,
    req: UpdateStatusRequest,
) -> Result<Donation, ApiError> {
    let ngo = acting_account(store, claims, Role::Ngo, "Only NGOs can update status")?;

    let status: DonationStatus = required(req.status, "status")?
        .parse()
        .map_err(|e| ApiError::invalid(format!("Invalid status: {}", e)))?;

    let donation = store
        .set_donation_status(id, status, ngo.id, Utc::now())?
        .ok_or(ApiError::NotFound("Donation"))?;

    notify_status_change(
        store,
        donation.donor_id,
        NotificationKind::DonationUpdate,
        donation.id,
        status.as_str(),
    );
    audit(
        store,
        ngo.id,
        "DONATION_STATUS_UPDATED",
        format!("Updated donation {} to {}", donation.id, status),
    );
    info!("Donation {} set to {} by NGO {}", donation.id, status, ngo.id);

    Ok(donation)
}

// -- Handlers --

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateDonationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = blocking(move || create_donation(state.store.as_ref(), &claims, req)).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}

pub async fn list_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || all_donations(state.store.as_ref(), &query)).await?;
    Ok(Json(rows))
}

pub async fn list_by_donor(
    State(state): State<AppState>,
    ApiPath(donor_id): ApiPath<i64>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || donor_donations(state.store.as_ref(), donor_id)).await?;
    Ok(Json(rows))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let donation =
        blocking(move || update_donation_status(state.store.as_ref(), &claims, id, req)).await?;
    Ok(Json(donation))
}

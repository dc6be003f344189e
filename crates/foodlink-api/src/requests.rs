use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use foodlink_db::Store;
use foodlink_db::models::NewFoodRequest;
use foodlink_types::api::{Claims, CreateFoodRequest, UpdateStatusRequest};
use foodlink_types::models::{FoodRequest, NotificationKind, RequestStatus, Role};

use crate::auth::{AppState, acting_account};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::notifications::notify_status_change;
use crate::validate::required;
use crate::{audit, blocking};

// -- Operations --

pub fn create_request(
    store: &dyn Store,
    claims: &Claims,
    req: CreateFoodRequest,
) -> Result<FoodRequest, ApiError> {
    let owner =
        acting_account(store, claims, Role::Receiver, "Only receivers can create requests")?;

    let food_type = required(req.food_type, "foodType")?;
    let quantity = required(req.quantity, "quantity")?;
    let delivery_address = required(req.delivery_address, "deliveryAddress")?;

    let request = store.insert_request(&NewFoodRequest {
        receiver_id: owner.id,
        food_type,
        quantity,
        delivery_address,
        latitude: req.latitude,
        longitude: req.longitude,
        notes: req.notes,
        created_at: Utc::now(),
    })?;

    audit(
        store,
        owner.id,
        "REQUEST_CREATED",
        format!("Created request: {}", request.food_type),
    );
    info!("Request {} created by receiver {}", request.id, owner.id);

    Ok(request)
}

pub fn receiver_requests(store: &dyn Store, receiver_id: i64) -> Result<Vec<FoodRequest>, ApiError> {
    Ok(store.requests_by_receiver(receiver_id)?)
}

pub fn update_request_status(
    store: &dyn Store,
    claims: &Claims,
    id: i64,
    req: UpdateStatusRequest,
) -> Result<FoodRequest, ApiError> {
    let ngo = acting_account(store, claims, Role::Ngo, "Only NGOs can update status")?;

    let status: RequestStatus = required(req.status, "status")?
        .parse()
        .map_err(|e| ApiError::invalid(format!("Invalid status: {}", e)))?;

    let request = store
        .set_request_status(id, status, ngo.id, Utc::now())?
        .ok_or(ApiError::NotFound("Request"))?;

    notify_status_change(
        store,
        request.receiver_id,
        NotificationKind::RequestUpdate,
        request.id,
        status.as_str(),
    );
    audit(
        store,
        ngo.id,
        "REQUEST_STATUS_UPDATED",
        format!("Updated request {} to {}", request.id, status),
    );
    info!("Request {} set to {} by NGO {}", request.id, status, ngo.id);

    Ok(request)
}

// -- Handlers --

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateFoodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = blocking(move || create_request(state.store.as_ref(), &claims, req)).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_by_receiver(
    State(state): State<AppState>,
    ApiPath(receiver_id): ApiPath<i64>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || receiver_requests(state.store.as_ref(), receiver_id)).await?;
    Ok(Json(rows))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request =
        blocking(move || update_request_status(state.store.as_ref(), &claims, id, req)).await?;
    Ok(Json(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::account;
    use foodlink_db::{Database, MemoryStore};

    fn milk() -> CreateFoodRequest {
        CreateFoodRequest {
            food_type: Some("Milk".into()),
            quantity: Some("2L".into()),
            delivery_address: Some("Y".into()),
            notes: Some("after 5pm".into()),
            ..Default::default()
        }
    }

    #[test]
    fn receiver_creates_requested_record() {
        let store = MemoryStore::new();
        let receiver = account(&store, "r@test.com", Role::Receiver);

        let request = create_request(&store, &receiver, milk()).unwrap();
        assert_eq!(request.status, RequestStatus::Requested);
        assert_eq!(request.notes.as_deref(), Some("after 5pm"));
        assert_eq!(receiver_requests(&store, receiver.sub).unwrap(), vec![request]);
    }

    #[test]
    fn only_receivers_create() {
        let store = MemoryStore::new();
        let donor = account(&store, "d@test.com", Role::Donor);
        assert!(matches!(
            create_request(&store, &donor, milk()),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn delivery_address_is_required() {
        let store = MemoryStore::new();
        let receiver = account(&store, "r@test.com", Role::Receiver);
        let req = CreateFoodRequest { delivery_address: None, ..milk() };
        assert!(matches!(
            create_request(&store, &receiver, req),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn ngo_fulfils_request_and_receiver_is_notified() {
        let store = MemoryStore::new();
        let receiver = account(&store, "r@test.com", Role::Receiver);
        let ngo = account(&store, "n@test.com", Role::Ngo);
        let request = create_request(&store, &receiver, milk()).unwrap();

        let updated = update_request_status(
            &store,
            &ngo,
            request.id,
            UpdateStatusRequest { status: Some("Fulfilled".into()) },
        )
        .unwrap();
        assert_eq!(updated.status, RequestStatus::Fulfilled);
        assert_eq!(updated.ngo_id, Some(ngo.sub));

        let inbox = store.notifications_for(receiver.sub, 50).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::RequestUpdate);
        assert_eq!(inbox[0].message, "Your request has been Fulfilled");
    }

    #[test]
    fn receiver_cannot_update_and_missing_is_not_found() {
        let store = MemoryStore::new();
        let receiver = account(&store, "r@test.com", Role::Receiver);
        let ngo = account(&store, "n@test.com", Role::Ngo);
        let request = create_request(&store, &receiver, milk()).unwrap();
        let verified = || UpdateStatusRequest { status: Some("Verified".into()) };

        assert!(matches!(
            update_request_status(&store, &receiver, request.id, verified()),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            update_request_status(&store, &ngo, 999, verified()),
            Err(ApiError::NotFound("Request"))
        ));
        // Donation-only status
        assert!(matches!(
            update_request_status(
                &store,
                &ngo,
                request.id,
                UpdateStatusRequest { status: Some("PickedUp".into()) }
            ),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn token_without_stored_account_cannot_write() {
        let memory = MemoryStore::new();
        let sqlite = Database::open_in_memory().unwrap();
        let stores: [&dyn Store; 2] = [&memory, &sqlite];

        for store in stores {
            let ghost = Claims { sub: 999, role: Role::Receiver, iat: 0, exp: usize::MAX };
            assert!(matches!(
                create_request(store, &ghost, milk()),
                Err(ApiError::InvalidToken)
            ));
            assert!(receiver_requests(store, 999).unwrap().is_empty());
        }
    }
}

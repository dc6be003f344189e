use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use foodlink_db::Store;
use foodlink_db::models::NewAccount;
use foodlink_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use foodlink_types::models::{Account, Role};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::TokenService;
use crate::validate::{is_valid_email, password_long_enough, required};
use crate::{audit, blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
}

// -- Password capability --

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

/// False for a wrong password and for a digest that does not parse.
pub fn verify_password(password: &str, digest: &str) -> bool {
    PasswordHash::new(digest)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// -- Operations --

pub fn register_account(
    store: &dyn Store,
    tokens: &TokenService,
    req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    let email = required(req.email, "email")?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::invalid("Missing required field: password"))?;
    let name = required(req.name, "name")?;
    let role = required(req.role, "role")?;

    if !is_valid_email(&email) {
        return Err(ApiError::invalid("Invalid email format"));
    }
    if !password_long_enough(&password) {
        return Err(ApiError::invalid("Password must be at least 6 characters"));
    }
    let role: Role = role
        .parse()
        .map_err(|_| ApiError::invalid("Invalid role. Use 'Donor', 'NGO' or 'Receiver'"))?;

    if store.account_by_email(&email)?.is_some() {
        return Err(ApiError::DuplicateAccount);
    }

    let password_hash = hash_password(&password)?;

    // A concurrent registration can still take the email between the check and the insert
    let account = store
        .create_account(&NewAccount {
            email,
            password_hash,
            name,
            role,
            address: req.address,
            phone: req.phone,
            description: req.description,
            family_size: req.family_size,
            latitude: req.latitude,
            longitude: req.longitude,
            created_at: Utc::now(),
        })?
        .ok_or(ApiError::DuplicateAccount)?;

    audit(store, account.id, "USER_REGISTERED", format!("New {} registered", role));
    info!("Registered {} account {} ({})", role, account.id, account.email);

    let token = tokens.issue(account.id, account.role)?;
    Ok(AuthResponse { user: account, token })
}

pub fn login_account(
    store: &dyn Store,
    tokens: &TokenService,
    req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    let email = required(req.email, "email")?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::invalid("Missing required field: password"))?;
    let role: Role = required(req.role, "role")?
        .parse()
        .map_err(|_| ApiError::InvalidCredentials)?;

    let row = store
        .account_by_email(&email)?
        .filter(|row| row.account.role == role)
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&password, &row.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let mut account = row.account;
    let now = Utc::now();
    store.record_login(account.id, now)?;
    account.last_login = Some(now);

    audit(store, account.id, "USER_LOGIN", format!("{} logged in", role));
    info!("Account {} logged in as {}", account.id, role);

    let token = tokens.issue(account.id, account.role)?;
    Ok(AuthResponse { user: account, token })
}

/// The stored account behind a token. A token whose account is gone is invalid.
pub(crate) fn caller_account(store: &dyn Store, claims: &Claims) -> Result<Account, ApiError> {
    store.account_by_id(claims.sub)?.ok_or(ApiError::InvalidToken)
}

/// Role gate for write operations, checked against the token and the stored account.
pub(crate) fn acting_account(
    store: &dyn Store,
    claims: &Claims,
    role: Role,
    denied: &'static str,
) -> Result<Account, ApiError> {
    if claims.role != role {
        return Err(ApiError::Forbidden(denied));
    }
    let account = caller_account(store, claims)?;
    if account.role != role {
        return Err(ApiError::Forbidden(denied));
    }
    Ok(account)
}

/// Only the account itself may read its profile.
pub fn read_profile(store: &dyn Store, claims: &Claims, id: i64) -> Result<Account, ApiError> {
    if claims.sub != id {
        return Err(ApiError::Forbidden("Access denied"));
    }
    store.account_by_id(id)?.ok_or(ApiError::NotFound("Account"))
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response =
        blocking(move || register_account(state.store.as_ref(), &state.tokens, req)).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response =
        blocking(move || login_account(state.store.as_ref(), &state.tokens, req)).await?;

    Ok(Json(response))
}

pub async fn profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let account = blocking(move || read_profile(state.store.as_ref(), &claims, id)).await?;
    Ok(Json(account))
}

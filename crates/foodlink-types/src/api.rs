use serde::{Deserialize, Serialize};

use crate::models::{Account, Role};

// -- JWT Claims --

/// Session token payload. Verified by signature, never looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --
//
// Required fields are optional here so that a missing field surfaces as a
// validation error with a message instead of a body rejection.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub family_size: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Body of both `/register` and `/login` responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: Account,
    pub token: String,
}

// -- Donations --

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub food_type: Option<String>,
    pub quantity: Option<String>,
    pub pickup_address: Option<String>,
    pub expiry_time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
}

// -- Requests --

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodRequest {
    pub food_type: Option<String>,
    pub quantity: Option<String>,
    #[serde(alias = "address")]
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// -- Feedback --

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    #[serde(alias = "ngo_id")]
    pub ngo_id: Option<i64>,
    pub rating: Option<i64>,
    pub comments: Option<String>,
}

// -- Transactions --

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(alias = "donation_id")]
    pub donation_id: Option<i64>,
    #[serde(alias = "request_id")]
    pub request_id: Option<i64>,
    pub status: Option<String>,
}

// -- Shared --

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: default_page(), limit: default_limit() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

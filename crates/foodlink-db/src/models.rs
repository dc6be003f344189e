//! Write-side row types. Read-side rows come back as `foodlink_types` models,
//! except for accounts, where the password hash must stay inside this crate's
//! callers.

use chrono::{DateTime, Utc};
use foodlink_types::models::{Account, NotificationKind, Role};

pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub family_size: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// An account together with its stored password hash.
pub struct AccountRow {
    pub account: Account,
    pub password_hash: String,
}

pub struct NewDonation {
    pub donor_id: i64,
    pub food_type: String,
    pub quantity: String,
    pub pickup_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub expiry_time: DateTime<Utc>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewFoodRequest {
    pub receiver_id: i64,
    pub food_type: String,
    pub quantity: String,
    pub delivery_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub struct NewFeedback {
    pub user_id: i64,
    pub ngo_id: i64,
    pub rating: i64,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewTransaction {
    pub donation_id: i64,
    pub request_id: i64,
    pub ngo_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewActivity {
    pub user_id: i64,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 200;

    /// Builds a window from a 1-based page number, clamping both inputs.
    pub fn new(page: u32, limit: u32) -> Self {
        let limit = limit.clamp(1, Self::MAX_LIMIT);
        let page = page.max(1);
        Self {
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

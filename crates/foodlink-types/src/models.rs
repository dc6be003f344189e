use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returned when a stored or submitted string is not a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

// -- Roles --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Donor,
    #[serde(rename = "NGO")]
    Ngo,
    Receiver,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Donor, Role::Ngo, Role::Receiver];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Donor => "Donor",
            Self::Ngo => "NGO",
            Self::Receiver => "Receiver",
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("role", s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Statuses --

/// Donation lifecycle. Any value may follow any other; only the vocabulary is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonationStatus {
    Pending,
    Verified,
    Allocated,
    PickedUp,
    Delivered,
    Expired,
    Cancelled,
}

impl DonationStatus {
    pub const ALL: [DonationStatus; 7] = [
        Self::Pending,
        Self::Verified,
        Self::Allocated,
        Self::PickedUp,
        Self::Delivered,
        Self::Expired,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Verified => "Verified",
            Self::Allocated => "Allocated",
            Self::PickedUp => "PickedUp",
            Self::Delivered => "Delivered",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for DonationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("donation status", s))
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Requested,
    Verified,
    Allocated,
    Fulfilled,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        Self::Requested,
        Self::Verified,
        Self::Allocated,
        Self::Fulfilled,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::Verified => "Verified",
            Self::Allocated => "Allocated",
            Self::Fulfilled => "Fulfilled",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("request status", s))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Records --

/// Public view of an account. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub family_size: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    pub donor_id: i64,
    pub food_type: String,
    pub quantity: String,
    pub pickup_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub expiry_time: DateTime<Utc>,
    pub image_url: Option<String>,
    pub status: DonationStatus,
    pub ngo_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A receiver's request for food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRequest {
    pub id: i64,
    pub receiver_id: i64,
    pub food_type: String,
    pub quantity: String,
    pub delivery_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub ngo_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    DonationUpdate,
    RequestUpdate,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DonationUpdate => "DONATION_UPDATE",
            Self::RequestUpdate => "REQUEST_UPDATE",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DONATION_UPDATE" => Ok(Self::DonationUpdate),
            "REQUEST_UPDATE" => Ok(Self::RequestUpdate),
            other => Err(ParseEnumError::new("notification kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub related_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A rating left for an NGO by any account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub ngo_id: i64,
    pub rating: i64,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An NGO's record that a donation was matched to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub donation_id: i64,
    pub request_id: i64,
    pub ngo_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters served by `/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_donations: i64,
    pub delivered_donations: i64,
    pub total_requests: i64,
    pub fulfilled_requests: i64,
    pub total_donors: i64,
    #[serde(rename = "totalNGOs")]
    pub total_ngos: i64,
    pub total_receivers: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_wire_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!("ngo".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn status_parsing_is_closed() {
        assert_eq!("Verified".parse::<DonationStatus>().unwrap(), DonationStatus::Verified);
        assert_eq!("Fulfilled".parse::<RequestStatus>().unwrap(), RequestStatus::Fulfilled);

        let err = "Lost".parse::<DonationStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown donation status `Lost`");
        assert!("Pending".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn stats_serialize_with_camel_case_names() {
        let json = serde_json::to_value(Stats { total_ngos: 2, ..Default::default() }).unwrap();
        assert_eq!(json["totalNGOs"], 2);
        assert_eq!(json["deliveredDonations"], 0);
    }
}

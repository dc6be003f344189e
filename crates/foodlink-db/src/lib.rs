pub mod memory;
pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use foodlink_types::models::{
    Account, Donation, DonationStatus, Feedback, FoodRequest, Notification, RequestStatus, Stats,
    Transaction,
};

pub use memory::MemoryStore;
use models::{
    AccountRow, Activity, NewAccount, NewActivity, NewDonation, NewFeedback, NewFoodRequest,
    NewNotification, NewTransaction, Page,
};

/// Persistence seam for every ledger the API touches.
///
/// Implementations are synchronous; callers on the async runtime are expected
/// to move calls onto a blocking thread.
pub trait Store: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    // -- Accounts --

    /// Returns `None` when the email is already registered.
    fn create_account(&self, account: &NewAccount) -> Result<Option<Account>>;
    fn account_by_email(&self, email: &str) -> Result<Option<AccountRow>>;
    fn account_by_id(&self, id: i64) -> Result<Option<Account>>;
    fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    // -- Donations --

    fn insert_donation(&self, donation: &NewDonation) -> Result<Donation>;
    fn donation_by_id(&self, id: i64) -> Result<Option<Donation>>;
    /// Newest first.
    fn list_donations(&self, page: Page) -> Result<Vec<Donation>>;
    /// Newest first.
    fn donations_by_donor(&self, donor_id: i64) -> Result<Vec<Donation>>;
    /// Returns `None` when no donation has this id.
    fn set_donation_status(
        &self,
        id: i64,
        status: DonationStatus,
        ngo_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Donation>>;

    // -- Requests --

    fn insert_request(&self, request: &NewFoodRequest) -> Result<FoodRequest>;
    fn request_by_id(&self, id: i64) -> Result<Option<FoodRequest>>;
    /// Newest first.
    fn requests_by_receiver(&self, receiver_id: i64) -> Result<Vec<FoodRequest>>;
    /// Returns `None` when no request has this id.
    fn set_request_status(
        &self,
        id: i64,
        status: RequestStatus,
        ngo_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<FoodRequest>>;

    // -- Feedback --

    fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback>;
    /// Newest first.
    fn feedback_for_ngo(&self, ngo_id: i64) -> Result<Vec<Feedback>>;

    // -- Transactions --

    fn insert_transaction(&self, transaction: &NewTransaction) -> Result<Transaction>;
    /// Newest first.
    fn list_transactions(&self, page: Page) -> Result<Vec<Transaction>>;

    // -- Notifications --

    fn insert_notification(&self, notification: &NewNotification) -> Result<Notification>;
    fn notifications_for(&self, user_id: i64, limit: u32) -> Result<Vec<Notification>>;
    /// Returns false when the notification does not exist or belongs to someone else.
    fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool>;

    // -- Activity log --

    fn record_activity(&self, activity: &NewActivity) -> Result<()>;
    fn activity_for(&self, user_id: i64, limit: u32) -> Result<Vec<Activity>>;

    fn stats(&self) -> Result<Stats>;
}

/// SQLite-backed store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

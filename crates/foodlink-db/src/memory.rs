//! Process-local store. Same contract as the SQLite `Database`, minus durability.

use std::cmp::Reverse;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};

use foodlink_types::models::{
    Account, Donation, DonationStatus, Feedback, FoodRequest, Notification, RequestStatus, Role,
    Stats, Transaction,
};

use crate::Store;
use crate::models::{
    AccountRow, Activity, NewAccount, NewActivity, NewDonation, NewFeedback, NewFoodRequest,
    NewNotification, NewTransaction, Page,
};

#[derive(Default)]
struct Tables {
    accounts: Vec<AccountRow>,
    donations: Vec<Donation>,
    requests: Vec<FoodRequest>,
    feedback: Vec<Feedback>,
    transactions: Vec<Transaction>,
    notifications: Vec<Notification>,
    activity: Vec<Activity>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|e| anyhow!("Store lock poisoned: {}", e))
    }
}

/// Ids are 1-based and follow insertion order, like SQLite AUTOINCREMENT.
fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    items.sort_by_key(|item| Reverse(key(item)));
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    // -- Accounts --

    fn create_account(&self, account: &NewAccount) -> Result<Option<Account>> {
        let mut tables = self.lock()?;
        if tables.accounts.iter().any(|row| row.account.email == account.email) {
            return Ok(None);
        }

        let created = Account {
            id: next_id(tables.accounts.len()),
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            address: account.address.clone(),
            phone: account.phone.clone(),
            description: account.description.clone(),
            family_size: account.family_size,
            latitude: account.latitude,
            longitude: account.longitude,
            verified: false,
            last_login: None,
            created_at: account.created_at,
            updated_at: account.created_at,
        };
        tables.accounts.push(AccountRow {
            account: created.clone(),
            password_hash: account.password_hash.clone(),
        });
        Ok(Some(created))
    }

    fn account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        let tables = self.lock()?;
        Ok(tables
            .accounts
            .iter()
            .find(|row| row.account.email == email)
            .map(|row| AccountRow {
                account: row.account.clone(),
                password_hash: row.password_hash.clone(),
            }))
    }

    fn account_by_id(&self, id: i64) -> Result<Option<Account>> {
        let tables = self.lock()?;
        Ok(tables
            .accounts
            .iter()
            .find(|row| row.account.id == id)
            .map(|row| row.account.clone()))
    }

    fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.lock()?;
        if let Some(row) = tables.accounts.iter_mut().find(|row| row.account.id == id) {
            row.account.last_login = Some(at);
        }
        Ok(())
    }

    // -- Donations --

    fn insert_donation(&self, donation: &NewDonation) -> Result<Donation> {
        let mut tables = self.lock()?;
        let created = Donation {
            id: next_id(tables.donations.len()),
            donor_id: donation.donor_id,
            food_type: donation.food_type.clone(),
            quantity: donation.quantity.clone(),
            pickup_address: donation.pickup_address.clone(),
            latitude: donation.latitude,
            longitude: donation.longitude,
            expiry_time: donation.expiry_time,
            image_url: donation.image_url.clone(),
            status: DonationStatus::Pending,
            ngo_id: None,
            created_at: donation.created_at,
            updated_at: donation.created_at,
        };
        tables.donations.push(created.clone());
        Ok(created)
    }

    fn donation_by_id(&self, id: i64) -> Result<Option<Donation>> {
        let tables = self.lock()?;
        Ok(tables.donations.iter().find(|d| d.id == id).cloned())
    }

    fn list_donations(&self, page: Page) -> Result<Vec<Donation>> {
        let tables = self.lock()?;
        let mut rows = tables.donations.clone();
        newest_first(&mut rows, |d| (d.created_at, d.id));
        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    fn donations_by_donor(&self, donor_id: i64) -> Result<Vec<Donation>> {
        let tables = self.lock()?;
        let mut rows: Vec<Donation> = tables
            .donations
            .iter()
            .filter(|d| d.donor_id == donor_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |d| (d.created_at, d.id));
        Ok(rows)
    }

    fn set_donation_status(
        &self,
        id: i64,
        status: DonationStatus,
        ngo_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Donation>> {
        let mut tables = self.lock()?;
        Ok(tables.donations.iter_mut().find(|d| d.id == id).map(|d| {
            d.status = status;
            d.ngo_id = Some(ngo_id);
            d.updated_at = at;
            d.clone()
        }))
    }

    // -- Requests --

    fn insert_request(&self, request: &NewFoodRequest) -> Result<FoodRequest> {
        let mut tables = self.lock()?;
        let created = FoodRequest {
            id: next_id(tables.requests.len()),
            receiver_id: request.receiver_id,
            food_type: request.food_type.clone(),
            quantity: request.quantity.clone(),
            delivery_address: request.delivery_address.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            notes: request.notes.clone(),
            status: RequestStatus::Requested,
            ngo_id: None,
            created_at: request.created_at,
            updated_at: request.created_at,
        };
        tables.requests.push(created.clone());
        Ok(created)
    }

    fn request_by_id(&self, id: i64) -> Result<Option<FoodRequest>> {
        let tables = self.lock()?;
        Ok(tables.requests.iter().find(|r| r.id == id).cloned())
    }

    fn requests_by_receiver(&self, receiver_id: i64) -> Result<Vec<FoodRequest>> {
        let tables = self.lock()?;
        let mut rows: Vec<FoodRequest> = tables
            .requests
            .iter()
            .filter(|r| r.receiver_id == receiver_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |r| (r.created_at, r.id));
        Ok(rows)
    }

    fn set_request_status(
        &self,
        id: i64,
        status: RequestStatus,
        ngo_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<FoodRequest>> {
        let mut tables = self.lock()?;
        Ok(tables.requests.iter_mut().find(|r| r.id == id).map(|r| {
            r.status = status;
            r.ngo_id = Some(ngo_id);
            r.updated_at = at;
            r.clone()
        }))
    }

    // -- Feedback --

    fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback> {
        let mut tables = self.lock()?;
        let created = Feedback {
            id: next_id(tables.feedback.len()),
            user_id: feedback.user_id,
            ngo_id: feedback.ngo_id,
            rating: feedback.rating,
            comments: feedback.comments.clone(),
            created_at: feedback.created_at,
        };
        tables.feedback.push(created.clone());
        Ok(created)
    }

    fn feedback_for_ngo(&self, ngo_id: i64) -> Result<Vec<Feedback>> {
        let tables = self.lock()?;
        let mut rows: Vec<Feedback> = tables
            .feedback
            .iter()
            .filter(|f| f.ngo_id == ngo_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |f| (f.created_at, f.id));
        Ok(rows)
    }

    // -- Transactions --

    fn insert_transaction(&self, transaction: &NewTransaction) -> Result<Transaction> {
        let mut tables = self.lock()?;
        let created = Transaction {
            id: next_id(tables.transactions.len()),
            donation_id: transaction.donation_id,
            request_id: transaction.request_id,
            ngo_id: transaction.ngo_id,
            status: transaction.status.clone(),
            created_at: transaction.created_at,
        };
        tables.transactions.push(created.clone());
        Ok(created)
    }

    fn list_transactions(&self, page: Page) -> Result<Vec<Transaction>> {
        let tables = self.lock()?;
        let mut rows = tables.transactions.clone();
        newest_first(&mut rows, |t| (t.created_at, t.id));
        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    // -- Notifications --

    fn insert_notification(&self, notification: &NewNotification) -> Result<Notification> {
        let mut tables = self.lock()?;
        let created = Notification {
            id: next_id(tables.notifications.len()),
            user_id: notification.user_id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            kind: notification.kind,
            read: false,
            related_id: notification.related_id,
            created_at: notification.created_at,
        };
        tables.notifications.push(created.clone());
        Ok(created)
    }

    fn notifications_for(&self, user_id: i64, limit: u32) -> Result<Vec<Notification>> {
        let tables = self.lock()?;
        let mut rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |n| (n.created_at, n.id));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool> {
        let mut tables = self.lock()?;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // -- Activity log --

    fn record_activity(&self, activity: &NewActivity) -> Result<()> {
        let mut tables = self.lock()?;
        let id = next_id(tables.activity.len());
        tables.activity.push(Activity {
            id,
            user_id: activity.user_id,
            action: activity.action.clone(),
            details: activity.details.clone(),
            created_at: activity.created_at,
        });
        Ok(())
    }

    fn activity_for(&self, user_id: i64, limit: u32) -> Result<Vec<Activity>> {
        let tables = self.lock()?;
        let mut rows: Vec<Activity> = tables
            .activity
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    fn stats(&self) -> Result<Stats> {
        let tables = self.lock()?;
        let count_role = |role: Role| {
            tables.accounts.iter().filter(|row| row.account.role == role).count() as i64
        };

        Ok(Stats {
            total_donations: tables.donations.len() as i64,
            delivered_donations: tables
                .donations
                .iter()
                .filter(|d| d.status == DonationStatus::Delivered)
                .count() as i64,
            total_requests: tables.requests.len() as i64,
            fulfilled_requests: tables
                .requests
                .iter()
                .filter(|r| r.status == RequestStatus::Fulfilled)
                .count() as i64,
            total_donors: count_role(Role::Donor),
            total_ngos: count_role(Role::Ngo),
            total_receivers: count_role(Role::Receiver),
        })
    }
}

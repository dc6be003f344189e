use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use foodlink_types::models::{
    Account, Donation, DonationStatus, Feedback, FoodRequest, Notification, RequestStatus, Stats,
    Transaction,
};

use crate::models::{
    AccountRow, Activity, NewAccount, NewActivity, NewDonation, NewFeedback, NewFoodRequest,
    NewNotification, NewTransaction, Page,
};
use crate::{Database, Store};

const ACCOUNT_COLUMNS: &str = "id, email, name, role, address, phone, description, family_size, \
     latitude, longitude, verified, last_login, created_at, updated_at, password_hash";

const DONATION_COLUMNS: &str = "id, donor_id, food_type, quantity, pickup_address, latitude, \
     longitude, expiry_time, image_url, status, ngo_id, created_at, updated_at";

const REQUEST_COLUMNS: &str = "id, receiver_id, food_type, quantity, delivery_address, latitude, \
     longitude, notes, status, ngo_id, created_at, updated_at";

const FEEDBACK_COLUMNS: &str = "id, user_id, ngo_id, rating, comments, created_at";

const TRANSACTION_COLUMNS: &str = "id, donation_id, request_id, ngo_id, status, created_at";

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, kind, read, related_id, created_at";

impl Store for Database {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    // -- Accounts --

    fn create_account(&self, account: &NewAccount) -> Result<Option<Account>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO accounts (email, password_hash, name, role, address, phone, description,
                     family_size, latitude, longitude, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    account.email,
                    account.password_hash,
                    account.name,
                    account.role.as_str(),
                    account.address,
                    account.phone,
                    account.description,
                    account.family_size,
                    account.latitude,
                    account.longitude,
                    account.created_at,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            }

            let id = conn.last_insert_rowid();
            query_account(conn, "id = ?1", id)?
                .map(|row| Some(row.account))
                .ok_or_else(|| anyhow::anyhow!("Account {} vanished after insert", id))
        })
    }

    fn account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "email = ?1", email))
    }

    fn account_by_id(&self, id: i64) -> Result<Option<Account>> {
        self.with_conn(|conn| Ok(query_account(conn, "id = ?1", id)?.map(|row| row.account)))
    }

    fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE accounts SET last_login = ?1 WHERE id = ?2", params![at, id])?;
            Ok(())
        })
    }

    // -- Donations --

    fn insert_donation(&self, donation: &NewDonation) -> Result<Donation> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO donations (donor_id, food_type, quantity, pickup_address, latitude,
                     longitude, expiry_time, image_url, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    donation.donor_id,
                    donation.food_type,
                    donation.quantity,
                    donation.pickup_address,
                    donation.latitude,
                    donation.longitude,
                    donation.expiry_time,
                    donation.image_url,
                    DonationStatus::Pending.as_str(),
                    donation.created_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_donation(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Donation {} vanished after insert", id))
        })
    }

    fn donation_by_id(&self, id: i64) -> Result<Option<Donation>> {
        self.with_conn(|conn| query_donation(conn, id))
    }

    fn list_donations(&self, page: Page) -> Result<Vec<Donation>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {DONATION_COLUMNS} FROM donations
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![i64::from(page.limit), i64::from(page.offset)], donation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn donations_by_donor(&self, donor_id: i64) -> Result<Vec<Donation>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {DONATION_COLUMNS} FROM donations
                 WHERE donor_id = ?1
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([donor_id], donation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn set_donation_status(
        &self,
        id: i64,
        status: DonationStatus,
        ngo_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Donation>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE donations SET status = ?1, ngo_id = ?2, updated_at = ?3 WHERE id = ?4",
                params![status.as_str(), ngo_id, at, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_donation(conn, id)
        })
    }

    // -- Requests --

    fn insert_request(&self, request: &NewFoodRequest) -> Result<FoodRequest> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO requests (receiver_id, food_type, quantity, delivery_address, latitude,
                     longitude, notes, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    request.receiver_id,
                    request.food_type,
                    request.quantity,
                    request.delivery_address,
                    request.latitude,
                    request.longitude,
                    request.notes,
                    RequestStatus::Requested.as_str(),
                    request.created_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_request(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Request {} vanished after insert", id))
        })
    }

    fn request_by_id(&self, id: i64) -> Result<Option<FoodRequest>> {
        self.with_conn(|conn| query_request(conn, id))
    }

    fn requests_by_receiver(&self, receiver_id: i64) -> Result<Vec<FoodRequest>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {REQUEST_COLUMNS} FROM requests
                 WHERE receiver_id = ?1
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([receiver_id], request_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn set_request_status(
        &self,
        id: i64,
        status: RequestStatus,
        ngo_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<FoodRequest>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE requests SET status = ?1, ngo_id = ?2, updated_at = ?3 WHERE id = ?4",
                params![status.as_str(), ngo_id, at, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_request(conn, id)
        })
    }

    // -- Feedback --

    fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO feedback (user_id, ngo_id, rating, comments, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    feedback.user_id,
                    feedback.ngo_id,
                    feedback.rating,
                    feedback.comments,
                    feedback.created_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], feedback_from_row)?)
        })
    }

    fn feedback_for_ngo(&self, ngo_id: i64) -> Result<Vec<Feedback>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {FEEDBACK_COLUMNS} FROM feedback
                 WHERE ngo_id = ?1
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([ngo_id], feedback_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Transactions --

    fn insert_transaction(&self, transaction: &NewTransaction) -> Result<Transaction> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO transactions (donation_id, request_id, ngo_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    transaction.donation_id,
                    transaction.request_id,
                    transaction.ngo_id,
                    transaction.status,
                    transaction.created_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], transaction_from_row)?)
        })
    }

    fn list_transactions(&self, page: Page) -> Result<Vec<Transaction>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![i64::from(page.limit), i64::from(page.offset)],
                    transaction_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Notifications --

    fn insert_notification(&self, notification: &NewNotification) -> Result<Notification> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (user_id, title, message, kind, related_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    notification.user_id,
                    notification.title,
                    notification.message,
                    notification.kind.as_str(),
                    notification.related_id,
                    notification.created_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1");
            let row = conn.query_row(&sql, [id], notification_from_row)?;
            Ok(row)
        })
    }

    fn notifications_for(&self, user_id: i64, limit: u32) -> Result<Vec<Notification>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, i64::from(limit)], notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Activity log --

    fn record_activity(&self, activity: &NewActivity) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO activity_log (user_id, action, details, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![activity.user_id, activity.action, activity.details, activity.created_at],
            )?;
            Ok(())
        })
    }

    fn activity_for(&self, user_id: i64, limit: u32) -> Result<Vec<Activity>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, action, details, created_at FROM activity_log
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, i64::from(limit)], |row| {
                    Ok(Activity {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        action: row.get(2)?,
                        details: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn stats(&self) -> Result<Stats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM donations),
                    (SELECT COUNT(*) FROM donations WHERE status = 'Delivered'),
                    (SELECT COUNT(*) FROM requests),
                    (SELECT COUNT(*) FROM requests WHERE status = 'Fulfilled'),
                    (SELECT COUNT(*) FROM accounts WHERE role = 'Donor'),
                    (SELECT COUNT(*) FROM accounts WHERE role = 'NGO'),
                    (SELECT COUNT(*) FROM accounts WHERE role = 'Receiver')",
                [],
                |row| {
                    Ok(Stats {
                        total_donations: row.get(0)?,
                        delivered_donations: row.get(1)?,
                        total_requests: row.get(2)?,
                        fulfilled_requests: row.get(3)?,
                        total_donors: row.get(4)?,
                        total_ngos: row.get(5)?,
                        total_receivers: row.get(6)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }
}

fn query_account<P: rusqlite::ToSql>(
    conn: &Connection,
    predicate: &str,
    value: P,
) -> Result<Option<AccountRow>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {predicate}");
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(AccountRow {
                account: Account {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                    role: parse_text(row, 3)?,
                    address: row.get(4)?,
                    phone: row.get(5)?,
                    description: row.get(6)?,
                    family_size: row.get(7)?,
                    latitude: row.get(8)?,
                    longitude: row.get(9)?,
                    verified: row.get(10)?,
                    last_login: row.get(11)?,
                    created_at: row.get(12)?,
                    updated_at: row.get(13)?,
                },
                password_hash: row.get(14)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_donation(conn: &Connection, id: i64) -> Result<Option<Donation>> {
    let sql = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], donation_from_row).optional()?)
}

fn query_request(conn: &Connection, id: i64) -> Result<Option<FoodRequest>> {
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], request_from_row).optional()?)
}

fn donation_from_row(row: &Row<'_>) -> rusqlite::Result<Donation> {
    Ok(Donation {
        id: row.get(0)?,
        donor_id: row.get(1)?,
        food_type: row.get(2)?,
        quantity: row.get(3)?,
        pickup_address: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        expiry_time: row.get(7)?,
        image_url: row.get(8)?,
        status: parse_text(row, 9)?,
        ngo_id: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<FoodRequest> {
    Ok(FoodRequest {
        id: row.get(0)?,
        receiver_id: row.get(1)?,
        food_type: row.get(2)?,
        quantity: row.get(3)?,
        delivery_address: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        notes: row.get(7)?,
        status: parse_text(row, 8)?,
        ngo_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        user_id: row.get(1)?,
        ngo_id: row.get(2)?,
        rating: row.get(3)?,
        comments: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        donation_id: row.get(1)?,
        request_id: row.get(2)?,
        ngo_id: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        kind: parse_text(row, 4)?,
        read: row.get(5)?,
        related_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Reads a TEXT column into one of the closed string enums.
fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

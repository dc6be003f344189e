use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE accounts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                name            TEXT NOT NULL,
                role            TEXT NOT NULL,
                address         TEXT,
                phone           TEXT,
                description     TEXT,
                family_size     INTEGER,
                latitude        REAL,
                longitude       REAL,
                verified        INTEGER NOT NULL DEFAULT 0,
                last_login      TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_accounts_role ON accounts(role);

            CREATE TABLE donations (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                donor_id        INTEGER NOT NULL REFERENCES accounts(id),
                food_type       TEXT NOT NULL,
                quantity        TEXT NOT NULL,
                pickup_address  TEXT NOT NULL,
                latitude        REAL,
                longitude       REAL,
                expiry_time     TEXT NOT NULL,
                image_url       TEXT,
                status          TEXT NOT NULL DEFAULT 'Pending',
                ngo_id          INTEGER REFERENCES accounts(id),
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_donations_donor ON donations(donor_id);
            CREATE INDEX idx_donations_status ON donations(status);
            CREATE INDEX idx_donations_created ON donations(created_at);

            CREATE TABLE requests (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                receiver_id         INTEGER NOT NULL REFERENCES accounts(id),
                food_type           TEXT NOT NULL,
                quantity            TEXT NOT NULL,
                delivery_address    TEXT NOT NULL,
                latitude            REAL,
                longitude           REAL,
                notes               TEXT,
                status              TEXT NOT NULL DEFAULT 'Requested',
                ngo_id              INTEGER REFERENCES accounts(id),
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_requests_receiver ON requests(receiver_id);
            CREATE INDEX idx_requests_status ON requests(status);

            CREATE TABLE notifications (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES accounts(id),
                title       TEXT NOT NULL,
                message     TEXT NOT NULL,
                kind        TEXT NOT NULL,
                read        INTEGER NOT NULL DEFAULT 0,
                related_id  INTEGER,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id);

            CREATE TABLE activity_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES accounts(id),
                action      TEXT NOT NULL,
                details     TEXT,
                created_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (feedback, transactions)");
        conn.execute_batch(
            "
            CREATE TABLE feedback (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES accounts(id),
                ngo_id      INTEGER NOT NULL REFERENCES accounts(id),
                rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comments    TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_feedback_ngo ON feedback(ngo_id);

            CREATE TABLE transactions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                donation_id  INTEGER NOT NULL REFERENCES donations(id),
                request_id   INTEGER NOT NULL REFERENCES requests(id),
                ngo_id       INTEGER NOT NULL REFERENCES accounts(id),
                status       TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );

            CREATE INDEX idx_transactions_created ON transactions(created_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }
}

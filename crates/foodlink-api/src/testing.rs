//! Fixtures shared by the workflow unit tests.

use chrono::Utc;

use foodlink_db::Store;
use foodlink_db::models::NewAccount;
use foodlink_types::api::Claims;
use foodlink_types::models::Role;

/// Stores an account and returns the claims its token would carry.
pub(crate) fn account(store: &dyn Store, email: &str, role: Role) -> Claims {
    let account = store
        .create_account(&NewAccount {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: email.to_string(),
            role,
            address: None,
            phone: None,
            description: None,
            family_size: None,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        })
        .unwrap()
        .expect("email already taken");
    Claims { sub: account.id, role, iat: 0, exp: usize::MAX }
}

//! Test data factories.
//!
//! Each factory creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::NaiveDateTime;
use time::Duration;
use uuid::Uuid;

use crate::{application::jwt::TokenPolicy, domain::entities::account::Account};

/// Create a verified test account with sensible defaults.
pub fn create_test_account(overrides: impl FnOnce(&mut Account)) -> Account {
    let mut account = Account {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        username: "testuser".to_string(),
        email: "test@example.com".to_string(),
        verified: true,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut account);
    account
}

/// Production token lifetimes: 3h access, 48h refresh, 48h denylist retention.
pub fn test_token_policy() -> TokenPolicy {
    TokenPolicy {
        issuer: "blog-be".to_string(),
        audience: "blog-ui".to_string(),
        access_ttl: Duration::hours(3),
        refresh_ttl: Duration::hours(48),
        revocation_retention: Duration::hours(48),
    }
}

/// Fixed timestamp for deterministic fixtures.
pub fn test_datetime() -> NaiveDateTime {
    chrono::DateTime::from_timestamp(1_704_067_200, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

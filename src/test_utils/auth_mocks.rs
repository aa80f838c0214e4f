//! In-memory mocks for the auth ports: code store, revocation registry,
//! notification dispatch and geolocation.
//!
//! Expiring entries are timed with `tokio::time::Instant` so tests can run with
//! paused time and `tokio::time::advance`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use time::Duration;
use tokio::time::Instant;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        jwt::{RevocationRegistry, SessionClaims},
        use_cases::auth::{CodeStore, GeoLocator, NotificationDispatcher},
    },
    domain::entities::notification::NotificationTask,
};

fn deadline(ttl: Duration) -> Instant {
    Instant::now() + ttl.unsigned_abs()
}

// ============================================================================
// Code store
// ============================================================================

/// In-memory one-time code store. Mirrors `PUT_SCRIPT` and `TAKE_SCRIPT` in
/// `infra::code_store`: a put never overwrites a live code, a new code for an
/// email retires the old one, and take is get-and-delete.
#[derive(Default)]
pub struct InMemoryCodeStore {
    codes: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a code that never expires.
    pub fn seed(&self, code: &str, email: &str) {
        self.codes
            .lock()
            .unwrap()
            .insert(code.to_string(), (email.to_string(), None));
    }

    /// Live codes issued for `email`.
    pub fn codes_for(&self, email: &str) -> Vec<String> {
        let mut codes = self.codes.lock().unwrap();
        Self::purge(&mut codes);
        codes
            .iter()
            .filter(|(_, (owner, _))| owner == email)
            .map(|(code, _)| code.clone())
            .collect()
    }

    pub fn code_for(&self, email: &str) -> Option<String> {
        self.codes_for(email).into_iter().next()
    }

    fn purge(codes: &mut HashMap<String, (String, Option<Instant>)>) {
        let now = Instant::now();
        codes.retain(|_, (_, expires)| expires.is_none_or(|at| at > now));
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn put(&self, code: &str, email: &str, ttl: Duration) -> AppResult<bool> {
        let mut codes = self.codes.lock().unwrap();
        Self::purge(&mut codes);
        if codes.contains_key(code) {
            return Ok(false);
        }
        codes.retain(|_, (owner, _)| owner != email);
        codes.insert(code.to_string(), (email.to_string(), Some(deadline(ttl))));
        Ok(true)
    }

    async fn get(&self, code: &str) -> AppResult<Option<String>> {
        let mut codes = self.codes.lock().unwrap();
        Self::purge(&mut codes);
        Ok(codes.get(code).map(|(email, _)| email.clone()))
    }

    async fn take(&self, code: &str) -> AppResult<Option<String>> {
        let mut codes = self.codes.lock().unwrap();
        Self::purge(&mut codes);
        Ok(codes.remove(code).map(|(email, _)| email))
    }
}

// ============================================================================
// Revocation registry
// ============================================================================

/// In-memory token denylist. `fail()` makes every call return an internal
/// error, like an unreachable Redis.
#[derive(Default)]
pub struct InMemoryRevocationRegistry {
    entries: Mutex<HashMap<String, Instant>>,
    failing: AtomicBool,
}

impl InMemoryRevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("revocation registry unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RevocationRegistry for InMemoryRevocationRegistry {
    async fn record(
        &self,
        token_id: &str,
        _claims: &SessionClaims,
        retention: Duration,
    ) -> AppResult<bool> {
        self.check_available()?;
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        entries.retain(|_, expires| *expires > now);
        if entries.contains_key(token_id) {
            return Ok(false);
        }
        entries.insert(token_id.to_string(), deadline(retention));
        Ok(true)
    }

    async fn contains(&self, token_id: &str) -> AppResult<bool> {
        self.check_available()?;
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(token_id)
            .is_some_and(|expires| *expires > Instant::now()))
    }
}

// ============================================================================
// Notification dispatch
// ============================================================================

/// Records every queued notification instead of queueing it.
#[derive(Default)]
pub struct CapturingDispatcher {
    tasks: Mutex<Vec<NotificationTask>>,
}

impl CapturingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> Vec<NotificationTask> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for CapturingDispatcher {
    async fn enqueue(&self, task: NotificationTask) -> AppResult<()> {
        self.tasks.lock().unwrap().push(task);
        Ok(())
    }
}

// ============================================================================
// Geolocation
// ============================================================================

/// Geolocation stub. Resolves nothing until a location is set.
#[derive(Default)]
pub struct StubGeoLocator {
    location: Mutex<Option<String>>,
    failing: AtomicBool,
}

impl StubGeoLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_location(&self, location: &str) {
        *self.location.lock().unwrap() = Some(location.to_string());
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl GeoLocator for StubGeoLocator {
    async fn locate(&self, _ip: IpAddr) -> AppResult<Option<String>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("geolocation unavailable".into()));
        }
        Ok(self.location.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_refuses_a_live_code() {
        let store = InMemoryCodeStore::new();
        assert!(store.put("111111", "a@gmail.com", Duration::hours(5)).await.unwrap());
        assert!(!store.put("111111", "b@gmail.com", Duration::hours(5)).await.unwrap());
        assert_eq!(store.get("111111").await.unwrap().as_deref(), Some("a@gmail.com"));
    }

    #[tokio::test]
    async fn new_code_retires_the_previous_one() {
        let store = InMemoryCodeStore::new();
        store.put("111111", "a@gmail.com", Duration::hours(5)).await.unwrap();
        store.put("222222", "a@gmail.com", Duration::hours(5)).await.unwrap();

        assert_eq!(store.get("111111").await.unwrap(), None);
        assert_eq!(store.codes_for("a@gmail.com"), vec!["222222".to_string()]);
    }

    #[tokio::test]
    async fn take_is_single_use() {
        let store = InMemoryCodeStore::new();
        store.put("333333", "a@gmail.com", Duration::hours(5)).await.unwrap();

        assert_eq!(store.take("333333").await.unwrap().as_deref(), Some("a@gmail.com"));
        assert_eq!(store.take("333333").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_code_can_be_reissued() {
        let store = InMemoryCodeStore::new();
        store.put("444444", "a@gmail.com", Duration::seconds(10)).await.unwrap();

        tokio::time::advance(std::time::Duration::from_secs(11)).await;
        assert_eq!(store.get("444444").await.unwrap(), None);
        assert!(store.put("444444", "b@gmail.com", Duration::seconds(10)).await.unwrap());
    }
}

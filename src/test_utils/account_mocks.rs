//! In-memory mock of the account repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult, ConflictField},
    application::use_cases::account::AccountRepo,
    domain::entities::account::{Account, AccountChanges, NewAccount},
};

/// In-memory implementation of AccountRepo for testing.
///
/// Enforces the same unique constraints as the `users` table.
#[derive(Default)]
pub struct InMemoryAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, Account>>,
    yield_on_lookup: AtomicBool,
}

impl InMemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo with initial accounts for testing.
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let map: HashMap<Uuid, Account> = accounts.into_iter().map(|a| (a.id, a)).collect();
        Self {
            accounts: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Makes every email lookup yield to the scheduler once, so concurrent
    /// flows interleave at that await point.
    pub fn yield_on_lookups(&self) {
        self.yield_on_lookup.store(true, Ordering::SeqCst);
    }

    pub fn insert_account(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }

    pub fn count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    fn check_unique(
        accounts: &HashMap<Uuid, Account>,
        except: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<()> {
        let others = || accounts.values().filter(|a| Some(a.id) != except);
        if let Some(username) = username
            && others().any(|a| a.username == username)
        {
            return Err(AppError::Conflict(ConflictField::Username));
        }
        if let Some(email) = email
            && others().any(|a| a.email == email)
        {
            return Err(AppError::Conflict(ConflictField::Email));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepo for InMemoryAccountRepo {
    async fn insert(&self, account: &NewAccount) -> AppResult<Account> {
        let mut accounts = self.accounts.lock().unwrap();
        Self::check_unique(
            &accounts,
            None,
            Some(&account.username),
            Some(&account.email),
        )?;

        let now = chrono::Utc::now().naive_utc();
        let stored = Account {
            id: Uuid::new_v4(),
            name: account.name.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            verified: false,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        if self.yield_on_lookup.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> AppResult<Account> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(&id).ok_or(AppError::NotFound)?;

        account.verified = true;
        account.updated_at = chrono::Utc::now().naive_utc();

        Ok(account.clone())
    }

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account> {
        let mut accounts = self.accounts.lock().unwrap();
        if !accounts.contains_key(&id) {
            return Err(AppError::NotFound);
        }
        Self::check_unique(
            &accounts,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        )?;

        let account = accounts.get_mut(&id).ok_or(AppError::NotFound)?;
        if let Some(name) = &changes.name {
            account.name = name.clone();
        }
        if let Some(username) = &changes.username {
            account.username = username.clone();
        }
        if let Some(email) = &changes.email {
            account.email = email.clone();
        }
        account.updated_at = chrono::Utc::now().naive_utc();

        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.accounts
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}

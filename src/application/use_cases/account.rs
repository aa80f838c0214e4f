use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, FieldErrors};
use crate::application::use_cases::with_deadline;
use crate::application::validators::{check_email, check_name, check_username};
use crate::domain::entities::account::{Account, AccountChanges, NewAccount};

// ============================================================================
// Repository Trait
// ============================================================================

/// Durable account storage. Implementations report unique violations as
/// `AppError::Conflict` and missing rows on mutation as `AppError::NotFound`.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn insert(&self, account: &NewAccount) -> AppResult<Account>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>>;
    async fn mark_verified(&self, id: Uuid) -> AppResult<Account>;
    async fn update(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileInput {
    pub fn validate(self) -> AppResult<AccountChanges> {
        let mut errors = FieldErrors::default();
        let name = self.name.map(|n| n.trim().to_string());
        let email = self.email.map(|e| e.trim().to_string());

        if let Some(name) = &name {
            check_name(&mut errors, name);
        }
        if let Some(username) = &self.username {
            check_username(&mut errors, username);
        }
        if let Some(email) = &email {
            check_email(&mut errors, email);
        }
        errors.into_result()?;

        Ok(AccountChanges {
            name,
            username: self.username,
            email,
        })
    }
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AccountUseCases {
    repo: Arc<dyn AccountRepo>,
    downstream_timeout: Duration,
}

impl AccountUseCases {
    pub fn new(repo: Arc<dyn AccountRepo>, downstream_timeout: Duration) -> Self {
        Self {
            repo,
            downstream_timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, account_id: Uuid) -> AppResult<Account> {
        with_deadline(
            self.downstream_timeout,
            "account lookup",
            self.repo.get_by_id(account_id),
        )
        .await?
        .ok_or(AppError::NotFound)
    }

    /// Applies only the fields present in `input`. An empty update returns the
    /// stored profile unchanged.
    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        input: UpdateProfileInput,
    ) -> AppResult<Account> {
        let changes = input.validate()?;
        if changes.is_empty() {
            return self.get_profile(account_id).await;
        }

        with_deadline(
            self.downstream_timeout,
            "account update",
            self.repo.update(account_id, &changes),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, account_id: Uuid) -> AppResult<()> {
        with_deadline(
            self.downstream_timeout,
            "account delete",
            self.repo.delete(account_id),
        )
        .await
    }
}

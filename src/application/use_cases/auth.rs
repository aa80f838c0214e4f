use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use rand::{Rng, rngs::OsRng};
use serde::Deserialize;
use time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, FieldErrors, InvalidTokenReason};
use crate::application::device;
use crate::application::jwt::{RevocationRegistry, SessionClaims, TokenPair, TokenSigner};
use crate::application::use_cases::account::AccountRepo;
use crate::application::use_cases::with_deadline;
use crate::application::validators::{CODE_LEN, check_code, check_email, check_name, check_username};
use crate::domain::entities::account::{Account, NewAccount};
use crate::domain::entities::notification::{NotificationPayload, NotificationTask};
use crate::domain::entities::token_kind::TokenKind;

/// Attempts at drawing a code that is not already outstanding.
const MAX_CODE_ATTEMPTS: usize = 5;
const UNKNOWN_LOCATION: &str = "Unknown location";

// ============================================================================
// Ports
// ============================================================================

/// One-time code storage. Presence is the only proof a code is valid.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Stores `code -> email` for `ttl` unless `code` is already taken.
    /// Any earlier outstanding code for the same email stops working.
    /// Returns false on a collision.
    async fn put(&self, code: &str, email: &str, ttl: Duration) -> AppResult<bool>;
    async fn get(&self, code: &str) -> AppResult<Option<String>>;
    /// Atomic get-and-delete. Exactly one concurrent caller sees the email.
    async fn take(&self, code: &str) -> AppResult<Option<String>>;
}

/// Fire-and-forget email queue.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn enqueue(&self, task: NotificationTask) -> AppResult<()>;
}

/// IP to human-readable location. `None` means the address could not be placed.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: IpAddr) -> AppResult<Option<String>>;
}

// ============================================================================
// Inputs / Outputs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl RegisterInput {
    pub fn validate(self) -> AppResult<NewAccount> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();

        let mut errors = FieldErrors::default();
        check_name(&mut errors, &name);
        check_username(&mut errors, &self.username);
        check_email(&mut errors, &email);
        errors.into_result()?;

        Ok(NewAccount {
            name,
            username: self.username,
            email,
        })
    }
}

/// Body carrying a one-time code, used by both verification and login.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeInput {
    #[serde(default)]
    pub token: String,
}

impl CodeInput {
    pub fn validate(self) -> AppResult<String> {
        let token = self.token.trim().to_string();
        let mut errors = FieldErrors::default();
        check_code(&mut errors, "token", &token);
        errors.into_result()?;
        Ok(token)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailInput {
    #[serde(default)]
    pub email: String,
}

impl EmailInput {
    pub fn validate(self) -> AppResult<String> {
        let email = self.email.trim().to_string();
        let mut errors = FieldErrors::default();
        check_email(&mut errors, &email);
        errors.into_result()?;
        Ok(email)
    }
}

/// Where a login request came from.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub ip: IpAddr,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: Account,
    pub tokens: TokenPair,
}

/// A bearer token that passed verification, bound to the account it names.
#[derive(Debug, Clone)]
pub struct AuthenticatedRequest {
    pub account_id: Uuid,
    pub token: String,
    pub claims: SessionClaims,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub code_ttl: Duration,
    pub downstream_timeout: StdDuration,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AuthUseCases {
    accounts: Arc<dyn AccountRepo>,
    codes: Arc<dyn CodeStore>,
    revocations: Arc<dyn RevocationRegistry>,
    notifications: Arc<dyn NotificationDispatcher>,
    geo: Arc<dyn GeoLocator>,
    signer: TokenSigner,
    settings: AuthSettings,
}

impl AuthUseCases {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        codes: Arc<dyn CodeStore>,
        revocations: Arc<dyn RevocationRegistry>,
        notifications: Arc<dyn NotificationDispatcher>,
        geo: Arc<dyn GeoLocator>,
        signer: TokenSigner,
        settings: AuthSettings,
    ) -> Self {
        Self {
            accounts,
            codes,
            revocations,
            notifications,
            geo,
            signer,
            settings,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    // ========================================================================
    // Registration and verification
    // ========================================================================

    /// Creates an unverified account and mails it a verification code.
    ///
    /// The account row is written first, so a username or email conflict leaves
    /// no code behind and sends nothing.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<Account> {
        let new_account = input.validate()?;

        let account = self
            .deadline("account insert", self.accounts.insert(&new_account))
            .await?;

        let code = self.issue_code(&account.email).await?;
        let task = NotificationTask::new(
            &account.email,
            &account.name,
            NotificationPayload::Welcome { code },
        );
        // The account exists either way; a fresh code can be requested via login.
        if let Err(e) = self.enqueue(task).await {
            warn!(account_id = %account.id, error = %e, "Failed to queue welcome email");
        }

        info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// Consumes a code and marks the account it was issued for as verified.
    /// Verifying an already-verified account succeeds without changes.
    ///
    /// The code is taken atomically before anything else, so it cannot also be
    /// redeemed by a concurrent verification or login.
    #[instrument(skip(self, input))]
    pub async fn verify_email(&self, input: CodeInput) -> AppResult<Account> {
        let code = input.validate()?;

        let email = self
            .deadline("code take", self.codes.take(&code))
            .await?
            .filter(|email| !email.is_empty())
            .ok_or(AppError::InvalidToken(InvalidTokenReason::UnknownCode))?;

        let account = self
            .deadline("account lookup", self.accounts.get_by_email(&email))
            .await?
            .ok_or(AppError::InvalidToken(InvalidTokenReason::UnknownAccount))?;

        if account.verified {
            return Ok(account);
        }

        let account = match self
            .deadline("account verify", self.accounts.mark_verified(account.id))
            .await
        {
            Ok(account) => account,
            Err(AppError::NotFound) => {
                return Err(AppError::InvalidToken(InvalidTokenReason::UnknownAccount));
            }
            Err(e) => return Err(e),
        };

        info!(account_id = %account.id, "Email verified");
        Ok(account)
    }

    // ========================================================================
    // Passwordless login
    // ========================================================================

    /// First login step: mails a one-time code to a known address.
    #[instrument(skip(self, input))]
    pub async fn request_login_code(&self, input: EmailInput) -> AppResult<Account> {
        let email = input.validate()?;

        let account = self
            .deadline("account lookup", self.accounts.get_by_email(&email))
            .await?
            .ok_or(AppError::NotFound)?;

        let code = self.issue_code(&account.email).await?;
        self.enqueue(NotificationTask::new(
            &account.email,
            &account.name,
            NotificationPayload::LoginCode { code },
        ))
        .await?;

        Ok(account)
    }

    /// Second login step: redeems the code and starts a session.
    #[instrument(skip(self, input, client), fields(ip = %client.ip))]
    pub async fn complete_login(
        &self,
        input: CodeInput,
        client: ClientContext,
    ) -> AppResult<LoginOutcome> {
        let code = input.validate()?;

        let email = self
            .deadline("code take", self.codes.take(&code))
            .await?
            .filter(|email| !email.is_empty())
            .ok_or(AppError::InvalidToken(InvalidTokenReason::UnknownCode))?;

        let account = self
            .deadline("account lookup", self.accounts.get_by_email(&email))
            .await?
            .ok_or(AppError::InvalidToken(InvalidTokenReason::UnknownAccount))?;

        let location = self.locate(client.ip).await;
        let device = device::describe(client.user_agent.as_deref());
        let alert = NotificationTask::new(
            &account.email,
            &account.name,
            NotificationPayload::LoginAlert { location, device },
        );
        if let Err(e) = self.enqueue(alert).await {
            warn!(account_id = %account.id, error = %e, "Failed to queue login alert");
        }

        let tokens = self.signer.issue_pair(account.id)?;

        info!(account_id = %account.id, "Login completed");
        Ok(LoginOutcome { account, tokens })
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Turns a raw bearer token into an authenticated request of the given kind.
    #[instrument(skip(self, bearer))]
    pub async fn authenticate(
        &self,
        bearer: Option<&str>,
        kind: TokenKind,
    ) -> AppResult<AuthenticatedRequest> {
        let token = bearer
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::InvalidToken(InvalidTokenReason::MissingBearer))?;

        let claims = self.verify(token).await?;
        self.signer.require_kind(&claims, kind)?;
        let account_id = claims.account_id()?;

        self.deadline("account lookup", self.accounts.get_by_id(account_id))
            .await?
            .ok_or(AppError::InvalidToken(InvalidTokenReason::UnknownAccount))?;

        Ok(AuthenticatedRequest {
            account_id,
            token: token.to_string(),
            claims,
        })
    }

    /// Revokes the presented access token. A second logout with the same token
    /// fails because the token no longer verifies.
    #[instrument(skip(self, auth), fields(account_id = %auth.account_id))]
    pub async fn logout(&self, auth: &AuthenticatedRequest) -> AppResult<()> {
        let claims = self.verify(&auth.token).await?;
        self.signer.require_kind(&claims, TokenKind::Access)?;
        self.revoke(&claims).await?;

        info!("Logged out");
        Ok(())
    }

    /// Rotates a refresh token: the presented token is revoked before the new
    /// pair is minted, so it can be redeemed exactly once.
    #[instrument(skip(self, auth), fields(account_id = %auth.account_id))]
    pub async fn refresh(&self, auth: &AuthenticatedRequest) -> AppResult<TokenPair> {
        self.signer.require_kind(&auth.claims, TokenKind::Refresh)?;
        self.revoke(&auth.claims).await?;
        self.signer.issue_pair(auth.account_id)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn deadline<T>(
        &self,
        what: &str,
        fut: impl std::future::Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        with_deadline(self.settings.downstream_timeout, what, fut).await
    }

    async fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        self.deadline("token verify", async {
            self.signer
                .verify(token, self.revocations.as_ref())
                .await
                .map_err(AppError::from)
        })
        .await
    }

    /// Records the token in the denylist. Only the first recorder wins.
    async fn revoke(&self, claims: &SessionClaims) -> AppResult<()> {
        let retention = self.signer.policy().revocation_retention;
        let recorded = self
            .deadline(
                "revocation record",
                self.revocations.record(&claims.jti, claims, retention),
            )
            .await?;
        if !recorded {
            return Err(AppError::InvalidToken(InvalidTokenReason::Revoked));
        }
        Ok(())
    }

    async fn issue_code(&self, email: &str) -> AppResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let stored = self
                .deadline(
                    "code store",
                    self.codes.put(&code, email, self.settings.code_ttl),
                )
                .await?;
            if stored {
                return Ok(code);
            }
        }
        Err(AppError::Internal(
            "could not allocate an unused one-time code".into(),
        ))
    }

    async fn enqueue(&self, task: NotificationTask) -> AppResult<()> {
        self.deadline("notification enqueue", self.notifications.enqueue(task))
            .await
    }

    async fn locate(&self, ip: IpAddr) -> String {
        match self.deadline("geolocation", self.geo.locate(ip)).await {
            Ok(Some(location)) => location,
            Ok(None) => UNKNOWN_LOCATION.to_string(),
            Err(e) => {
                warn!(%ip, error = %e, "Geolocation failed");
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

/// Six digits drawn from the OS CSPRNG.
pub fn generate_code() -> String {
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + OsRng.gen_range(0..10u8)))
        .collect()
}

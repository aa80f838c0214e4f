//! Wiring of use cases and `AppState` onto in-memory mocks.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt::TokenSigner,
        use_cases::{
            account::AccountUseCases,
            auth::{AuthSettings, AuthUseCases},
            notification::NotificationUseCases,
        },
    },
    domain::entities::account::Account,
    infra::config::AppConfig,
    test_utils::{
        CapturingDispatcher, InMemoryAccountRepo, InMemoryCodeStore, InMemoryNotificationQueue,
        InMemoryRevocationRegistry, RecordingEmailSender, StubGeoLocator, test_token_policy,
    },
};

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-bytes";

fn test_settings() -> AuthSettings {
    AuthSettings {
        code_ttl: Duration::hours(5),
        downstream_timeout: std::time::Duration::from_secs(3),
    }
}

fn test_signer() -> TokenSigner {
    TokenSigner::new(SecretString::from(TEST_JWT_SECRET), test_token_policy()).unwrap()
}

/// Configuration matching the production defaults, with dummy credentials.
pub fn test_config() -> AppConfig {
    let policy = test_token_policy();
    AppConfig {
        database_url: "postgres://localhost/blog_test".to_string(),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        token_issuer: policy.issuer,
        token_audience: policy.audience,
        access_token_ttl: policy.access_ttl,
        refresh_token_ttl: policy.refresh_ttl,
        revocation_retention: policy.revocation_retention,
        code_ttl: Duration::hours(5),
        downstream_timeout: std::time::Duration::from_secs(3),
        max_body_bytes: 1024 * 1024,
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        trust_proxy: false,
        resend_api_key: SecretString::from("re_test"),
        email_from: "Blog <noreply@blog.example>".to_string(),
        app_origin: Url::parse("https://blog.example").unwrap(),
        ipdata_api_key: None,
        notification_max_retry: 3,
    }
}

// ============================================================================
// AuthHarness
// ============================================================================

/// `AuthUseCases` over in-memory mocks, with handles to every mock for
/// assertions.
pub struct AuthHarness {
    pub auth: AuthUseCases,
    pub accounts: Arc<InMemoryAccountRepo>,
    pub codes: Arc<InMemoryCodeStore>,
    pub revocations: Arc<InMemoryRevocationRegistry>,
    pub dispatcher: Arc<CapturingDispatcher>,
    pub geo: Arc<StubGeoLocator>,
}

impl AuthHarness {
    pub fn new() -> Self {
        let accounts = Arc::new(InMemoryAccountRepo::new());
        let codes = Arc::new(InMemoryCodeStore::new());
        let revocations = Arc::new(InMemoryRevocationRegistry::new());
        let dispatcher = Arc::new(CapturingDispatcher::new());
        let geo = Arc::new(StubGeoLocator::new());

        let auth = AuthUseCases::new(
            accounts.clone(),
            codes.clone(),
            revocations.clone(),
            dispatcher.clone(),
            geo.clone(),
            test_signer(),
            test_settings(),
        );

        Self {
            auth,
            accounts,
            codes,
            revocations,
            dispatcher,
            geo,
        }
    }
}

// ============================================================================
// TestAppStateBuilder
// ============================================================================

/// A full `AppState` plus the mocks behind it.
pub struct TestApp {
    pub state: AppState,
    pub accounts: Arc<InMemoryAccountRepo>,
    pub codes: Arc<InMemoryCodeStore>,
    pub dispatcher: Arc<CapturingDispatcher>,
    pub geo: Arc<StubGeoLocator>,
}

/// Builder for creating `AppState` with in-memory mocks for HTTP tests.
///
/// # Example
///
/// ```ignore
/// let account = create_test_account(|a| a.username = "iamaddam".into());
/// let app = TestAppStateBuilder::new().with_account(account).build();
/// let server = TestServer::new(build_router(app.state.clone())).unwrap();
/// ```
#[derive(Default)]
pub struct TestAppStateBuilder {
    accounts: Vec<Account>,
    max_body_bytes: Option<usize>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    pub fn build(self) -> TestApp {
        let mut config = test_config();
        if let Some(limit) = self.max_body_bytes {
            config.max_body_bytes = limit;
        }

        let accounts = Arc::new(InMemoryAccountRepo::with_accounts(self.accounts));
        let codes = Arc::new(InMemoryCodeStore::new());
        let dispatcher = Arc::new(CapturingDispatcher::new());
        let geo = Arc::new(StubGeoLocator::new());

        let auth_use_cases = AuthUseCases::new(
            accounts.clone(),
            codes.clone(),
            Arc::new(InMemoryRevocationRegistry::new()),
            dispatcher.clone(),
            geo.clone(),
            test_signer(),
            test_settings(),
        );
        let account_use_cases =
            AccountUseCases::new(accounts.clone(), config.downstream_timeout);
        let notification_use_cases = NotificationUseCases::new(
            Arc::new(InMemoryNotificationQueue::new()),
            Arc::new(RecordingEmailSender::new()),
            config.app_origin.to_string(),
            config.notification_max_retry,
        );

        let state = AppState {
            config: Arc::new(config),
            auth_use_cases: Arc::new(auth_use_cases),
            account_use_cases: Arc::new(account_use_cases),
            notification_use_cases: Arc::new(notification_use_cases),
        };

        TestApp {
            state,
            accounts,
            codes,
            dispatcher,
            geo,
        }
    }
}

use std::fs::File;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{email::resend::ResendEmailSender, http::app_state::AppState},
    application::{
        jwt::{RevocationRegistry, TokenSigner},
        use_cases::{
            account::{AccountRepo, AccountUseCases},
            auth::{AuthSettings, AuthUseCases, GeoLocator},
            notification::NotificationUseCases,
        },
    },
    infra::{
        code_store::RedisCodeStore,
        config::AppConfig,
        db::init_redis,
        error::InfraError,
        geolocation::{DisabledGeoLocator, IpDataLocator},
        notification_queue::RedisNotificationQueue,
        postgres_persistence,
        revocation::RedisRevocationRegistry,
    },
};

/// Wires every port to its production adapter.
pub async fn init_app_state() -> Result<AppState, InfraError> {
    let config = AppConfig::from_env()?;

    let signer = TokenSigner::new(config.jwt_secret.clone(), config.token_policy())?;

    let postgres = postgres_persistence(&config.database_url).await?;
    let redis = init_redis(&config.redis_url).await?;

    let codes = Arc::new(RedisCodeStore::new(redis.clone()));
    let revocations: Arc<dyn RevocationRegistry> =
        Arc::new(RedisRevocationRegistry::new(redis.clone()));
    let queue = Arc::new(RedisNotificationQueue::new(redis));

    let geo: Arc<dyn GeoLocator> = match &config.ipdata_api_key {
        Some(key) => Arc::new(
            IpDataLocator::new(key.clone(), config.downstream_timeout)
                .map_err(InfraError::HttpClient)?,
        ),
        None => {
            info!("IPDATA_API_KEY not set, login alerts will not include a location");
            Arc::new(DisabledGeoLocator)
        }
    };

    let email = Arc::new(
        ResendEmailSender::new(config.resend_api_key.clone(), config.email_from.clone())
            .map_err(InfraError::HttpClient)?,
    );

    let account_repo = postgres.clone() as Arc<dyn AccountRepo>;

    let auth_use_cases = AuthUseCases::new(
        account_repo.clone(),
        codes,
        revocations,
        queue.clone(),
        geo,
        signer,
        AuthSettings {
            code_ttl: config.code_ttl,
            downstream_timeout: config.downstream_timeout,
        },
    );

    let account_use_cases = AccountUseCases::new(account_repo, config.downstream_timeout);

    let notification_use_cases = NotificationUseCases::new(
        queue,
        email,
        config.app_origin.to_string(),
        config.notification_max_retry,
    );

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        account_use_cases: Arc::new(account_use_cases),
        notification_use_cases: Arc::new(notification_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs). Console-only if the file cannot be opened.
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}

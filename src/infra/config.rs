use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::application::jwt::TokenPolicy;
use crate::infra::error::InfraError;

pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: SecretString,
    pub token_issuer: String,
    pub token_audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// How long logged-out and rotated tokens stay on the denylist.
    pub revocation_retention: Duration,
    pub code_ttl: Duration,
    /// Upper bound for each call into Postgres, Redis or ipdata on the request path.
    pub downstream_timeout: std::time::Duration,
    pub max_body_bytes: usize,
    pub cors_origin: HeaderValue,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub resend_api_key: SecretString,
    pub email_from: String,
    pub app_origin: Url,
    /// Geolocation is skipped when unset.
    pub ipdata_api_key: Option<SecretString>,
    pub notification_max_retry: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let database_url: String = get_env("DATABASE_URL");
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 4000)));

        let jwt_secret = SecretString::from(get_env::<String>("JWT_SECRET"));
        let token_issuer: String = get_env_default("TOKEN_ISSUER", "blog-be".to_string());
        let token_audience: String = get_env_default("TOKEN_AUDIENCE", "blog-ui".to_string());
        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 3 * 3600);
        let refresh_token_ttl_secs: i64 = get_env_default("REFRESH_TOKEN_TTL_SECS", 48 * 3600);
        let revocation_retention_secs: i64 =
            get_env_default("REVOCATION_RETENTION_SECS", 48 * 3600);
        let code_ttl_secs: i64 = get_env_default("CODE_TTL_SECS", 5 * 3600);

        let downstream_timeout_ms: u64 = get_env_default("DOWNSTREAM_TIMEOUT_MS", 3000);
        let max_body_bytes: usize = get_env_default("MAX_BODY_BYTES", 1024 * 1024);
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::InvalidConfig {
                    var: "CORS_ORIGIN",
                    reason: "must be a valid header value".into(),
                })?;
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let resend_api_key = SecretString::from(get_env::<String>("RESEND_API_KEY"));
        let email_from: String = get_env("EMAIL_FROM");
        let app_origin: Url = get_env("APP_ORIGIN");
        let ipdata_api_key = std::env::var("IPDATA_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);
        let notification_max_retry: u32 = get_env_default("NOTIFICATION_MAX_RETRY", 3);

        if code_ttl_secs <= 0 {
            return Err(InfraError::InvalidConfig {
                var: "CODE_TTL_SECS",
                reason: "must be positive".into(),
            });
        }
        if downstream_timeout_ms == 0 {
            return Err(InfraError::InvalidConfig {
                var: "DOWNSTREAM_TIMEOUT_MS",
                reason: "must be positive".into(),
            });
        }

        let config = Self {
            database_url,
            redis_url,
            bind_addr,
            jwt_secret,
            token_issuer,
            token_audience,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            refresh_token_ttl: Duration::seconds(refresh_token_ttl_secs),
            revocation_retention: Duration::seconds(revocation_retention_secs),
            code_ttl: Duration::seconds(code_ttl_secs),
            downstream_timeout: std::time::Duration::from_millis(downstream_timeout_ms),
            max_body_bytes,
            cors_origin,
            trust_proxy,
            resend_api_key,
            email_from,
            app_origin,
            ipdata_api_key,
            notification_max_retry,
        };

        config.token_policy().validate()?;
        Ok(config)
    }

    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy {
            issuer: self.token_issuer.clone(),
            audience: self.token_audience.clone(),
            access_ttl: self.access_token_ttl,
            refresh_ttl: self.refresh_token_ttl,
            revocation_retention: self.revocation_retention,
        }
    }
}

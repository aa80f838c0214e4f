use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, InvalidTokenReason};
use crate::domain::entities::token_kind::TokenKind;

/// HS256 keys shorter than this are refused at startup.
pub const MIN_SECRET_LEN: usize = 32;

// ============================================================================
// Policy
// ============================================================================

/// Lifetimes and tags shared by every token this service signs.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// How long a revocation entry is remembered.
    pub revocation_retention: Duration,
}

impl TokenPolicy {
    pub fn max_lifetime(&self) -> Duration {
        self.access_ttl.max(self.refresh_ttl)
    }

    /// A revocation entry that lapses before the token it covers would let the
    /// token back in, so retention has to outlive every token kind.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.access_ttl.is_positive() || !self.refresh_ttl.is_positive() {
            return Err(PolicyError::NonPositiveLifetime);
        }
        if self.revocation_retention < self.max_lifetime() {
            return Err(PolicyError::RetentionTooShort {
                retention_secs: self.revocation_retention.whole_seconds(),
                lifetime_secs: self.max_lifetime().whole_seconds(),
            });
        }
        Ok(())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes")]
    SecretTooShort,

    #[error("token lifetimes must be positive")]
    NonPositiveLifetime,

    #[error(
        "revocation retention ({retention_secs}s) is shorter than the longest token lifetime ({lifetime_secs}s)"
    )]
    RetentionTooShort {
        retention_secs: i64,
        lifetime_secs: i64,
    },
}

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id.
    pub sub: String,
    pub kind: TokenKind,
    /// Unique per issuance; the revocation key.
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn account_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSignature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("signature, algorithm or registered claims are invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token has been revoked")]
    Revoked,

    #[error("token kind or issuer does not match")]
    WrongKind,

    #[error("revocation registry unavailable: {0}")]
    Unavailable(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => AppError::InvalidToken(InvalidTokenReason::InvalidSignature),
            TokenError::Expired => AppError::InvalidToken(InvalidTokenReason::Expired),
            TokenError::Revoked => AppError::InvalidToken(InvalidTokenReason::Revoked),
            TokenError::WrongKind => AppError::InvalidToken(InvalidTokenReason::WrongKind),
            TokenError::Unavailable(msg) => AppError::Internal(msg),
        }
    }
}

// ============================================================================
// Revocation registry port
// ============================================================================

#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Remember `token_id` as revoked for `retention`.
    /// Returns false when the token was already recorded.
    async fn record(
        &self,
        token_id: &str,
        claims: &SessionClaims,
        retention: Duration,
    ) -> AppResult<bool>;

    async fn contains(&self, token_id: &str) -> AppResult<bool>;
}

// ============================================================================
// Signer
// ============================================================================

#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    policy: TokenPolicy,
}

impl TokenSigner {
    pub fn new(secret: SecretString, policy: TokenPolicy) -> Result<Self, PolicyError> {
        if secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(PolicyError::SecretTooShort);
        }
        policy.validate()?;
        Ok(Self { secret, policy })
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    pub fn issue_access(&self, account_id: Uuid) -> AppResult<String> {
        self.issue(account_id, TokenKind::Access, self.policy.access_ttl)
    }

    pub fn issue_refresh(&self, account_id: Uuid) -> AppResult<String> {
        self.issue(account_id, TokenKind::Refresh, self.policy.refresh_ttl)
    }

    pub fn issue_pair(&self, account_id: Uuid) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access(account_id)?,
            refresh_token: self.issue_refresh(account_id)?,
        })
    }

    fn issue(&self, account_id: Uuid, kind: TokenKind, ttl: Duration) -> AppResult<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionClaims {
            sub: account_id.to_string(),
            kind,
            jti: Uuid::new_v4().to_string(),
            iss: self.policy.issuer.clone(),
            aud: self.policy.audience.clone(),
            iat: now,
            nbf: now,
            exp: now + ttl.whole_seconds(),
        };
        let header = Header::new(Algorithm::HS256);
        encode(
            &header,
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Checks signature, algorithm, issuer, audience and validity window.
    /// Does not consult the revocation registry.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[self.policy.issuer.as_str()]);
        validation.set_audience(&[self.policy.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::InvalidSignature,
        })
    }

    /// Full verification: `decode` plus a denylist lookup.
    pub async fn verify(
        &self,
        token: &str,
        registry: &dyn RevocationRegistry,
    ) -> Result<SessionClaims, TokenError> {
        let claims = self.decode(token)?;
        let revoked = registry
            .contains(&claims.jti)
            .await
            .map_err(|e| TokenError::Unavailable(e.to_string()))?;
        if revoked {
            return Err(TokenError::Revoked);
        }
        Ok(claims)
    }

    /// The signature says nothing about what a token is for; this does.
    pub fn require_kind(&self, claims: &SessionClaims, kind: TokenKind) -> Result<(), TokenError> {
        if claims.kind != kind || claims.iss != self.policy.issuer {
            return Err(TokenError::WrongKind);
        }
        Ok(())
    }
}

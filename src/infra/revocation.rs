use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use time::Duration;

use crate::app_error::{AppError, AppResult};
use crate::application::jwt::{RevocationRegistry, SessionClaims};

/// Denylist of token ids. Entries carry the revoked claims for auditing and
/// expire on their own after the retention window.
#[derive(Clone)]
pub struct RedisRevocationRegistry {
    manager: ConnectionManager,
}

impl RedisRevocationRegistry {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn key(token_id: &str) -> String {
        format!("revoked:{token_id}")
    }
}

#[async_trait]
impl RevocationRegistry for RedisRevocationRegistry {
    async fn record(
        &self,
        token_id: &str,
        claims: &SessionClaims,
        retention: Duration,
    ) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        let value =
            serde_json::to_string(claims).map_err(|e| AppError::Internal(e.to_string()))?;

        // SET NX replies nil when the key already exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::key(token_id))
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(retention.whole_seconds().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(reply.is_some())
    }

    async fn contains(&self, token_id: &str) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        conn.exists::<_, bool>(Self::key(token_id))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use time::{Duration, OffsetDateTime};
use tracing::error;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::auth::NotificationDispatcher;
use crate::application::use_cases::notification::NotificationQueue;
use crate::domain::entities::notification::NotificationTask;

const PENDING_KEY: &str = "notifications:pending";
const RETRY_KEY: &str = "notifications:retry";
const PROMOTE_BATCH: usize = 100;

/// Moves due entries from the retry set to the pending list.
/// `test_utils::InMemoryNotificationQueue::promote_due` follows the same rule.
/// KEYS[1] retry zset, KEYS[2] pending list. ARGV[1] now (ms), ARGV[2] batch size.
const PROMOTE_SCRIPT: &str = r#"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, ARGV[2])
for _, task in ipairs(due) do
    redis.call('ZREM', KEYS[1], task)
    redis.call('LPUSH', KEYS[2], task)
end
return #due
"#;

/// Redis-backed task queue: a FIFO list of ready tasks plus a sorted set of
/// tasks waiting for their retry time.
#[derive(Clone)]
pub struct RedisNotificationQueue {
    manager: ConnectionManager,
    promote_script: Script,
}

impl RedisNotificationQueue {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            promote_script: Script::new(PROMOTE_SCRIPT),
        }
    }

    fn encode(task: &NotificationTask) -> AppResult<String> {
        serde_json::to_string(task).map_err(|e| AppError::Internal(e.to_string()))
    }

    fn now_ms() -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

#[async_trait]
impl NotificationDispatcher for RedisNotificationQueue {
    async fn enqueue(&self, task: NotificationTask) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .lpush(PENDING_KEY, Self::encode(&task)?)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationQueue for RedisNotificationQueue {
    async fn claim(&self, max: usize) -> AppResult<Vec<NotificationTask>> {
        let mut conn = self.manager.clone();

        // RPOP with a count replies nil on an empty list.
        let raw: Option<Vec<String>> = redis::cmd("RPOP")
            .arg(PENDING_KEY)
            .arg(max.max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let tasks = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|json| match serde_json::from_str(&json) {
                Ok(task) => Some(task),
                Err(e) => {
                    error!(error = %e, "Dropping malformed notification task");
                    None
                }
            })
            .collect();

        Ok(tasks)
    }

    async fn schedule_retry(&self, task: &NotificationTask, delay: Duration) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let due_at = Self::now_ms() + delay.whole_milliseconds() as i64;
        let _: () = conn
            .zadd(RETRY_KEY, Self::encode(task)?, due_at)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn promote_due(&self) -> AppResult<usize> {
        let mut conn = self.manager.clone();
        let moved: usize = self
            .promote_script
            .key(RETRY_KEY)
            .key(PENDING_KEY)
            .arg(Self::now_ms())
            .arg(PROMOTE_BATCH)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(moved)
    }
}

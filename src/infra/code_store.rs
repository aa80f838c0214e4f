use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use time::Duration;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::auth::CodeStore;

const CODE_PREFIX: &str = "otp:code:";
const EMAIL_PREFIX: &str = "otp:email:";

/// Stores `code -> email` unless the code is taken, and retires the email's
/// previous code so only the newest one works. `test_utils::InMemoryCodeStore`
/// implements the same branches and its tests pin them down.
/// KEYS[1] code key, KEYS[2] email index key.
/// ARGV[1] email, ARGV[2] code, ARGV[3] ttl secs, ARGV[4] code key prefix.
const PUT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
local previous = redis.call('GET', KEYS[2])
if previous then
    local previous_key = ARGV[4] .. previous
    if redis.call('GET', previous_key) == ARGV[1] then
        redis.call('DEL', previous_key)
    end
end
redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[3])
redis.call('SET', KEYS[2], ARGV[2], 'EX', ARGV[3])
return 1
"#;

/// Atomic get-and-delete of a code, dropping the email index when it still
/// points at this code.
/// KEYS[1] code key. ARGV[1] email index prefix, ARGV[2] code.
const TAKE_SCRIPT: &str = r#"
local email = redis.call('GET', KEYS[1])
if not email then
    return false
end
redis.call('DEL', KEYS[1])
local index = ARGV[1] .. email
if redis.call('GET', index) == ARGV[2] then
    redis.call('DEL', index)
end
return email
"#;

#[derive(Clone)]
pub struct RedisCodeStore {
    manager: ConnectionManager,
    put_script: Script,
    take_script: Script,
}

impl RedisCodeStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            put_script: Script::new(PUT_SCRIPT),
            take_script: Script::new(TAKE_SCRIPT),
        }
    }

    fn code_key(code: &str) -> String {
        format!("{CODE_PREFIX}{code}")
    }

    fn email_key(email: &str) -> String {
        format!("{EMAIL_PREFIX}{email}")
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn put(&self, code: &str, email: &str, ttl: Duration) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        let ttl_secs = ttl.whole_seconds().max(1);

        let stored: i64 = self
            .put_script
            .key(Self::code_key(code))
            .key(Self::email_key(email))
            .arg(email)
            .arg(code)
            .arg(ttl_secs)
            .arg(CODE_PREFIX)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(stored == 1)
    }

    async fn get(&self, code: &str) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<String>>(Self::code_key(code))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn take(&self, code: &str) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        self.take_script
            .key(Self::code_key(code))
            .arg(EMAIL_PREFIX)
            .arg(code)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

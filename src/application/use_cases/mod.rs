pub mod account;
pub mod auth;
pub mod notification;

use std::future::Future;
use std::time::Duration;

use crate::app_error::{AppError, AppResult};

/// Bounds one downstream call. A call that outlives `deadline` is dropped and
/// reported as an internal error.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, what: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| AppError::Internal(format!("{what} timed out after {deadline:?}")))?
}

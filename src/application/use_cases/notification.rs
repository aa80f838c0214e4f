use std::sync::Arc;

use async_trait::async_trait;
use time::Duration;
use tracing::{error, info, instrument, warn};

use crate::app_error::AppResult;
use crate::application::email_templates::{login_alert_email, login_code_email, welcome_email};
use crate::domain::entities::notification::{NotificationPayload, NotificationTask};

const MAX_RETRY_DELAY_SECS: i64 = 300;

// ============================================================================
// Ports
// ============================================================================

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

/// Worker side of the notification queue.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Removes and returns up to `max` ready tasks.
    async fn claim(&self, max: usize) -> AppResult<Vec<NotificationTask>>;
    /// Parks `task` until `delay` has passed.
    async fn schedule_retry(&self, task: &NotificationTask, delay: Duration) -> AppResult<()>;
    /// Moves parked tasks whose delay has passed back to the ready queue.
    async fn promote_due(&self) -> AppResult<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Retrying { attempt: u32, delay: Duration },
    Abandoned,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct NotificationUseCases {
    queue: Arc<dyn NotificationQueue>,
    sender: Arc<dyn EmailSender>,
    app_origin: String,
    max_retry: u32,
}

impl NotificationUseCases {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        sender: Arc<dyn EmailSender>,
        app_origin: String,
        max_retry: u32,
    ) -> Self {
        Self {
            queue,
            sender,
            app_origin,
            max_retry,
        }
    }

    pub async fn claim_pending(&self, max: usize) -> AppResult<Vec<NotificationTask>> {
        self.queue.claim(max).await
    }

    pub async fn promote_due_retries(&self) -> AppResult<usize> {
        self.queue.promote_due().await
    }

    /// Subject and HTML body for a task.
    pub fn render(&self, task: &NotificationTask) -> (String, String) {
        match &task.payload {
            NotificationPayload::Welcome { code } => {
                welcome_email(&self.app_origin, &task.name, code)
            }
            NotificationPayload::LoginCode { code } => {
                login_code_email(&self.app_origin, &task.name, code)
            }
            NotificationPayload::LoginAlert { location, device } => {
                login_alert_email(&self.app_origin, &task.name, location, device)
            }
        }
    }

    /// Sends one task. Failures are parked for a retry until the retry budget
    /// is spent, then dropped with an error log.
    #[instrument(skip(self, task), fields(task_id = %task.id, kind = %task.kind(), attempt = task.attempt))]
    pub async fn deliver(&self, task: &NotificationTask) -> AppResult<DeliveryOutcome> {
        let (subject, html) = self.render(task);

        let err = match self.sender.send(&task.to, &subject, &html).await {
            Ok(()) => {
                info!("Notification sent");
                return Ok(DeliveryOutcome::Sent);
            }
            Err(e) => e,
        };

        if task.attempt >= self.max_retry {
            error!(error = %err, "Notification abandoned after exhausting retries");
            return Ok(DeliveryOutcome::Abandoned);
        }

        let next = task.next_attempt();
        let delay = retry_delay(next.attempt);
        warn!(error = %err, retry_in_secs = delay.whole_seconds(), "Notification failed, retrying");
        self.queue.schedule_retry(&next, delay).await?;

        Ok(DeliveryOutcome::Retrying {
            attempt: next.attempt,
            delay,
        })
    }
}

/// `2^attempt` seconds, capped at five minutes.
pub fn retry_delay(attempt: u32) -> Duration {
    let secs = 2i64
        .checked_pow(attempt)
        .unwrap_or(MAX_RETRY_DELAY_SECS)
        .min(MAX_RETRY_DELAY_SECS);
    Duration::seconds(secs)
}

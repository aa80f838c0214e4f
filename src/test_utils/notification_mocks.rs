//! In-memory mocks for the notification worker side.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use time::Duration;
use tokio::time::Instant;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        auth::NotificationDispatcher,
        notification::{EmailSender, NotificationQueue},
    },
    domain::entities::notification::NotificationTask,
};

/// In-memory notification queue with a ready list and a parked retry set.
/// Serves both the request path (enqueue) and the worker (claim/retry).
/// `promote_due` mirrors `PROMOTE_SCRIPT` in `infra::notification_queue`:
/// entries whose score is due move to the ready list, the rest stay parked.
#[derive(Default)]
pub struct InMemoryNotificationQueue {
    ready: Mutex<VecDeque<NotificationTask>>,
    parked: Mutex<Vec<(Instant, NotificationTask)>>,
}

impl InMemoryNotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks waiting to be claimed.
    pub fn pending(&self) -> usize {
        self.ready.lock().unwrap().len()
    }

    /// Tasks waiting for their retry delay.
    pub fn parked(&self) -> usize {
        self.parked.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryNotificationQueue {
    async fn enqueue(&self, task: NotificationTask) -> AppResult<()> {
        self.ready.lock().unwrap().push_back(task);
        Ok(())
    }
}

#[async_trait]
impl NotificationQueue for InMemoryNotificationQueue {
    async fn claim(&self, max: usize) -> AppResult<Vec<NotificationTask>> {
        let mut ready = self.ready.lock().unwrap();
        let n = max.min(ready.len());
        Ok(ready.drain(..n).collect())
    }

    async fn schedule_retry(&self, task: &NotificationTask, delay: Duration) -> AppResult<()> {
        let due = Instant::now() + delay.unsigned_abs();
        self.parked.lock().unwrap().push((due, task.clone()));
        Ok(())
    }

    async fn promote_due(&self) -> AppResult<usize> {
        let now = Instant::now();
        let mut parked = self.parked.lock().unwrap();
        let (due, waiting): (Vec<_>, Vec<_>) = parked.drain(..).partition(|(at, _)| *at <= now);
        *parked = waiting;

        let count = due.len();
        self.ready
            .lock()
            .unwrap()
            .extend(due.into_iter().map(|(_, task)| task));
        Ok(count)
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email sender that records messages. `failing()` builds one that rejects
/// every send.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    failing: bool,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        if self.failing {
            return Err(AppError::Internal("email provider rejected the message".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

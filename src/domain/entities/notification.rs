use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Welcome,
    LoginCode,
    LoginAlert,
}

/// Kind-specific content of an email notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// Sent on registration; carries the email verification code.
    Welcome { code: String },
    /// Sent when a passwordless login is requested.
    LoginCode { code: String },
    /// Security alert sent after a successful login.
    LoginAlert { location: String, device: String },
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::Welcome { .. } => NotificationKind::Welcome,
            NotificationPayload::LoginCode { .. } => NotificationKind::LoginCode,
            NotificationPayload::LoginAlert { .. } => NotificationKind::LoginAlert,
        }
    }
}

/// A queued email delivery. `attempt` counts failed deliveries so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTask {
    pub id: Uuid,
    pub to: String,
    pub name: String,
    #[serde(flatten)]
    pub payload: NotificationPayload,
    #[serde(default)]
    pub attempt: u32,
}

impl NotificationTask {
    pub fn new(to: &str, name: &str, payload: NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            to: to.to_string(),
            name: name.to_string(),
            payload,
            attempt: 0,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }

    /// The same task, marked as having failed one more time.
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }
}

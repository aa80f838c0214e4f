use std::sync::Arc;

use crate::{
    application::use_cases::{
        account::AccountUseCases, auth::AuthUseCases, notification::NotificationUseCases,
    },
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub account_use_cases: Arc<AccountUseCases>,
    pub notification_use_cases: Arc<NotificationUseCases>,
}

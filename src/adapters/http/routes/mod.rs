pub mod health;
pub mod tokens;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::{
    adapters::http::app_state::AppState, application::jwt::TokenPair,
    domain::entities::account::Account,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/tokens", tokens::router())
}

#[derive(Serialize)]
pub(crate) struct UserEnvelope {
    pub user: Account,
}

#[derive(Serialize)]
pub(crate) struct LoginEnvelope {
    pub user: Account,
    pub token_pair: TokenPair,
}

#[derive(Serialize)]
pub(crate) struct TokenPairEnvelope {
    pub token_pair: TokenPair,
}

#[derive(Serialize)]
pub(crate) struct MessageEnvelope {
    pub message: &'static str,
}

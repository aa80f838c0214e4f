//! Account routes: registration, verification, login completion, profile.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, patch, post},
};
use axum_extra::extract::WithRejection;

use crate::{
    adapters::http::{
        app_state::AppState,
        middleware::{AccessSession, ClientInfo},
        routes::{LoginEnvelope, MessageEnvelope, UserEnvelope},
    },
    app_error::{AppError, AppResult},
    application::use_cases::{
        account::UpdateProfileInput,
        auth::{CodeInput, RegisterInput},
    },
};

/// POST /v1/users/register
async fn register(
    State(app_state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<RegisterInput>, AppError>,
) -> AppResult<Json<UserEnvelope>> {
    let user = app_state.auth_use_cases.register(input).await?;
    Ok(Json(UserEnvelope { user }))
}

/// POST /v1/users/verify
async fn verify(
    State(app_state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CodeInput>, AppError>,
) -> AppResult<Json<UserEnvelope>> {
    let user = app_state.auth_use_cases.verify_email(input).await?;
    Ok(Json(UserEnvelope { user }))
}

/// POST /v1/users/login
/// Redeems a login code for an access/refresh pair.
async fn login(
    State(app_state): State<AppState>,
    ClientInfo(client): ClientInfo,
    WithRejection(Json(input), _): WithRejection<Json<CodeInput>, AppError>,
) -> AppResult<Json<LoginEnvelope>> {
    let outcome = app_state
        .auth_use_cases
        .complete_login(input, client)
        .await?;
    Ok(Json(LoginEnvelope {
        user: outcome.account,
        token_pair: outcome.tokens,
    }))
}

/// POST /v1/users/logout
async fn logout(
    State(app_state): State<AppState>,
    AccessSession(auth): AccessSession,
) -> AppResult<Json<MessageEnvelope>> {
    app_state.auth_use_cases.logout(&auth).await?;
    Ok(Json(MessageEnvelope {
        message: "logged out successfully",
    }))
}

/// GET /v1/users/me
async fn me(
    State(app_state): State<AppState>,
    AccessSession(auth): AccessSession,
) -> AppResult<Json<UserEnvelope>> {
    let user = app_state
        .account_use_cases
        .get_profile(auth.account_id)
        .await?;
    Ok(Json(UserEnvelope { user }))
}

/// PATCH /v1/users/update
async fn update(
    State(app_state): State<AppState>,
    AccessSession(auth): AccessSession,
    WithRejection(Json(input), _): WithRejection<Json<UpdateProfileInput>, AppError>,
) -> AppResult<Json<UserEnvelope>> {
    let user = app_state
        .account_use_cases
        .update_profile(auth.account_id, input)
        .await?;
    Ok(Json(UserEnvelope { user }))
}

/// DELETE /v1/users/delete
async fn delete_account(
    State(app_state): State<AppState>,
    AccessSession(auth): AccessSession,
) -> AppResult<Json<MessageEnvelope>> {
    app_state
        .account_use_cases
        .delete_account(auth.account_id)
        .await?;
    Ok(Json(MessageEnvelope {
        message: "user deleted successfully",
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/update", patch(update))
        .route("/delete", delete(delete_account))
}

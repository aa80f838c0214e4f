use axum::{Json, Router, extract::State, routing::post};
use axum_extra::extract::WithRejection;

use crate::{
    adapters::http::{
        app_state::AppState,
        middleware::RefreshSession,
        routes::{TokenPairEnvelope, UserEnvelope},
    },
    app_error::{AppError, AppResult},
    application::use_cases::auth::EmailInput,
};

/// POST /v1/tokens/login
/// Mails a login code to a registered address.
async fn request_login(
    State(app_state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<EmailInput>, AppError>,
) -> AppResult<Json<UserEnvelope>> {
    let user = app_state.auth_use_cases.request_login_code(input).await?;
    Ok(Json(UserEnvelope { user }))
}

/// POST /v1/tokens/refresh
/// Trades a refresh token for a new pair. The presented token is revoked.
async fn refresh(
    State(app_state): State<AppState>,
    RefreshSession(auth): RefreshSession,
) -> AppResult<Json<TokenPairEnvelope>> {
    let token_pair = app_state.auth_use_cases.refresh(&auth).await?;
    Ok(Json(TokenPairEnvelope { token_pair }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(request_login))
        .route("/refresh", post(refresh))
}

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, header::USER_AGENT, request::Parts},
};

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppError,
    application::use_cases::auth::{AuthenticatedRequest, ClientContext},
    domain::entities::token_kind::TokenKind,
};

/// A verified access token. Handlers that take this run only for live sessions.
pub struct AccessSession(pub AuthenticatedRequest);

/// A verified refresh token, for the rotation endpoint only.
pub struct RefreshSession(pub AuthenticatedRequest);

impl FromRequestParts<AppState> for AccessSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = state
            .auth_use_cases
            .authenticate(bearer_token(&parts.headers), TokenKind::Access)
            .await?;
        Ok(AccessSession(auth))
    }
}

impl FromRequestParts<AppState> for RefreshSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = state
            .auth_use_cases
            .authenticate(bearer_token(&parts.headers), TokenKind::Refresh)
            .await?;
        Ok(RefreshSession(auth))
    }
}

/// Requester address and user agent, for login alerts.
pub struct ClientInfo(pub ClientContext);

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let connect_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        // Only trust forwarded headers if explicitly configured (when behind a reverse proxy)
        let forwarded = if state.config.trust_proxy {
            forwarded_ip(&parts.headers)
        } else {
            None
        };

        let ip = forwarded
            .or(connect_ip)
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            trust_proxy = state.config.trust_proxy,
            connect_ip = ?connect_ip,
            using_ip = %ip,
            "Resolved client address"
        );

        Ok(ClientInfo(ClientContext { ip, user_agent }))
    }
}

/// `Authorization: Bearer <token>`. The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // Extract IP from X-Forwarded-For or X-Real-IP headers
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
        && let Ok(ip) = first.trim().parse()
    {
        return Some(ip);
    }
    if let Some(real) = headers.get("x-real-ip")
        && let Ok(val) = real.to_str()
        && let Ok(ip) = val.trim().parse()
    {
        return Some(ip);
    }
    None
}

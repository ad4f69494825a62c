/**
 * Authentication Routes
 * Single-admin login, logout and session lookup
 */
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::{self, AdminSession, ClientIp},
    error::AppError,
    state::SharedState,
};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: AdminSession,
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.login_limiter.check(&ip).await {
        tracing::warn!(ip = %ip, "Login rate limited");
        return Err(AppError::RateLimited);
    }

    let email = payload.email.trim().to_lowercase();
    let payload = LoginRequest {
        email,
        password: payload.password,
    };
    payload.validate()?;

    let config = &state.config;
    let email_matches = payload.email == config.admin_email.trim().to_lowercase();
    let password_ok =
        auth::verify_password(payload.password, config.admin_password_hash.clone()).await;

    if !(email_matches && password_ok) {
        tracing::warn!(ip = %ip, "Failed admin login attempt");
        return Err(AppError::Unauthenticated);
    }

    let (token, expires_at) = auth::issue_token(config, &config.admin_email).map_err(|e| {
        tracing::error!("Failed to create session token: {}", e);
        AppError::Store("failed to create session".to_string())
    })?;
    state.login_limiter.reset(&ip).await;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = auth::session_cookie(
        &token,
        config.session_ttl_minutes * 60,
        config.secure_cookies(),
    ) {
        headers.insert(header::SET_COOKIE, cookie);
    }

    tracing::info!(email = %config.admin_email, "Admin logged in");
    Ok((
        headers,
        Json(LoginResponse {
            success: true,
            user: AdminSession {
                email: config.admin_email.clone(),
                role: "admin".to_string(),
                expires_at,
            },
            access_token: token,
        }),
    ))
}

/// POST /api/auth/logout
/// Tokens are stateless; logging out drops the cookie.
pub async fn logout(State(state): State<SharedState>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        auth::clear_session_cookie(state.config.secure_cookies()),
    );
    (headers, Json(LogoutResponse { success: true }))
}

/// GET /api/auth/session
pub async fn session(session: AdminSession) -> Json<AdminSession> {
    Json(session)
}

/**
 * Admin sessions
 * HS256 JWT carried in an HttpOnly cookie (or a bearer header), plus the
 * per-IP login limiter
 */
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{config::Config, error::AppError, state::SharedState};

pub const SESSION_COOKIE: &str = "session";
const ADMIN_ROLE: &str = "admin";

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // Admin email
    pub role: String, // Always "admin"
    pub exp: i64,     // Expiry timestamp
    pub iat: i64,     // Issued at timestamp
}

/// Issues a session token for the admin. Returns the token and its expiry.
pub fn issue_token(config: &Config, email: &str) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = (now + Duration::minutes(config.session_ttl_minutes)).timestamp();

    let claims = Claims {
        sub: email.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp,
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok((token, exp))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Checks a password against a bcrypt hash on the blocking pool.
pub async fn verify_password(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            tracing::error!("Password verification failed: {}", e);
            false
        }
        Err(e) => {
            tracing::error!("spawn_blocking panic during verify: {}", e);
            false
        }
    }
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k == name {
                return Some(v.to_string());
            }
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}{secure}"
    ))
    .ok()
}

pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// An authenticated admin. Resolving it is the first thing every admin
/// handler does; nothing touches the store before it succeeds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub email: String,
    pub role: String,
    pub expires_at: i64,
}

impl AdminSession {
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Result<Self, AppError> {
        let token = parse_cookie(headers, SESSION_COOKIE)
            .filter(|t| !t.is_empty())
            .or_else(|| bearer_token(headers))
            .ok_or(AppError::Unauthenticated)?;

        let claims = verify_token(secret, &token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AppError::Unauthenticated
        })?;
        if claims.role != ADMIN_ROLE {
            return Err(AppError::Unauthenticated);
        }

        Ok(Self {
            email: claims.sub,
            role: claims.role,
            expires_at: claims.exp,
        })
    }
}

impl FromRequestParts<SharedState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers, &state.config.jwt_secret)
    }
}

/// Caller address used to key the login limiter. `x-forwarded-for` only
/// counts when the socket peer is a configured proxy.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

/// Walks `x-forwarded-for` from the nearest hop, skipping trusted proxies.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }

    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .find(|ip| !trusted.contains(ip))
        .unwrap_or(peer)
        .to_string()
}

impl FromRequestParts<SharedState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(resolve_client_ip(
            &parts.headers,
            peer,
            &state.config.trusted_proxies,
        )))
    }
}

// ============================================================================
// Login rate limiting
// ============================================================================

/// Allows `max_attempts` login attempts per IP within a sliding window.
pub struct LoginLimiter {
    max_attempts: usize,
    window_secs: i64,
    attempts: RwLock<HashMap<String, Vec<i64>>>,
}

impl LoginLimiter {
    pub fn new(max_attempts: u32, window_secs: i64) -> Self {
        Self {
            max_attempts: max_attempts.max(1) as usize,
            window_secs: window_secs.max(1),
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Records an attempt and reports whether it is allowed.
    pub async fn check(&self, ip: &str) -> bool {
        self.check_at(ip, Utc::now().timestamp()).await
    }

    async fn check_at(&self, ip: &str, now: i64) -> bool {
        let mut attempts = self.attempts.write().await;

        // Evict expired attempts so memory tracks active IPs only.
        attempts.retain(|_, stamps| {
            stamps.retain(|t| now - *t < self.window_secs);
            !stamps.is_empty()
        });

        let stamps = attempts.entry(ip.to_string()).or_default();
        if stamps.len() >= self.max_attempts {
            return false;
        }
        stamps.push(now);
        true
    }

    pub async fn reset(&self, ip: &str) {
        self.attempts.write().await.remove(ip);
    }
}

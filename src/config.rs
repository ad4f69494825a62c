//! Runtime configuration loaded from the environment (and `.env` via dotenvy).

use std::{env, fmt::Display, net::IpAddr, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEV_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set to a secure, unique value in production")]
    InsecureInProduction(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to hash admin password: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,

    /// Caller-scoped connection string; row policies apply.
    pub database_url: Option<String>,
    /// Service-role connection string; bypasses row policies.
    pub service_database_url: Option<String>,

    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
    pub admin_email: String,
    pub admin_password_hash: String,
    pub login_max_attempts: u32,
    pub login_window_secs: i64,
    /// Peers allowed to set `X-Forwarded-For`; empty means trust no one.
    pub trusted_proxies: Vec<IpAddr>,

    pub upload_dir: PathBuf,
    pub page_cache_ttl_secs: u64,

    pub site_url: String,
    pub site_title: String,
    pub site_title_ar: String,

    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,

    pub newsletter_api_url: Option<String>,
    pub newsletter_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            environment: "development".to_string(),
            database_url: None,
            service_database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl_minutes: 12 * 60,
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password_hash: String::new(),
            login_max_attempts: 5,
            login_window_secs: 60,
            trusted_proxies: Vec::new(),
            upload_dir: PathBuf::from("public/uploads"),
            page_cache_ttl_secs: 3600,
            site_url: "http://localhost:3001".to_string(),
            site_title: "Sentinel Cyber Security".to_string(),
            site_title_ar: "سنتينل للأمن السيبراني".to_string(),
            email_api_url: None,
            email_api_key: None,
            email_from: "Sentinel <no-reply@example.com>".to_string(),
            newsletter_api_url: None,
            newsletter_api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let environment = try_load("ENVIRONMENT", defaults.environment);
        let is_production = environment == "production";

        let jwt_secret = optional("JWT_SECRET").unwrap_or(defaults.jwt_secret);
        let admin_email = optional("ADMIN_EMAIL").unwrap_or(defaults.admin_email);
        if is_production {
            production_guard(&jwt_secret, &admin_email)?;
        }

        let admin_password_hash = match (optional("ADMIN_PASSWORD_HASH"), optional("ADMIN_PASSWORD")) {
            (Some(hash), _) => hash,
            (None, Some(plain)) => bcrypt::hash(plain, bcrypt::DEFAULT_COST)?,
            (None, None) if is_production => {
                return Err(ConfigError::InsecureInProduction("ADMIN_PASSWORD_HASH"));
            }
            (None, None) => {
                warn!(
                    "Neither ADMIN_PASSWORD_HASH nor ADMIN_PASSWORD is set; \
                     using the development password '{DEV_ADMIN_PASSWORD}'"
                );
                bcrypt::hash(DEV_ADMIN_PASSWORD, bcrypt::DEFAULT_COST)?
            }
        };

        Ok(Self {
            host: try_load("HOST", defaults.host),
            port: try_parse("PORT", defaults.port)?,
            environment,
            database_url: optional("DATABASE_URL"),
            service_database_url: optional("SERVICE_DATABASE_URL"),
            jwt_secret,
            session_ttl_minutes: try_parse("SESSION_TTL_MINUTES", defaults.session_ttl_minutes)?,
            admin_email,
            admin_password_hash,
            login_max_attempts: try_parse("LOGIN_MAX_ATTEMPTS", defaults.login_max_attempts)?,
            login_window_secs: try_parse("LOGIN_WINDOW_SECS", defaults.login_window_secs)?,
            trusted_proxies: parse_ip_list(
                "TRUSTED_PROXIES",
                optional("TRUSTED_PROXIES").as_deref().unwrap_or(""),
            )?,
            upload_dir: optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            page_cache_ttl_secs: try_parse("PAGE_CACHE_TTL_SECS", defaults.page_cache_ttl_secs)?,
            site_url: try_load("SITE_URL", defaults.site_url),
            site_title: try_load("SITE_TITLE", defaults.site_title),
            site_title_ar: try_load("SITE_TITLE_AR", defaults.site_title_ar),
            email_api_url: optional("EMAIL_API_URL"),
            email_api_key: optional("EMAIL_API_KEY"),
            email_from: try_load("EMAIL_FROM", defaults.email_from),
            newsletter_api_url: optional("NEWSLETTER_API_URL"),
            newsletter_api_key: optional("NEWSLETTER_API_KEY"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// `Secure` cookies break plain-http local development.
    pub fn secure_cookies(&self) -> bool {
        self.is_production()
    }
}

/// Defaults that are fine locally but must not reach production.
fn production_guard(jwt_secret: &str, admin_email: &str) -> Result<(), ConfigError> {
    if jwt_secret.is_empty() || jwt_secret == DEFAULT_JWT_SECRET {
        return Err(ConfigError::InsecureInProduction("JWT_SECRET"));
    }
    if admin_email.trim().is_empty() || admin_email == DEFAULT_ADMIN_EMAIL {
        return Err(ConfigError::InsecureInProduction("ADMIN_EMAIL"));
    }
    Ok(())
}

fn parse_ip_list(key: &'static str, raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load(key: &str, default: String) -> String {
    optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default
    })
}

fn try_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

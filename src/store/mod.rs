//! Content store: the client every handler uses to reach the three content tables.
//!
//! The store handle is built once at startup by [`StoreAccess::connect`] and
//! injected through axum state. Connection is two-tier: a privileged
//! (service-role) client that bypasses row policies is preferred, and a
//! caller-scoped client is the logged fallback. Which one is in use is always
//! visible through [`StoreAccess::mode`]. Without any database URL an
//! in-process [`MemoryStore`] is used.

pub mod memory;
pub mod postgres;

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{
    self,
    models::{BlogPost, ContactMessage, NewBlogPost, NewContactMessage, NewService, Service},
    DbConfig,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(db_err.message().to_string()),
                Some("42501") => StoreError::PermissionDenied(db_err.message().to_string()),
                _ => StoreError::Backend(err.to_string()),
            },
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreSetupError {
    #[error("privileged store client unavailable and no scoped DATABASE_URL configured: {0}")]
    NoFallback(sqlx::Error),

    #[error("failed to connect scoped store client: {0}")]
    Connect(#[from] sqlx::Error),
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Asc),
            "desc" | "descending" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A sortable column from a fixed allow-list.
pub trait SortKey: Copy + Default + fmt::Debug + Send + Sync + 'static {
    fn column(self) -> &'static str;
    /// Accepts both `createdAt` and `created_at` spellings.
    fn parse(raw: &str) -> Option<Self>;
}

macro_rules! sort_key {
    ($name:ident { $($variant:ident => $column:literal, $camel:literal;)+ } default $default:ident) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub enum $name {
            #[default]
            $default,
            $($variant,)+
        }

        impl SortKey for $name {
            fn column(self) -> &'static str {
                match self {
                    $name::$default => "created_at",
                    $($name::$variant => $column,)+
                }
            }

            #[allow(unreachable_patterns)]
            fn parse(raw: &str) -> Option<Self> {
                match raw {
                    "created_at" | "createdAt" => Some($name::$default),
                    $($column | $camel => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

sort_key!(PostSort {
    UpdatedAt => "updated_at", "updatedAt";
    PublishedAt => "published_at", "publishedAt";
    Title => "title", "title";
} default CreatedAt);

sort_key!(ServiceSort {
    UpdatedAt => "updated_at", "updatedAt";
    Title => "title", "title";
} default CreatedAt);

sort_key!(MessageSort {
    Name => "name", "name";
    Email => "email", "email";
    Read => "read", "read";
    Replied => "replied", "replied";
} default CreatedAt);

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ListQuery<S> {
    /// `published` for posts, `read` for messages; ignored for services.
    pub filter: Option<bool>,
    pub sort: S,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl<S: SortKey> Default for ListQuery<S> {
    fn default() -> Self {
        Self {
            filter: None,
            sort: S::default(),
            order: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<S: SortKey> ListQuery<S> {
    /// Builds a query from raw request parameters, clamping paging and
    /// falling back to defaults for sort fields outside the allow-list.
    pub fn from_params(
        filter: Option<bool>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Self {
        let sort = match sort_by {
            Some(raw) => S::parse(raw).unwrap_or_else(|| {
                tracing::debug!(sort_by = %raw, "sort column not allowed, using default");
                S::default()
            }),
            None => S::default(),
        };
        Self {
            filter,
            sort,
            order: sort_order.and_then(SortOrder::parse).unwrap_or_default(),
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new<S>(items: Vec<T>, total: i64, query: &ListQuery<S>) -> Self {
        let limit = i64::from(query.limit.max(1));
        Self {
            items,
            total,
            page: query.page,
            limit: query.limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

// ============================================================================
// Store trait
// ============================================================================

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn ping(&self) -> Result<Duration, StoreError>;

    async fn list_posts(&self, query: &ListQuery<PostSort>) -> Result<Page<BlogPost>, StoreError>;
    async fn find_post(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError>;
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError>;
    async fn insert_post(&self, post: NewBlogPost) -> Result<BlogPost, StoreError>;
    /// Overwrites every mutable column of the row with `post.id`.
    async fn save_post(&self, post: &BlogPost) -> Result<BlogPost, StoreError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_services(&self, query: &ListQuery<ServiceSort>) -> Result<Page<Service>, StoreError>;
    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, StoreError>;
    async fn insert_service(&self, service: NewService) -> Result<Service, StoreError>;
    async fn save_service(&self, service: &Service) -> Result<Service, StoreError>;
    async fn delete_service(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_messages(
        &self,
        query: &ListQuery<MessageSort>,
    ) -> Result<Page<ContactMessage>, StoreError>;
    async fn find_message(&self, id: Uuid) -> Result<Option<ContactMessage>, StoreError>;
    async fn insert_message(&self, message: NewContactMessage) -> Result<ContactMessage, StoreError>;
    async fn save_message(&self, message: &ContactMessage) -> Result<ContactMessage, StoreError>;
    async fn delete_message(&self, id: Uuid) -> Result<bool, StoreError>;
}

// ============================================================================
// Access tiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Service-role credential; row policies bypassed.
    Privileged,
    /// Caller-level credential; row policies may reject operations.
    Scoped,
    /// No database configured.
    Memory,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Privileged => write!(f, "privileged"),
            AccessMode::Scoped => write!(f, "scoped"),
            AccessMode::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone)]
pub struct StoreAccess {
    mode: AccessMode,
    store: Arc<dyn ContentStore>,
}

impl StoreAccess {
    pub fn new(mode: AccessMode, store: Arc<dyn ContentStore>) -> Self {
        Self { mode, store }
    }

    pub fn memory() -> Self {
        Self::new(AccessMode::Memory, Arc::new(MemoryStore::default()))
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// Builds the store handle: privileged first, scoped as fallback, memory
    /// when no database is configured at all.
    pub async fn connect(config: &Config, db_config: &DbConfig) -> Result<Self, StoreSetupError> {
        let mut privileged_error = None;

        match &config.service_database_url {
            Some(url) => match db::connect(url, db_config).await {
                Ok(pool) => {
                    if let Err(e) = db::run_migrations(&pool).await {
                        tracing::error!("Failed to run database migrations: {}", e);
                    }
                    tracing::info!(mode = %AccessMode::Privileged, "Store client ready");
                    return Ok(Self::new(
                        AccessMode::Privileged,
                        Arc::new(PgStore::new(pool, AccessMode::Privileged)),
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Privileged store client unavailable, falling back to scoped client"
                    );
                    privileged_error = Some(e);
                }
            },
            None if config.database_url.is_some() => {
                tracing::warn!(
                    "SERVICE_DATABASE_URL not set; admin operations run with caller-scoped \
                     permissions and may be rejected by row policies"
                );
            }
            None => {}
        }

        match (&config.database_url, privileged_error) {
            (Some(url), _) => {
                let pool = db::connect(url, db_config).await?;
                tracing::warn!(mode = %AccessMode::Scoped, "Store client ready in degraded mode");
                Ok(Self::new(
                    AccessMode::Scoped,
                    Arc::new(PgStore::new(pool, AccessMode::Scoped)),
                ))
            }
            (None, Some(e)) => Err(StoreSetupError::NoFallback(e)),
            (None, None) => {
                tracing::info!("DATABASE_URL not set. Running with the in-memory store.");
                Ok(Self::memory())
            }
        }
    }
}

//! Render cache for public pages.
//!
//! Entries are keyed by request path and language. They are dropped when an
//! admin mutation (or an explicit revalidate call) names them, and expire on
//! their own after the configured TTL.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::sync::RwLock;

use super::i18n::Lang;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevalidateError {
    #[error("path must start with '/'")]
    InvalidPath,
}

/// A set of cached public pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Exact(String),
    Prefix(String),
    All,
}

impl Target {
    fn matches(&self, path: &str) -> bool {
        match self {
            Target::Exact(p) => p == path,
            Target::Prefix(p) => path.starts_with(p.as_str()),
            Target::All => true,
        }
    }
}

/// Maps a revalidation path to the public pages it covers. Admin paths map to
/// their public counterparts.
pub fn targets_for(path: &str) -> Result<Vec<Target>, RevalidateError> {
    let path = path.split('?').next().unwrap_or_default().trim();
    if !path.starts_with('/') {
        return Err(RevalidateError::InvalidPath);
    }
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    let targets = if path == "/admin" {
        vec![Target::All]
    } else if path.starts_with("/admin/blog") {
        vec![
            Target::Exact("/blog".into()),
            Target::Prefix("/blog/".into()),
            Target::Exact("/".into()),
            Target::Exact("/rss.xml".into()),
        ]
    } else if path.starts_with("/admin/services") {
        vec![Target::Exact("/services".into()), Target::Exact("/".into())]
    } else if path.starts_with("/admin/messages") {
        Vec::new()
    } else if path.starts_with("/admin/") {
        vec![Target::All]
    } else {
        vec![Target::Exact(path.to_string())]
    };
    Ok(targets)
}

struct CachedPage {
    body: String,
    rendered_at: Instant,
}

pub struct PageCache {
    ttl: Duration,
    entries: RwLock<HashMap<(String, Lang), CachedPage>>,
    /// Bumped by every invalidation that names at least one target.
    generation: AtomicU64,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Read before loading the data a page is rendered from; pass it back to
    /// `insert`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn get(&self, path: &str, lang: Lang) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(&(path.to_string(), lang))
            .filter(|page| page.rendered_at.elapsed() < self.ttl)
            .map(|page| page.body.clone())
    }

    /// Stores a render unless an invalidation ran since `seen_generation`,
    /// in which case the render may predate the write and is dropped.
    pub async fn insert(&self, path: &str, lang: Lang, body: String, seen_generation: u64) -> bool {
        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) != seen_generation {
            tracing::debug!(path = %path, "Skipping cache insert for a render older than the last invalidation");
            return false;
        }
        entries.insert(
            (path.to_string(), lang),
            CachedPage {
                body,
                rendered_at: Instant::now(),
            },
        );
        true
    }

    pub async fn invalidate(&self, targets: &[Target]) -> usize {
        if targets.is_empty() {
            return 0;
        }
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|(path, _), _| !targets.iter().any(|t| t.matches(path)));
        before - entries.len()
    }

    /// Marks every cached page covered by `path` stale. Returns how many
    /// entries were dropped.
    pub async fn revalidate(&self, path: &str) -> Result<usize, RevalidateError> {
        let targets = targets_for(path)?;
        let dropped = self.invalidate(&targets).await;
        tracing::debug!(path = %path, ?targets, dropped, "Pages revalidated");
        Ok(dropped)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

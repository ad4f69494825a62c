use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::Serialize;
use thiserror::Error;

use crate::{
    auth::LoginLimiter,
    config::Config,
    mailer::{self, MailError, Mailer},
    media::MediaStore,
    newsletter::{NewsletterClient, NewsletterError},
    site::{PageCache, SiteMeta},
    store::StoreAccess,
};

pub type SharedState = Arc<AppState>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Newsletter(#[from] NewsletterError),
}

/// Failures that are hidden from the visitor but must reach operators.
#[derive(Debug, Default)]
pub struct OpsCounters {
    contact_store_failures: AtomicU64,
    revalidation_failures: AtomicU64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpsSnapshot {
    pub contact_store_failures: u64,
    pub revalidation_failures: u64,
}

impl OpsCounters {
    pub fn contact_store_failed(&self) -> u64 {
        self.contact_store_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn revalidation_failed(&self) -> u64 {
        self.revalidation_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> OpsSnapshot {
        OpsSnapshot {
            contact_store_failures: self.contact_store_failures.load(Ordering::Relaxed),
            revalidation_failures: self.revalidation_failures.load(Ordering::Relaxed),
        }
    }
}

pub struct AppState {
    pub config: Config,
    pub store: StoreAccess,
    pub pages: PageCache,
    pub media: MediaStore,
    pub mailer: Arc<dyn Mailer>,
    pub newsletter: NewsletterClient,
    pub login_limiter: LoginLimiter,
    pub ops: OpsCounters,
    pub site: SiteMeta,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: StoreAccess) -> Result<SharedState, StateError> {
        let mailer: Arc<dyn Mailer> = Arc::from(mailer::from_config(&config)?);
        let newsletter = NewsletterClient::from_config(&config)?;
        Ok(Self::with_parts(config, store, mailer, newsletter))
    }

    pub fn with_parts(
        config: Config,
        store: StoreAccess,
        mailer: Arc<dyn Mailer>,
        newsletter: NewsletterClient,
    ) -> SharedState {
        let site = SiteMeta {
            title: config.site_title.clone(),
            title_ar: config.site_title_ar.clone(),
            url: config.site_url.trim_end_matches('/').to_string(),
        };

        Arc::new(Self {
            pages: PageCache::new(Duration::from_secs(config.page_cache_ttl_secs)),
            media: MediaStore::new(config.upload_dir.clone()),
            login_limiter: LoginLimiter::new(config.login_max_attempts, config.login_window_secs),
            ops: OpsCounters::default(),
            started_at: Instant::now(),
            site,
            mailer,
            newsletter,
            store,
            config,
        })
    }

    /// Invalidates the public pages behind an admin path after a committed
    /// mutation. Failure never undoes the mutation.
    pub async fn revalidate_after_write(&self, admin_path: &str) {
        match self.pages.revalidate(admin_path).await {
            Ok(dropped) => {
                tracing::debug!(path = %admin_path, dropped, "Revalidated after admin write");
            }
            Err(e) => {
                let total = self.ops.revalidation_failed();
                tracing::warn!(path = %admin_path, error = %e, total, "Revalidation failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ops_counters_accumulate() {
        let ops = OpsCounters::default();
        assert_eq!(ops.contact_store_failed(), 1);
        assert_eq!(ops.contact_store_failed(), 2);
        let snapshot = ops.snapshot();
        assert_eq!(snapshot.contact_store_failures, 2);
        assert_eq!(snapshot.revalidation_failures, 0);
    }
}

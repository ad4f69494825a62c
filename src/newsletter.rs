use std::time::Duration;

use serde_json::json;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("mailing-list service is not configured")]
    NotConfigured,

    #[error("mailing-list request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mailing-list service returned {0}")]
    Rejected(u16),
}

/// Thin proxy to the third-party mailing-list endpoint.
#[derive(Clone)]
pub struct NewsletterClient {
    client: reqwest::Client,
    endpoint: Option<(String, Option<String>)>,
}

impl NewsletterClient {
    pub fn new(url: Option<String>, api_key: Option<String>) -> Result<Self, NewsletterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: url.map(|u| (u, api_key)),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, NewsletterError> {
        Self::new(
            config.newsletter_api_url.clone(),
            config.newsletter_api_key.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn subscribe(&self, email: &str) -> Result<(), NewsletterError> {
        let (url, key) = self.endpoint.as_ref().ok_or(NewsletterError::NotConfigured)?;

        let mut request = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(&json!({ "email": email }));
        if let Some(key) = key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "newsletter upstream request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "newsletter upstream returned error");
            return Err(NewsletterError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

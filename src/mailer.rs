//! Outbound email through an HTTP email API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::db::models::ContactMessage;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email API returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Posts the email as JSON with a bearer key.
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(url: String, api_key: String) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client, url, api_key })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "email API rejected message");
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = ?email.to, "Email sent");
        Ok(())
    }
}

/// Used when no email API is configured: the email is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::warn!(
            to = ?email.to,
            subject = %email.subject,
            "EMAIL_API_URL not set, email logged instead of sent"
        );
        Ok(())
    }
}

pub fn from_config(config: &Config) -> Result<Box<dyn Mailer>, MailError> {
    match (&config.email_api_url, &config.email_api_key) {
        (Some(url), Some(key)) => Ok(Box::new(HttpMailer::new(url.clone(), key.clone())?)),
        (Some(_), None) => {
            tracing::warn!("EMAIL_API_URL set without EMAIL_API_KEY; replies will only be logged");
            Ok(Box::new(LogMailer))
        }
        _ => Ok(Box::new(LogMailer)),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Reply to a contact message, quoting the original below the answer.
pub fn compose_reply(
    from: &str,
    site_title: &str,
    message: &ContactMessage,
    reply: &str,
) -> OutgoingEmail {
    let subject = match &message.subject {
        Some(subject) => format!("Re: {subject}"),
        None => format!("Re: your message to {site_title}"),
    };

    let text = format!(
        "{reply}\n\n---\n{name} wrote:\n{original}\n",
        name = message.name,
        original = message.message
    );

    let html = format!(
        "<div dir=\"auto\"><p>{reply}</p><hr><p><strong>{name}</strong>:</p><blockquote>{original}</blockquote><p>{site}</p></div>",
        reply = escape(reply).replace('\n', "<br>"),
        name = escape(&message.name),
        original = escape(&message.message).replace('\n', "<br>"),
        site = escape(site_title),
    );

    OutgoingEmail {
        from: from.to_string(),
        to: vec![message.email.clone()],
        subject,
        html,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message() -> ContactMessage {
        ContactMessage {
            id: Uuid::new_v4(),
            name: "Layla <admin>".into(),
            email: "layla@example.com".into(),
            phone: None,
            subject: Some("Pentest quote".into()),
            message: "Need a web app assessment".into(),
            created_at: Utc::now(),
            read: false,
            replied: false,
            reply_content: None,
            replied_at: None,
        }
    }

    #[test]
    fn test_compose_reply_addresses_sender() {
        let email = compose_reply("Ops <ops@example.com>", "Sentinel", &message(), "Sure\nThanks");
        assert_eq!(email.to, vec!["layla@example.com".to_string()]);
        assert_eq!(email.subject, "Re: Pentest quote");
        assert!(email.text.starts_with("Sure\nThanks"));
        assert!(email.html.contains("Sure<br>Thanks"));
        assert!(email.html.contains("Layla &lt;admin&gt;"));
    }

    #[test]
    fn test_without_api_url_uses_log_mailer() {
        assert!(from_config(&Config::default()).is_ok());
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let email = compose_reply("a@b.c", "S", &message(), "ok");
        assert!(LogMailer.send(&email).await.is_ok());
    }
}

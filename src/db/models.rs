//! Database Models - rows of the three content tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Blog post row
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated blog post ready for insertion
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// Service catalog row
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated service ready for insertion
#[derive(Debug, Clone)]
pub struct NewService {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub image: Option<String>,
}

/// Contact message row
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub replied: bool,
    pub reply_content: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
}

/// Public contact submission ready for insertion
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

impl ContactMessage {
    /// Marks the message replied. Replying implies the admin has read it.
    pub fn record_reply(&mut self, reply_content: String, at: DateTime<Utc>) {
        self.replied = true;
        self.read = true;
        self.reply_content = Some(reply_content);
        self.replied_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reply_populates_reply_fields() {
        let now = Utc::now();
        let mut msg = ContactMessage {
            id: Uuid::new_v4(),
            name: "Sara".into(),
            email: "sara@example.com".into(),
            phone: None,
            subject: None,
            message: "Need a penetration test".into(),
            created_at: now,
            read: false,
            replied: false,
            reply_content: None,
            replied_at: None,
        };
        msg.record_reply("We will call you".into(), now);
        assert!(msg.replied);
        assert!(msg.read);
        assert_eq!(msg.reply_content.as_deref(), Some("We will call you"));
        assert_eq!(msg.replied_at, Some(now));
    }
}

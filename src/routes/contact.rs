/**
 * Contact Routes
 * Public contact form and newsletter signup
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{db::models::NewContactMessage, error::AppError, state::SharedState};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(max = 30, message = "Phone number is too long"))]
    pub phone: Option<String>,
    #[validate(length(max = 200, message = "Subject is too long"))]
    pub subject: Option<String>,
    #[serde(default)]
    #[validate(length(min = 10, max = 5000, message = "Message must be at least 10 characters"))]
    pub message: String,
}

impl ContactForm {
    fn normalized(self) -> Self {
        let optional = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(self.phone),
            subject: optional(self.subject),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct NewsletterForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/contact
/// A stored message is best effort from the visitor's point of view: store
/// failures are alerted to operators and the visitor still sees success.
pub async fn submit_contact(
    State(state): State<SharedState>,
    Json(form): Json<ContactForm>,
) -> Result<Json<SubmitResponse>, AppError> {
    let form = form.normalized();
    form.validate()?;

    let message = NewContactMessage {
        name: form.name,
        email: form.email,
        phone: form.phone,
        subject: form.subject,
        message: form.message,
    };

    match state.store.store().insert_message(message).await {
        Ok(stored) => tracing::info!(id = %stored.id, "Contact message received"),
        Err(e) => {
            let failures = state.ops.contact_store_failed();
            tracing::error!(
                target: "ops_alert",
                error = %e,
                mode = %state.store.mode(),
                failures,
                "Contact message could not be stored"
            );
        }
    }

    Ok(Json(SubmitResponse {
        success: true,
        message: "Thank you for your message. We will get back to you soon.".to_string(),
    }))
}

/// POST /api/newsletter
pub async fn subscribe_newsletter(
    State(state): State<SharedState>,
    Json(form): Json<NewsletterForm>,
) -> Result<Json<SubmitResponse>, AppError> {
    let form = NewsletterForm {
        email: form.email.trim().to_lowercase(),
    };
    form.validate()?;

    state.newsletter.subscribe(&form.email).await?;

    tracing::info!("Newsletter subscription forwarded");
    Ok(Json(SubmitResponse {
        success: true,
        message: "Subscribed".to_string(),
    }))
}

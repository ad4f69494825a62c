/**
 * Message Routes
 * Admin inbox for contact messages: list, mark read, delete, reply by email
 */
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::SuccessResponse;
use crate::{
    auth::AdminSession,
    db::models::ContactMessage,
    error::AppError,
    mailer::compose_reply,
    state::SharedState,
    store::{ListQuery, MessageSort},
};

/// Query parameters shared by GET/PATCH/DELETE /api/admin/messages
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageParams {
    pub id: Option<Uuid>,
    pub read: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageUpdate {
    pub read: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub message_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1, max = 10000, message = "Reply content is required"))]
    pub reply_content: String,
}

fn require_id(id: Option<Uuid>) -> Result<Uuid, AppError> {
    id.ok_or_else(|| AppError::field("id", "Message id is required"))
}

async fn load(state: &SharedState, id: Uuid) -> Result<ContactMessage, AppError> {
    state
        .store
        .store()
        .find_message(id)
        .await?
        .ok_or(AppError::NotFound("Message"))
}

/// GET /api/admin/messages
/// With `id`, returns that message; otherwise a filtered, paginated list.
pub async fn get_messages(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<MessageParams>,
) -> Result<Response, AppError> {
    if let Some(id) = params.id {
        return Ok(Json(load(&state, id).await?).into_response());
    }

    let query = ListQuery::<MessageSort>::from_params(
        params.read,
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        params.page,
        params.limit,
    );
    let page = state.store.store().list_messages(&query).await?;
    Ok(Json(page).into_response())
}

/// PATCH /api/admin/messages?id=
pub async fn update_message(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<MessageParams>,
    Json(update): Json<MessageUpdate>,
) -> Result<Json<ContactMessage>, AppError> {
    let id = require_id(params.id)?;
    let mut message = load(&state, id).await?;

    if let Some(read) = update.read {
        // replied messages stay read
        message.read = read || message.replied;
    }
    let message = state.store.store().save_message(&message).await?;
    Ok(Json(message))
}

/// DELETE /api/admin/messages?id=
pub async fn delete_message(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<MessageParams>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = require_id(params.id)?;
    let store = state.store.store();
    if !store.delete_message(id).await? {
        return Err(AppError::NotFound("Message"));
    }
    if store.find_message(id).await?.is_some() {
        tracing::error!(id = %id, mode = %state.store.mode(), "Message still present after delete");
        return Err(AppError::DeletionFailed(format!("message {id} still exists")));
    }

    tracing::info!(id = %id, "Contact message deleted");
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/admin/messages/reply
/// Emails the reply first; the message is only marked replied once the
/// email API accepted it.
pub async fn reply_to_message(
    _session: AdminSession,
    State(state): State<SharedState>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ContactMessage>, AppError> {
    let id = request
        .message_id
        .ok_or_else(|| AppError::field("messageId", "Message id is required"))?;
    let request = ReplyRequest {
        message_id: Some(id),
        reply_content: request.reply_content.trim().to_string(),
    };
    request.validate()?;

    let mut message = load(&state, id).await?;
    let email = compose_reply(
        &state.config.email_from,
        &state.config.site_title,
        &message,
        &request.reply_content,
    );
    state.mailer.send(&email).await?;

    message.record_reply(request.reply_content, Utc::now());
    let message = state.store.store().save_message(&message).await?;

    tracing::info!(id = %message.id, "Replied to contact message");
    Ok(Json(message))
}

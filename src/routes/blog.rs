/**
 * Blog Routes
 * Admin CRUD endpoints for blog posts
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::SuccessResponse;
use crate::{
    auth::AdminSession,
    content::{
        forms::{BlogPostForm, BlogPostPatch},
        publish::Transition,
    },
    db::models::BlogPost,
    error::AppError,
    state::SharedState,
    store::{ListQuery, Page, PostSort},
};

const REVALIDATE_PATH: &str = "/admin/blog";

/// Query parameters for GET /api/admin/blog-posts
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListParams {
    pub published: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

async fn load(state: &SharedState, id: Uuid) -> Result<BlogPost, AppError> {
    state
        .store
        .store()
        .find_post(id)
        .await?
        .ok_or(AppError::NotFound("Blog post"))
}

fn log_transition(post: &BlogPost, transition: Transition) {
    match transition {
        Transition::Publish => tracing::info!(id = %post.id, slug = %post.slug, "Blog post published"),
        Transition::Unpublish => {
            tracing::info!(id = %post.id, slug = %post.slug, "Blog post moved back to draft")
        }
        Transition::Unchanged => {}
    }
}

/// GET /api/admin/blog-posts
pub async fn list_posts(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<PostListParams>,
) -> Result<Json<Page<BlogPost>>, AppError> {
    let query = ListQuery::<PostSort>::from_params(
        params.published,
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        params.page,
        params.limit,
    );
    Ok(Json(state.store.store().list_posts(&query).await?))
}

/// POST /api/admin/blog-posts
pub async fn create_post(
    _session: AdminSession,
    State(state): State<SharedState>,
    Json(form): Json<BlogPostForm>,
) -> Result<impl IntoResponse, AppError> {
    let new_post = form.into_new(Utc::now())?;
    let post = state.store.store().insert_post(new_post).await?;

    tracing::info!(id = %post.id, slug = %post.slug, published = post.published, "Blog post created");
    state.revalidate_after_write(REVALIDATE_PATH).await;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/admin/blog-posts/{id}
pub async fn get_post(
    _session: AdminSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, AppError> {
    Ok(Json(load(&state, id).await?))
}

/// PATCH /api/admin/blog-posts/{id}
pub async fn update_post(
    _session: AdminSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BlogPostPatch>,
) -> Result<Json<BlogPost>, AppError> {
    let mut post = load(&state, id).await?;
    let transition = patch.apply(&mut post, Utc::now())?;
    let post = state.store.store().save_post(&post).await?;

    log_transition(&post, transition);
    state.revalidate_after_write(REVALIDATE_PATH).await;

    Ok(Json(post))
}

/// POST /api/admin/blog-posts/{id}/toggle-publish
pub async fn toggle_publish(
    _session: AdminSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, AppError> {
    let mut post = load(&state, id).await?;
    let patch = BlogPostPatch {
        published: Some(!post.published),
        ..Default::default()
    };
    let transition = patch.apply(&mut post, Utc::now())?;
    let post = state.store.store().save_post(&post).await?;

    log_transition(&post, transition);
    state.revalidate_after_write(REVALIDATE_PATH).await;

    Ok(Json(post))
}

/// DELETE /api/admin/blog-posts/{id}
pub async fn delete_post(
    _session: AdminSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    let store = state.store.store();
    if !store.delete_post(id).await? {
        return Err(AppError::NotFound("Blog post"));
    }
    if store.find_post(id).await?.is_some() {
        tracing::error!(id = %id, mode = %state.store.mode(), "Blog post still present after delete");
        return Err(AppError::DeletionFailed(format!("blog post {id} still exists")));
    }

    tracing::info!(id = %id, "Blog post deleted");
    state.revalidate_after_write(REVALIDATE_PATH).await;

    Ok(Json(SuccessResponse { success: true }))
}

/**
 * Page Routes
 * Server-rendered public pages and the revalidation trigger
 */
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    auth::AdminSession,
    db::models::{BlogPost, Service},
    error::AppError,
    site::{i18n::LangQuery, render, Lang},
    state::SharedState,
    store::{ListQuery, PostSort, ServiceSort, SortOrder, MAX_PAGE_SIZE},
};

const HOME_POSTS: u32 = 3;

async fn published_posts(state: &SharedState, limit: u32) -> Result<Vec<BlogPost>, AppError> {
    let query = ListQuery {
        filter: Some(true),
        sort: PostSort::PublishedAt,
        order: SortOrder::Desc,
        page: 1,
        limit,
    };
    Ok(state.store.store().list_posts(&query).await?.items)
}

async fn all_services(state: &SharedState) -> Result<Vec<Service>, AppError> {
    let query = ListQuery {
        filter: None,
        sort: ServiceSort::CreatedAt,
        order: SortOrder::Asc,
        page: 1,
        limit: MAX_PAGE_SIZE,
    };
    Ok(state.store.store().list_services(&query).await?.items)
}

async fn cache_hit(state: &SharedState, path: &str, lang: Lang) -> Option<Response> {
    let body = state.pages.get(path, lang).await?;
    Some(Html(body).into_response())
}

/// `seen` is the cache generation read before the store was queried.
async fn cache_store(state: &SharedState, path: &str, lang: Lang, body: String, seen: u64) -> Response {
    state.pages.insert(path, lang, body.clone(), seen).await;
    Html(body).into_response()
}

fn not_found_page(state: &SharedState, lang: Lang, path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(render::not_found(lang, &state.site, path)),
    )
        .into_response()
}

/// GET /
pub async fn home(
    State(state): State<SharedState>,
    Query(q): Query<LangQuery>,
) -> Result<Response, AppError> {
    let lang = Lang::from_query(q.lang.as_deref());
    if let Some(hit) = cache_hit(&state, "/", lang).await {
        return Ok(hit);
    }
    let seen = state.pages.generation();
    let posts = published_posts(&state, HOME_POSTS).await?;
    let services = all_services(&state).await?;
    let body = render::home(lang, &state.site, &posts, &services);
    Ok(cache_store(&state, "/", lang, body, seen).await)
}

/// GET /blog
pub async fn blog_index(
    State(state): State<SharedState>,
    Query(q): Query<LangQuery>,
) -> Result<Response, AppError> {
    let lang = Lang::from_query(q.lang.as_deref());
    if let Some(hit) = cache_hit(&state, "/blog", lang).await {
        return Ok(hit);
    }
    let seen = state.pages.generation();
    let posts = published_posts(&state, MAX_PAGE_SIZE).await?;
    let body = render::blog_index(lang, &state.site, &posts);
    Ok(cache_store(&state, "/blog", lang, body, seen).await)
}

/// GET /blog/{slug}
/// Drafts are invisible here.
pub async fn blog_post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(q): Query<LangQuery>,
) -> Result<Response, AppError> {
    let lang = Lang::from_query(q.lang.as_deref());
    let path = format!("/blog/{slug}");
    if let Some(hit) = cache_hit(&state, &path, lang).await {
        return Ok(hit);
    }
    let seen = state.pages.generation();

    match state.store.store().find_post_by_slug(&slug).await? {
        Some(post) if post.published => {
            let body = render::blog_post(lang, &state.site, &post);
            Ok(cache_store(&state, &path, lang, body, seen).await)
        }
        _ => Ok(not_found_page(&state, lang, &path)),
    }
}

/// GET /services
pub async fn services(
    State(state): State<SharedState>,
    Query(q): Query<LangQuery>,
) -> Result<Response, AppError> {
    let lang = Lang::from_query(q.lang.as_deref());
    if let Some(hit) = cache_hit(&state, "/services", lang).await {
        return Ok(hit);
    }
    let seen = state.pages.generation();
    let services = all_services(&state).await?;
    let body = render::services(lang, &state.site, &services);
    Ok(cache_store(&state, "/services", lang, body, seen).await)
}

/// Fallback: HTML 404 for pages, JSON 404 under /api.
pub async fn fallback(State(state): State<SharedState>, uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        return AppError::NotFound("Route").into_response();
    }
    let lang = Lang::from_query(
        uri.query()
            .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("lang="))),
    );
    not_found_page(&state, lang, uri.path())
}

#[derive(Debug, Default, Deserialize)]
pub struct RevalidateParams {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub path: String,
    pub dropped: usize,
    pub now: i64,
}

/// POST /api/revalidate?path=
pub async fn revalidate(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<RevalidateParams>,
) -> Result<Json<RevalidateResponse>, AppError> {
    let path = params
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::field("path", "Path is required"))?;

    let dropped = state.pages.revalidate(&path).await.map_err(|e| {
        state.ops.revalidation_failed();
        tracing::warn!(path = %path, error = %e, "Revalidation failed");
        AppError::BadRequest(format!("Revalidation failed: {e}"))
    })?;

    Ok(Json(RevalidateResponse {
        revalidated: true,
        path,
        dropped,
        now: Utc::now().timestamp_millis(),
    }))
}

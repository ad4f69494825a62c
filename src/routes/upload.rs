/**
 * Upload Routes
 * Image upload for blog posts and services, plus image serving
 */
use axum::{
    body::Body,
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    auth::AdminSession,
    error::AppError,
    media::{MediaCategory, MediaError, ServedFile, MAX_FILE_SIZE, PLACEHOLDER_SVG},
    state::SharedState,
};

/// Reads a file field, giving up as soon as it passes the size ceiling.
async fn read_limited(mut field: Field<'_>) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        tracing::error!("Failed to read upload bytes: {}", e);
        AppError::BadRequest("Failed to read file data".to_string())
    })? {
        if bytes.len() + chunk.len() > MAX_FILE_SIZE {
            return Err(MediaError::TooLarge.into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// POST /api/upload
/// Multipart fields: `file` (required) and `folder` (`blog` or `services`,
/// defaults to `blog`).
pub async fn upload_image(
    _session: AdminSession,
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut folder: Option<String> = None;
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::error!("Multipart error: {}", e);
            AppError::BadRequest("Invalid multipart data".to_string())
        })?;
        let Some(field) = field else { break };

        match field.name() {
            Some("folder") => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest("Invalid folder field".to_string()))?;
                folder = Some(value);
            }
            Some("file") => {
                let declared = field.content_type().map(str::to_string);
                let bytes = read_limited(field).await?;
                file = Some((declared, bytes));
            }
            _ => {}
        }
    }

    let category = match folder.as_deref() {
        Some(raw) if !raw.trim().is_empty() => MediaCategory::parse(raw)?,
        _ => MediaCategory::Blog,
    };
    let (declared, bytes) = file.ok_or_else(|| AppError::field("file", "No file provided"))?;

    let stored = state.media.save(category, declared.as_deref(), &bytes).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

fn image_response(file: ServedFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        Body::from(file.bytes),
    )
        .into_response()
}

/// GET /api/image/{*path}
/// `path` is `<folder>/<file>`; a missing file answers with a placeholder.
pub async fn serve_image(
    State(state): State<SharedState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    match state.media.open(&path).await {
        Ok(file) => Ok(image_response(file)),
        Err(MediaError::Missing) => {
            tracing::debug!(path = %path, "Image missing, serving placeholder");
            Ok((
                [
                    (header::CONTENT_TYPE, "image/svg+xml"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                PLACEHOLDER_SVG,
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/blog-image/{*path}
pub async fn serve_blog_image(
    State(state): State<SharedState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    match state.media.open_in(MediaCategory::Blog, &path).await {
        Ok(file) => Ok(image_response(file)),
        Err(MediaError::Missing) => Ok(StatusCode::NOT_FOUND.into_response()),
        Err(e) => Err(e.into()),
    }
}

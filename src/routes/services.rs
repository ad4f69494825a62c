/**
 * Service Routes
 * Admin CRUD endpoints for the services catalog
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
    content::forms::{ServiceForm, ServicePatch},
    db::models::Service,
    error::AppError,
    state::SharedState,
    store::{ListQuery, Page, ServiceSort},
};

const REVALIDATE_PATH: &str = "/admin/services";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListParams {
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

async fn load(state: &SharedState, id: Uuid) -> Result<Service, AppError> {
    state
        .store
        .store()
        .find_service(id)
        .await?
        .ok_or(AppError::NotFound("Service"))
}

/// GET /api/admin/services
pub async fn list_services(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<ServiceListParams>,
) -> Result<Json<Page<Service>>, AppError> {
    let query = ListQuery::<ServiceSort>::from_params(
        None,
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        params.page,
        params.limit,
    );
    Ok(Json(state.store.store().list_services(&query).await?))
}

/// POST /api/admin/services
pub async fn create_service(
    _session: AdminSession,
    State(state): State<SharedState>,
    Json(form): Json<ServiceForm>,
) -> Result<impl IntoResponse, AppError> {
    let service = state.store.store().insert_service(form.into_new()?).await?;

    tracing::info!(id = %service.id, icon = %service.icon, "Service created");
    state.revalidate_after_write(REVALIDATE_PATH).await;

    Ok((StatusCode::CREATED, Json(service)))
}

/// GET /api/admin/services/{id}
pub async fn get_service(
    _session: AdminSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Service>, AppError> {
    Ok(Json(load(&state, id).await?))
}

/// PATCH /api/admin/services/{id}
pub async fn update_service(
    _session: AdminSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ServicePatch>,
) -> Result<Json<Service>, AppError> {
    let mut service = load(&state, id).await?;
    patch.apply(&mut service, Utc::now())?;
    let service = state.store.store().save_service(&service).await?;

    tracing::info!(id = %service.id, "Service updated");
    state.revalidate_after_write(REVALIDATE_PATH).await;

    Ok(Json(service))
}

/// DELETE /api/admin/services/{id}
pub async fn delete_service(
    _session: AdminSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    let store = state.store.store();
    if !store.delete_service(id).await? {
        return Err(AppError::NotFound("Service"));
    }
    if store.find_service(id).await?.is_some() {
        tracing::error!(id = %id, mode = %state.store.mode(), "Service still present after delete");
        return Err(AppError::DeletionFailed(format!("service {id} still exists")));
    }

    tracing::info!(id = %id, "Service deleted");
    state.revalidate_after_write(REVALIDATE_PATH).await;

    Ok(Json(SuccessResponse { success: true }))
}

// src/handlers/absences.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{Managers, RequireRole},
        tenancy::TenantContext,
    },
    models::absence::{Absence, CreateAbsencePayload, ListAbsencesQuery, UpdateAbsencePayload},
};

// POST /api/absences
#[utoipa::path(
    post,
    path = "/api/absences",
    tag = "Absences",
    request_body = CreateAbsencePayload,
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 201, description = "Ausência registrada", body = Absence),
        (status = 404, description = "Técnico não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_absence(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Managers>,
    tenant: TenantContext,
    Json(payload): Json<CreateAbsencePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let absence = app_state
        .absence_service
        .create(&tenant.identity, tenant.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(absence)))
}

// GET /api/absences
#[utoipa::path(
    get,
    path = "/api/absences",
    tag = "Absences",
    params(
        ListAbsencesQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Ausências do tenant", body = Vec<Absence>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_absences(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ListAbsencesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let absences = app_state
        .absence_service
        .list(&tenant.identity, tenant.company_id, query.technician_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(absences)))
}

// GET /api/absences/{id}
#[utoipa::path(
    get,
    path = "/api/absences/{id}",
    tag = "Absences",
    params(
        ("id" = Uuid, Path, description = "ID da ausência"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Ausência", body = Absence),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_absence(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let absence = app_state
        .absence_service
        .get(&tenant.identity, tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(absence)))
}

// PUT /api/absences/{id}
#[utoipa::path(
    put,
    path = "/api/absences/{id}",
    tag = "Absences",
    request_body = UpdateAbsencePayload,
    params(
        ("id" = Uuid, Path, description = "ID da ausência"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Ausência atualizada", body = Absence),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_absence(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Managers>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAbsencePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let absence = app_state
        .absence_service
        .update(tenant.company_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(absence)))
}

// DELETE /api/absences/{id}
#[utoipa::path(
    delete,
    path = "/api/absences/{id}",
    tag = "Absences",
    params(
        ("id" = Uuid, Path, description = "ID da ausência"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_absence(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Managers>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .absence_service
        .delete(tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

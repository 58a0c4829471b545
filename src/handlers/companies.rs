// src/handlers/companies.rs

use axum::{
    extract::{Path, State},
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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Admins, RequireRole, SuperAdminOnly},
    },
    models::company::{Company, CreateCompanyPayload, DeactivationReport, UpdateCompanyPayload},
};

// POST /api/companies
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 403, description = "Apenas super admin"),
        (status = 409, description = "E-mail ou SIRET já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<SuperAdminOnly>,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let company = app_state
        .tenant_service
        .create_company(guard.identity(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// GET /api/companies
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses(
        (status = 200, description = "Todas as empresas", body = Vec<Company>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<SuperAdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .tenant_service
        .list_companies(guard.identity())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(companies)))
}

// GET /api/companies/{id}
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa", body = Company),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .tenant_service
        .get_company(&identity, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(company)))
}

// PUT /api/companies/{id}
#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "Companies",
    request_body = UpdateCompanyPayload,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa atualizada", body = Company),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Admins>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let company = app_state
        .tenant_service
        .update_company(guard.identity(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(company)))
}

// POST /api/companies/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/companies/{id}/deactivate",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa e usuários desativados; tokens anteriores revogados", body = DeactivationReport),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_company(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Admins>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .tenant_service
        .deactivate_company(guard.identity(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(report)))
}

// POST /api/companies/{id}/reactivate
#[utoipa::path(
    post,
    path = "/api/companies/{id}/reactivate",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa reativada (usuários continuam inativos)", body = Company),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn reactivate_company(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<SuperAdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .tenant_service
        .reactivate_tenant(guard.identity(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(company)))
}

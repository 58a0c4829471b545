// src/handlers/prospects.rs

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
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::prospect::{
        CreateCommentPayload, CreateProspectPayload, ListProspectsQuery, Prospect, ProspectComment, ProspectStats,
        UpdateProspectPayload,
    },
};

// O escopo de cada papel (tenant inteiro, só leitura ou só os próprios) é aplicado no serviço.

// POST /api/prospects
#[utoipa::path(
    post,
    path = "/api/prospects",
    tag = "Prospects",
    request_body = CreateProspectPayload,
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 201, description = "Prospect criado", body = Prospect),
        (status = 403, description = "Papel sem permissão de escrita")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_prospect(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateProspectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let prospect = app_state
        .prospect_service
        .create(&tenant.identity, tenant.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(prospect)))
}

// GET /api/prospects
#[utoipa::path(
    get,
    path = "/api/prospects",
    tag = "Prospects",
    params(
        ListProspectsQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Prospects visíveis ao ator", body = Vec<Prospect>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_prospects(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ListProspectsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let prospects = app_state
        .prospect_service
        .list(&tenant.identity, tenant.company_id, query.processing_status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(prospects)))
}

// GET /api/prospects/stats
#[utoipa::path(
    get,
    path = "/api/prospects/stats",
    tag = "Prospects",
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Contagem por status", body = ProspectStats)
    ),
    security(("api_jwt" = []))
)]
pub async fn prospect_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .prospect_service
        .stats(&tenant.identity, tenant.company_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/prospects/{id}
#[utoipa::path(
    get,
    path = "/api/prospects/{id}",
    tag = "Prospects",
    params(
        ("id" = Uuid, Path, description = "ID do prospect"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Prospect", body = Prospect),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_prospect(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let prospect = app_state
        .prospect_service
        .get(&tenant.identity, tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(prospect)))
}

// PUT /api/prospects/{id}
#[utoipa::path(
    put,
    path = "/api/prospects/{id}",
    tag = "Prospects",
    request_body = UpdateProspectPayload,
    params(
        ("id" = Uuid, Path, description = "ID do prospect"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Prospect atualizado", body = Prospect),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_prospect(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProspectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let prospect = app_state
        .prospect_service
        .update(&tenant.identity, tenant.company_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(prospect)))
}

// DELETE /api/prospects/{id}
#[utoipa::path(
    delete,
    path = "/api/prospects/{id}",
    tag = "Prospects",
    params(
        ("id" = Uuid, Path, description = "ID do prospect"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_prospect(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .prospect_service
        .delete(&tenant.identity, tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/prospects/{id}/comments
#[utoipa::path(
    get,
    path = "/api/prospects/{id}/comments",
    tag = "Prospects",
    params(
        ("id" = Uuid, Path, description = "ID do prospect"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Comentários do prospect", body = Vec<ProspectComment>),
        (status = 404, description = "Prospect não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_comments(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = app_state
        .prospect_service
        .list_comments(&tenant.identity, tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(comments)))
}

// POST /api/prospects/{id}/comments
#[utoipa::path(
    post,
    path = "/api/prospects/{id}/comments",
    tag = "Prospects",
    request_body = CreateCommentPayload,
    params(
        ("id" = Uuid, Path, description = "ID do prospect"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 201, description = "Comentário criado; o tipo vem do papel do autor", body = ProspectComment),
        (status = 403, description = "Papel não pode comentar"),
        (status = 404, description = "Prospect não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_comment(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let comment = app_state
        .prospect_service
        .add_comment(&tenant.identity, tenant.company_id, id, &payload.comment)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

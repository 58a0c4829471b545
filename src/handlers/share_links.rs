// src/handlers/share_links.rs

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
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
    models::{
        appointment::Appointment,
        share_link::{
            CalendarView, CreateShareLinkPayload, ListShareLinksQuery, RevokeShareLinkPayload, ShareLinkResponse,
            SharedAppointmentPayload,
        },
    },
};

// =============================================================================
//  GESTÃO (AUTENTICADA)
// =============================================================================

// POST /api/share-links
#[utoipa::path(
    post,
    path = "/api/share-links",
    tag = "Share Links",
    request_body = CreateShareLinkPayload,
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 201, description = "Link criado", body = ShareLinkResponse),
        (status = 404, description = "Técnico não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_share_link(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Managers>,
    tenant: TenantContext,
    Json(payload): Json<CreateShareLinkPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let service = &app_state.share_link_service;
    let link = service
        .create(&tenant.identity, tenant.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(service.to_response(link, &locale.0, Utc::now()))))
}

// GET /api/share-links
#[utoipa::path(
    get,
    path = "/api/share-links",
    tag = "Share Links",
    params(
        ListShareLinksQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Links do tenant", body = Vec<ShareLinkResponse>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_share_links(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Managers>,
    tenant: TenantContext,
    Query(query): Query<ListShareLinksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = &app_state.share_link_service;
    let links = service
        .list(tenant.company_id, &query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let now = Utc::now();
    let responses: Vec<ShareLinkResponse> = links
        .into_iter()
        .map(|link| service.to_response(link, &locale.0, now))
        .collect();

    Ok((StatusCode::OK, Json(responses)))
}

// GET /api/share-links/{id}
#[utoipa::path(
    get,
    path = "/api/share-links/{id}",
    tag = "Share Links",
    params(
        ("id" = Uuid, Path, description = "ID do link"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Link", body = ShareLinkResponse),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_share_link(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Managers>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = &app_state.share_link_service;
    let link = service
        .get(tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(service.to_response(link, &locale.0, Utc::now()))))
}

// PUT /api/share-links/{id}/revoke
#[utoipa::path(
    put,
    path = "/api/share-links/{id}/revoke",
    tag = "Share Links",
    request_body = RevokeShareLinkPayload,
    params(
        ("id" = Uuid, Path, description = "ID do link"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Link revogado", body = ShareLinkResponse),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn revoke_share_link(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Managers>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<RevokeShareLinkPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let service = &app_state.share_link_service;
    let link = service
        .revoke(&tenant.identity, tenant.company_id, id, payload.reason.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(service.to_response(link, &locale.0, Utc::now()))))
}

// =============================================================================
//  ACESSO ANÔNIMO (SEM TOKEN JWT)
// =============================================================================

// GET /api/share/{token}
#[utoipa::path(
    get,
    path = "/api/share/{token}",
    tag = "Shared Calendar",
    params(("token" = String, Path, description = "Token do link")),
    responses(
        (status = 200, description = "Agenda do técnico", body = CalendarView),
        (status = 403, description = "IP não permitido"),
        (status = 404, description = "Link inválido ou expirado")
    )
)]
pub async fn view_shared_calendar(
    State(app_state): State<AppState>,
    locale: Locale,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .share_link_service
        .consume(&token, addr.ip())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

// POST /api/share/{token}/appointments
#[utoipa::path(
    post,
    path = "/api/share/{token}/appointments",
    tag = "Shared Calendar",
    request_body = SharedAppointmentPayload,
    params(("token" = String, Path, description = "Token do link")),
    responses(
        (status = 201, description = "Compromisso criado pelo link", body = Appointment),
        (status = 403, description = "Link sem permissão de agendamento ou IP não permitido"),
        (status = 404, description = "Link inválido ou expirado"),
        (status = 409, description = "Conflito de agenda")
    )
)]
pub async fn book_shared_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(token): Path<String>,
    Json(payload): Json<SharedAppointmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let appointment = app_state
        .share_link_service
        .book(&token, addr.ip(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

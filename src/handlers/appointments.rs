// src/handlers/appointments.rs

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
        rbac::{Admins, ProspectDesk, RequireRole},
        tenancy::TenantContext,
    },
    models::appointment::{
        Appointment, AvailabilityRequest, AvailabilityResponse, CreateAppointmentPayload, ListAppointmentsQuery,
        UpdateAppointmentPayload, UpdateAppointmentStatusPayload,
    },
};

// POST /api/appointments
#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "Appointments",
    request_body = CreateAppointmentPayload,
    responses(
        (status = 201, description = "Compromisso criado", body = Appointment),
        (status = 404, description = "Técnico ou prospect não encontrado"),
        (status = 409, description = "Conflito de agenda")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<ProspectDesk>,
    tenant: TenantContext,
    Json(payload): Json<CreateAppointmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let appointment = app_state
        .appointment_service
        .create(&tenant.identity, tenant.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

// GET /api/appointments
#[utoipa::path(
    get,
    path = "/api/appointments",
    tag = "Appointments",
    params(
        ListAppointmentsQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Compromissos do tenant, mais recentes primeiro", body = Vec<Appointment>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_appointments(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let appointments = app_state
        .appointment_service
        .list(&tenant.identity, tenant.company_id, &query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(appointments)))
}

// GET /api/appointments/{id}
#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    params(
        ("id" = Uuid, Path, description = "ID do compromisso"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Compromisso", body = Appointment),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = app_state
        .appointment_service
        .get(&tenant.identity, tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(appointment)))
}

// PUT /api/appointments/{id}
#[utoipa::path(
    put,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    request_body = UpdateAppointmentPayload,
    params(
        ("id" = Uuid, Path, description = "ID do compromisso"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Compromisso atualizado", body = Appointment),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Conflito de agenda")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<ProspectDesk>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let appointment = app_state
        .appointment_service
        .update(&tenant.identity, tenant.company_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(appointment)))
}

// PUT /api/appointments/{id}/status
#[utoipa::path(
    put,
    path = "/api/appointments/{id}/status",
    tag = "Appointments",
    request_body = UpdateAppointmentStatusPayload,
    params(
        ("id" = Uuid, Path, description = "ID do compromisso"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Status alterado", body = Appointment),
        (status = 400, description = "Transição inválida"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_appointment_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = app_state
        .appointment_service
        .update_status(&tenant.identity, tenant.company_id, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(appointment)))
}

// DELETE /api/appointments/{id}
#[utoipa::path(
    delete,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    params(
        ("id" = Uuid, Path, description = "ID do compromisso"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_appointment(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Admins>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .appointment_service
        .delete(&tenant.identity, tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/appointments/availability
#[utoipa::path(
    post,
    path = "/api/appointments/availability",
    tag = "Appointments",
    request_body = AvailabilityRequest,
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "Tenant (obrigatório para super admin)")
    ),
    responses(
        (status = 200, description = "Resultado da verificação, sem gravar nada", body = AvailabilityResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn check_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<ProspectDesk>,
    tenant: TenantContext,
    Json(request): Json<AvailabilityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let availability = app_state
        .appointment_service
        .check_availability(tenant.company_id, &request)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(availability)))
}

// src/handlers/schedule.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, TechnicianOnly},
        tenancy::TenantContext,
    },
    models::appointment::{Appointment, MonthlyScheduleStats},
};

// GET /api/schedule/upcoming
#[utoipa::path(
    get,
    path = "/api/schedule/upcoming",
    tag = "Schedule",
    responses(
        (status = 200, description = "Compromissos dos próximos 7 dias", body = Vec<Appointment>),
        (status = 403, description = "Apenas técnicos")
    ),
    security(("api_jwt" = []))
)]
pub async fn upcoming_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<TechnicianOnly>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let appointments = app_state
        .appointment_service
        .upcoming(&tenant.identity, tenant.company_id, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(appointments)))
}

// GET /api/schedule/stats/monthly
#[utoipa::path(
    get,
    path = "/api/schedule/stats/monthly",
    tag = "Schedule",
    responses(
        (status = 200, description = "Totais do mês corrente por status", body = MonthlyScheduleStats),
        (status = 403, description = "Apenas técnicos")
    ),
    security(("api_jwt" = []))
)]
pub async fn monthly_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<TechnicianOnly>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .appointment_service
        .monthly_stats(&tenant.identity, tenant.company_id, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(stats)))
}

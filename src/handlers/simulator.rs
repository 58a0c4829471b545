// src/handlers/simulator.rs

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
        i18n::Locale,
        rbac::{RequireRole, SuperAdminOnly},
    },
    models::simulator::{SimulatorReceipt, SimulatorSubmission, SimulatorSubmissionPayload},
};

// POST /api/simulator/submit (público)
#[utoipa::path(
    post,
    path = "/api/simulator/submit",
    tag = "Simulator",
    request_body = SimulatorSubmissionPayload,
    responses(
        (status = 201, description = "Simulação registrada", body = SimulatorReceipt),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn submit_simulation(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SimulatorSubmissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let submission = app_state
        .simulator_service
        .submit(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let receipt = SimulatorReceipt {
        id: submission.id,
        created_at: submission.created_at,
    };
    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/simulator/submissions
#[utoipa::path(
    get,
    path = "/api/simulator/submissions",
    tag = "Simulator",
    responses(
        (status = 200, description = "Simulações, mais recentes primeiro", body = Vec<SimulatorSubmission>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_simulations(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<SuperAdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let submissions = app_state
        .simulator_service
        .list(guard.identity())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(submissions)))
}

// GET /api/simulator/submissions/{id}
#[utoipa::path(
    get,
    path = "/api/simulator/submissions/{id}",
    tag = "Simulator",
    params(("id" = Uuid, Path, description = "ID da simulação")),
    responses(
        (status = 200, description = "Simulação", body = SimulatorSubmission),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_simulation(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<SuperAdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = app_state
        .simulator_service
        .get(guard.identity(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(submission)))
}

// DELETE /api/simulator/submissions/{id}
#[utoipa::path(
    delete,
    path = "/api/simulator/submissions/{id}",
    tag = "Simulator",
    params(("id" = Uuid, Path, description = "ID da simulação")),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_simulation(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<SuperAdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .simulator_service
        .delete(guard.identity(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

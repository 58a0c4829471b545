// src/handlers/users.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Managers, RequireRole},
    },
    models::user::{
        CreateUserPayload, ListUsersQuery, UpdateUserPayload, UpdateUserStatusPayload, User, UserWithCredentials,
    },
};

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado; a senha temporária também segue por e-mail", body = UserWithCredentials),
        (status = 403, description = "Papel não pode criar o papel pedido"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Managers>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let created = app_state
        .user_service
        .create_user(guard.identity(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Usuários visíveis ao ator", body = Vec<User>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Managers>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list_users(guard.identity(), query.role)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(users)))
}

// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = User),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .get_user(&identity, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(user)))
}

// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    request_body = UpdateUserPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 403, description = "Alvo de papel igual ou superior"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Managers>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let user = app_state
        .user_service
        .update_user(guard.identity(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(user)))
}

// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Managers>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .user_service
        .delete_user(guard.identity(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/users/{id}/status
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    tag = "Users",
    request_body = UpdateUserStatusPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Status alterado (desativar um admin desativa o tenant)", body = User),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_status(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Managers>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .set_status(guard.identity(), id, payload.is_active)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(user)))
}

// POST /api/users/{id}/reset-password
#[utoipa::path(
    post,
    path = "/api/users/{id}/reset-password",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Nova senha temporária gerada e enviada", body = UserWithCredentials),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<Managers>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reset = app_state
        .user_service
        .reset_password(guard.identity(), id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(reset)))
}

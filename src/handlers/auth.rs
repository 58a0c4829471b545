// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        auth::{AuthResponse, CreateSuperAdminPayload, Identity, LoginPayload},
        user::User,
    },
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let (token, identity) = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            token,
            token_type: "Bearer",
            identity,
        }),
    ))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Identidade do token", body = Identity),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(identity): AuthenticatedUser) -> Json<Identity> {
    Json(identity)
}

// POST /api/auth/super-admin
#[utoipa::path(
    post,
    path = "/api/auth/super-admin",
    tag = "Auth",
    request_body = CreateSuperAdminPayload,
    responses(
        (status = 201, description = "Super admin criado", body = User),
        (status = 409, description = "Já existe um super admin")
    )
)]
pub async fn create_super_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateSuperAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let user = app_state
        .user_service
        .create_super_admin(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Identity,
};

// Identidade verificada, inserida nas extensions pelo `auth_guard`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Exige `Authorization: Bearer <jwt>` válido e não revogado.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let locale = Locale::from_header(
        parts
            .headers
            .get(axum::http::header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    );

    // 1. Extrai o bearer token do cabeçalho
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::InvalidToken.to_api_error(&locale))?;

    // 2. Valida assinatura, revogação e conta ativa
    let identity = app_state
        .auth_service
        .verify_token(bearer.token())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    // 3. Disponibiliza a identidade para os handlers
    parts.extensions.insert(AuthenticatedUser(identity));
    let request = Request::from_parts(parts, body);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&Locale::default()))
    }
}

// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n;
use crate::middleware::i18n::Locale;

/// Categorias de erro expostas ao cliente. Cada variante de `AppError`
/// pertence a exatamente uma delas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    Unauthorized,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Conflito de agenda para o técnico")]
    SchedulingConflict,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Endereço IP não autorizado")]
    IpNotAllowed,

    // Ausente OU pertencente a outro tenant: os dois casos são indistinguíveis.
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Link de compartilhamento inválido ou expirado")]
    ShareLinkInvalid,

    #[error("Contexto de tenant ausente")]
    TenantContextRequired,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidStatusTransition { .. }
            | AppError::TenantContextRequired => ErrorKind::Validation,
            AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::SchedulingConflict => ErrorKind::Conflict,
            AppError::InvalidCredentials | AppError::InvalidToken => ErrorKind::Unauthorized,
            AppError::Forbidden | AppError::IpNotAllowed => ErrorKind::Forbidden,
            AppError::NotFound(_) | AppError::ShareLinkInvalid => ErrorKind::NotFound,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ErrorKind::Internal,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::InvalidStatusTransition { .. } => "invalid_status_transition",
            AppError::EmailAlreadyExists => "email_exists",
            AppError::UniqueConstraintViolation(_) => "unique_violation",
            AppError::SchedulingConflict => "scheduling_conflict",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden => "forbidden",
            AppError::IpNotAllowed => "ip_not_allowed",
            AppError::NotFound(_) => "not_found",
            AppError::ShareLinkInvalid => "share_link_invalid",
            AppError::TenantContextRequired => "tenant_context_required",
            _ => "internal",
        }
    }

    /// Converte o erro de domínio em uma resposta HTTP no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale) -> ApiError {
        let kind = self.kind();
        let error = i18n::message(self.message_key(), &locale.0).to_string();

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            AppError::InvalidInput(reason) => Some(json!({ "reason": reason })),
            AppError::InvalidStatusTransition { from, to } => Some(json!({ "from": from, "to": to })),
            AppError::UniqueConstraintViolation(field) => Some(json!({ "field": field })),
            AppError::NotFound(resource) => Some(json!({ "resource": resource })),
            _ => None,
        };

        // O `tracing` registra a mensagem detalhada; o cliente só recebe a genérica.
        if kind == ErrorKind::Internal {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        ApiError {
            status: kind.status(),
            error,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

/// Resposta de erro já localizada, pronta para ir ao cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Traduz violações de unicidade do Postgres para erros de domínio.
pub(crate) fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "users_email_key" | "companies_email_key" => AppError::EmailAlreadyExists,
                    "companies_siret_key" => AppError::UniqueConstraintViolation("siret".into()),
                    other => AppError::UniqueConstraintViolation(other.to_string()),
                };
            }
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_failures_share_one_message() {
        let locale = Locale("en".into());
        let a = AppError::ShareLinkInvalid.to_api_error(&locale);
        assert_eq!(a.status, StatusCode::NOT_FOUND);
        assert_eq!(a.error, "Invalid or expired share link.");
        assert!(a.details.is_none());
    }

    #[test]
    fn scheduling_conflict_is_409_and_distinct_from_not_found() {
        assert_eq!(AppError::SchedulingConflict.kind(), ErrorKind::Conflict);
        assert_eq!(AppError::NotFound("technician").kind(), ErrorKind::NotFound);
        assert_eq!(AppError::InvalidInput("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn token_failures_are_generic_unauthorized() {
        let locale = Locale("pt".into());
        let api = AppError::InvalidToken.to_api_error(&locale);
        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api.error, "Token de autenticação inválido ou ausente.");
    }

    #[test]
    fn not_found_carries_resource_in_details() {
        let api = AppError::NotFound("prospect").to_api_error(&Locale::default());
        assert_eq!(api.details, Some(json!({ "resource": "prospect" })));
    }
}

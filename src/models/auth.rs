// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::role::Role;

/// De onde veio a identidade: a própria empresa (dona do tenant) ou um funcionário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Owner,
    Employee,
}

/// Identidade normalizada do chamador autenticado.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub kind: ActorKind,
}

impl Identity {
    pub fn is_owner(&self) -> bool {
        self.kind == ActorKind::Owner
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub kind: ActorKind,
    pub iat: i64,
    pub exp: i64,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "admin@empresa.com")]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub identity: Identity,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuperAdminPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 3, message = "O nome de usuário deve ter no mínimo 3 caracteres."))]
    pub username: String,
    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub password: String,
}

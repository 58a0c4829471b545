// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Identity,
};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Tenant em que a requisição opera, junto de quem a fez.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub company_id: Uuid,
    pub identity: Identity,
}

/// Funcionários operam no próprio tenant; o super_admin escolhe via X-Tenant-ID.
pub fn resolve_tenant(identity: &Identity, header_value: Option<&str>) -> Result<Uuid, AppError> {
    let requested = match header_value {
        Some(raw) => Some(
            Uuid::parse_str(raw.trim())
                .map_err(|_| AppError::InvalidInput("X-Tenant-ID inválido (não é um UUID)".into()))?,
        ),
        None => None,
    };

    match (identity.company_id, requested) {
        (Some(own), None) => Ok(own),
        (Some(own), Some(requested)) if own == requested => Ok(own),
        (Some(_), Some(_)) => Err(AppError::Forbidden),
        (None, Some(requested)) if identity.role.is_tenant_global() => Ok(requested),
        (None, _) => Err(AppError::TenantContextRequired),
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_header(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        );

        let AuthenticatedUser(identity) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        let header_value = match parts.headers.get(TENANT_ID_HEADER) {
            Some(value) => Some(value.to_str().map_err(|_| {
                AppError::InvalidInput("X-Tenant-ID contém caracteres inválidos".into()).to_api_error(&locale)
            })?),
            None => None,
        };

        let company_id = resolve_tenant(&identity, header_value).map_err(|e| e.to_api_error(&locale))?;

        Ok(TenantContext { company_id, identity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::ActorKind, role::Role};

    fn who(role: Role, company_id: Option<Uuid>) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "x@acme.fr".into(),
            display_name: "X".into(),
            role,
            company_id,
            kind: ActorKind::Employee,
        }
    }

    #[test]
    fn employee_uses_own_tenant() {
        let tenant = Uuid::new_v4();
        assert_eq!(resolve_tenant(&who(Role::Agent, Some(tenant)), None).unwrap(), tenant);
        let same = tenant.to_string();
        assert_eq!(resolve_tenant(&who(Role::Agent, Some(tenant)), Some(&same)).unwrap(), tenant);
    }

    #[test]
    fn employee_cannot_switch_tenant() {
        let other = Uuid::new_v4().to_string();
        let result = resolve_tenant(&who(Role::Admin, Some(Uuid::new_v4())), Some(&other));
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[test]
    fn super_admin_needs_header() {
        let root = who(Role::SuperAdmin, None);
        assert!(matches!(resolve_tenant(&root, None), Err(AppError::TenantContextRequired)));
        let target = Uuid::new_v4();
        assert_eq!(resolve_tenant(&root, Some(&target.to_string())).unwrap(), target);
    }

    #[test]
    fn malformed_header_is_validation_error() {
        let result = resolve_tenant(&who(Role::SuperAdmin, None), Some("loja-1"));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}

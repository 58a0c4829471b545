// src/middleware/rbac.rs

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::marker::PhantomData;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{auth::Identity, role::Role},
};

// =============================================================================
//  PREDICADOS
// =============================================================================

/// Admite papéis com nível maior ou igual a `min`.
pub fn require_role(identity: &Identity, min: Role) -> Result<(), AppError> {
    if identity.role.rank() >= min.rank() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn require_any_role(identity: &Identity, roles: &[Role]) -> Result<(), AppError> {
    if roles.contains(&identity.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Fora do tenant o recurso "não existe". O super_admin enxerga todos.
pub fn require_same_tenant(
    identity: &Identity,
    company_id: Option<Uuid>,
    resource: &'static str,
) -> Result<(), AppError> {
    if identity.role.is_tenant_global() || (company_id.is_some() && identity.company_id == company_id) {
        Ok(())
    } else {
        Err(AppError::NotFound(resource))
    }
}

pub fn require_owner_or_role(identity: &Identity, owner_id: Option<Uuid>, roles: &[Role]) -> Result<(), AppError> {
    if owner_id == Some(identity.id) || roles.contains(&identity.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Gerenciar (editar, remover, desativar) exige nível estritamente maior e
/// o mesmo tenant.
pub fn ensure_can_manage(actor: &Identity, target_role: Role, target_company: Option<Uuid>) -> Result<(), AppError> {
    require_same_tenant(actor, target_company, "user")?;
    if actor.role.outranks(target_role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn ensure_can_create(actor: &Identity, target_role: Role) -> Result<(), AppError> {
    if actor.role.can_create(target_role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

// =============================================================================
//  EXTRATOR TIPADO
// =============================================================================

/// 1. O Trait que define uma política de papéis
pub trait RolePolicy: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<P>(pub Identity, PhantomData<P>);

impl<P> RequireRole<P> {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl<P, S> FromRequestParts<S> for RequireRole<P>
where
    P: RolePolicy,
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

        require_any_role(&identity, P::allowed()).map_err(|e| {
            tracing::debug!("Papel {} negado pela política {}", identity.role, std::any::type_name::<P>());
            e.to_api_error(&locale)
        })?;

        Ok(RequireRole(identity, PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS POLÍTICAS (TIPOS)
// ---

pub struct SuperAdminOnly;
impl RolePolicy for SuperAdminOnly {
    fn allowed() -> &'static [Role] { &[Role::SuperAdmin] }
}

pub struct Admins;
impl RolePolicy for Admins {
    fn allowed() -> &'static [Role] { &[Role::SuperAdmin, Role::Admin] }
}

// Quem cria funcionários ou links de agenda
pub struct Managers;
impl RolePolicy for Managers {
    fn allowed() -> &'static [Role] { &[Role::SuperAdmin, Role::Admin, Role::Agent] }
}

pub struct ProspectDesk;
impl RolePolicy for ProspectDesk {
    fn allowed() -> &'static [Role] { &[Role::SuperAdmin, Role::Admin, Role::Agent, Role::CallCenter] }
}

// Visões de agenda do próprio técnico
pub struct TechnicianOnly;
impl RolePolicy for TechnicianOnly {
    fn allowed() -> &'static [Role] { &[Role::Technician] }
}

pub struct AnyStaff;
impl RolePolicy for AnyStaff {
    fn allowed() -> &'static [Role] { &Role::ALL }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::ActorKind;

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
    fn cross_tenant_is_reported_as_not_found() {
        let admin = who(Role::Admin, Some(Uuid::new_v4()));
        let err = require_same_tenant(&admin, Some(Uuid::new_v4()), "prospect").unwrap_err();
        assert!(matches!(err, AppError::NotFound("prospect")));
    }

    #[test]
    fn super_admin_crosses_tenants() {
        let root = who(Role::SuperAdmin, None);
        assert!(require_same_tenant(&root, Some(Uuid::new_v4()), "user").is_ok());
    }

    #[test]
    fn admin_manages_lower_roles_in_own_tenant_only() {
        let tenant = Uuid::new_v4();
        let admin = who(Role::Admin, Some(tenant));
        assert!(ensure_can_manage(&admin, Role::Technician, Some(tenant)).is_ok());
        assert!(matches!(ensure_can_manage(&admin, Role::Admin, Some(tenant)), Err(AppError::Forbidden)));
        assert!(matches!(
            ensure_can_manage(&admin, Role::Agent, Some(Uuid::new_v4())),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn agent_cannot_manage_call_center() {
        let tenant = Uuid::new_v4();
        let agent = who(Role::Agent, Some(tenant));
        assert!(ensure_can_manage(&agent, Role::CallCenter, Some(tenant)).is_err());
        assert!(ensure_can_manage(&agent, Role::Technician, Some(tenant)).is_ok());
    }

    #[test]
    fn creation_follows_table() {
        let tenant = Some(Uuid::new_v4());
        assert!(ensure_can_create(&who(Role::Admin, tenant), Role::CallCenter).is_ok());
        assert!(ensure_can_create(&who(Role::Agent, tenant), Role::Agent).is_err());
        assert!(ensure_can_create(&who(Role::CallCenter, tenant), Role::Technician).is_err());
    }

    #[test]
    fn rank_and_ownership_predicates() {
        let tech = who(Role::Technician, Some(Uuid::new_v4()));
        assert!(require_role(&tech, Role::Agent).is_err());
        assert!(require_role(&tech, Role::Technician).is_ok());
        assert!(require_owner_or_role(&tech, Some(tech.id), &[Role::Admin]).is_ok());
        assert!(require_owner_or_role(&tech, Some(Uuid::new_v4()), &[Role::Admin]).is_err());
    }
}

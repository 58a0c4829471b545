// src/services/prospect_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProspectRepository, UserRepository},
    models::{
        auth::Identity,
        prospect::{
            CommentType, CreateProspectPayload, ProcessingStatus, Prospect, ProspectComment, ProspectStats,
            UpdateProspectPayload,
        },
        role::Role,
    },
};

/// O que cada papel enxerga do funil de prospects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProspectScope {
    /// Todo o tenant; `read_only` para agentes.
    Tenant { read_only: bool },
    /// Apenas os prospects cujo `call_center_id` é o próprio operador.
    OwnedBy(Uuid),
}

impl ProspectScope {
    pub fn for_identity(identity: &Identity) -> Result<Self, AppError> {
        match identity.role {
            Role::SuperAdmin | Role::Admin => Ok(ProspectScope::Tenant { read_only: false }),
            Role::Agent => Ok(ProspectScope::Tenant { read_only: true }),
            Role::CallCenter => Ok(ProspectScope::OwnedBy(identity.id)),
            Role::Technician => Err(AppError::Forbidden),
        }
    }

    pub fn owner(&self) -> Option<Uuid> {
        match self {
            ProspectScope::OwnedBy(id) => Some(*id),
            ProspectScope::Tenant { .. } => None,
        }
    }

    pub fn ensure_writable(&self) -> Result<(), AppError> {
        match self {
            ProspectScope::Tenant { read_only: true } => Err(AppError::Forbidden),
            _ => Ok(()),
        }
    }
}

/// O tipo do comentário vem do papel, nunca do cliente.
pub fn comment_type_for(role: Role) -> Result<CommentType, AppError> {
    match role {
        Role::SuperAdmin | Role::Admin => Ok(CommentType::Regie),
        Role::CallCenter => Ok(CommentType::CallCenter),
        Role::Agent | Role::Technician => Err(AppError::Forbidden),
    }
}

#[derive(Clone)]
pub struct ProspectService {
    prospect_repo: ProspectRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl ProspectService {
    pub fn new(prospect_repo: ProspectRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { prospect_repo, user_repo, pool }
    }

    pub async fn create(
        &self,
        actor: &Identity,
        company_id: Uuid,
        payload: &CreateProspectPayload,
    ) -> Result<Prospect, AppError> {
        let scope = ProspectScope::for_identity(actor)?;
        scope.ensure_writable()?;

        // Call center: sempre ele mesmo. Admin: pode atribuir a um call center do tenant.
        let call_center_id = match scope {
            ProspectScope::OwnedBy(own) => Some(own),
            ProspectScope::Tenant { .. } => match payload.call_center_id {
                Some(id) => {
                    self.user_repo
                        .find_in_tenant(&self.pool, company_id, id)
                        .await?
                        .filter(|user| user.role == Role::CallCenter)
                        .ok_or(AppError::NotFound("call_center"))?;
                    Some(id)
                }
                None => None,
            },
        };

        let prospect = self
            .prospect_repo
            .create(&self.pool, company_id, call_center_id, payload)
            .await?;

        tracing::info!("📇 Prospect {} criado por {}", prospect.id, actor.id);
        Ok(prospect)
    }

    pub async fn list(
        &self,
        actor: &Identity,
        company_id: Uuid,
        status: Option<ProcessingStatus>,
    ) -> Result<Vec<Prospect>, AppError> {
        let scope = ProspectScope::for_identity(actor)?;
        self.prospect_repo.list(company_id, scope.owner(), status).await
    }

    pub async fn get(&self, actor: &Identity, company_id: Uuid, id: Uuid) -> Result<Prospect, AppError> {
        let scope = ProspectScope::for_identity(actor)?;
        self.prospect_repo
            .find(&self.pool, company_id, id, scope.owner())
            .await?
            .ok_or(AppError::NotFound("prospect"))
    }

    pub async fn update(
        &self,
        actor: &Identity,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateProspectPayload,
    ) -> Result<Prospect, AppError> {
        let scope = ProspectScope::for_identity(actor)?;
        scope.ensure_writable()?;

        self.prospect_repo
            .update(&self.pool, company_id, id, scope.owner(), payload)
            .await?
            .ok_or(AppError::NotFound("prospect"))
    }

    pub async fn delete(&self, actor: &Identity, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let scope = ProspectScope::for_identity(actor)?;
        scope.ensure_writable()?;

        if !self
            .prospect_repo
            .delete(&self.pool, company_id, id, scope.owner())
            .await?
        {
            return Err(AppError::NotFound("prospect"));
        }
        tracing::info!("🗑️ Prospect {} removido por {}", id, actor.id);
        Ok(())
    }

    pub async fn stats(&self, actor: &Identity, company_id: Uuid) -> Result<ProspectStats, AppError> {
        let scope = ProspectScope::for_identity(actor)?;
        let counts = self.prospect_repo.count_by_status(company_id, scope.owner()).await?;
        Ok(ProspectStats::from_counts(counts))
    }

    // =========================================================================
    //  COMENTÁRIOS
    // =========================================================================

    pub async fn list_comments(
        &self,
        actor: &Identity,
        company_id: Uuid,
        prospect_id: Uuid,
    ) -> Result<Vec<ProspectComment>, AppError> {
        let prospect = self.get(actor, company_id, prospect_id).await?;
        self.prospect_repo
            .list_comments(&self.pool, company_id, prospect.id)
            .await
    }

    pub async fn add_comment(
        &self,
        actor: &Identity,
        company_id: Uuid,
        prospect_id: Uuid,
        comment: &str,
    ) -> Result<ProspectComment, AppError> {
        let comment_type = comment_type_for(actor.role)?;
        let prospect = self.get(actor, company_id, prospect_id).await?;

        self.prospect_repo
            .create_comment(
                &self.pool,
                company_id,
                prospect.id,
                comment,
                comment_type,
                actor.id,
                &actor.display_name,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::ActorKind;

    fn who(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "x@acme.fr".into(),
            display_name: "X".into(),
            role,
            company_id: Some(Uuid::new_v4()),
            kind: ActorKind::Employee,
        }
    }

    #[test]
    fn call_center_is_scoped_to_own_prospects() {
        let operator = who(Role::CallCenter);
        let scope = ProspectScope::for_identity(&operator).unwrap();
        assert_eq!(scope, ProspectScope::OwnedBy(operator.id));
        assert_eq!(scope.owner(), Some(operator.id));
        assert!(scope.ensure_writable().is_ok());
    }

    #[test]
    fn admin_sees_whole_tenant() {
        let scope = ProspectScope::for_identity(&who(Role::Admin)).unwrap();
        assert_eq!(scope.owner(), None);
        assert!(scope.ensure_writable().is_ok());
    }

    #[test]
    fn agent_reads_but_does_not_write() {
        let scope = ProspectScope::for_identity(&who(Role::Agent)).unwrap();
        assert_eq!(scope.owner(), None);
        assert!(matches!(scope.ensure_writable(), Err(AppError::Forbidden)));
    }

    #[test]
    fn technician_has_no_access() {
        assert!(matches!(ProspectScope::for_identity(&who(Role::Technician)), Err(AppError::Forbidden)));
    }

    #[test]
    fn comment_type_is_forced_by_role() {
        assert_eq!(comment_type_for(Role::Admin).unwrap(), CommentType::Regie);
        assert_eq!(comment_type_for(Role::SuperAdmin).unwrap(), CommentType::Regie);
        assert_eq!(comment_type_for(Role::CallCenter).unwrap(), CommentType::CallCenter);
        assert!(comment_type_for(Role::Agent).is_err());
    }
}

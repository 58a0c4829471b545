// src/services/tenancy_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, ShareLinkRepository, UserRepository},
    middleware::rbac::{require_any_role, require_same_tenant},
    models::{
        auth::Identity,
        company::{Company, CreateCompanyPayload, DeactivationReport, UpdateCompanyPayload},
        role::Role,
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct TenantService {
    company_repo: CompanyRepository,
    user_repo: UserRepository,
    share_link_repo: ShareLinkRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(
        company_repo: CompanyRepository,
        user_repo: UserRepository,
        share_link_repo: ShareLinkRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            company_repo,
            user_repo,
            share_link_repo,
            pool,
        }
    }

    // =========================================================================
    //  CRUD DE EMPRESAS
    // =========================================================================

    pub async fn create_company(&self, actor: &Identity, payload: &CreateCompanyPayload) -> Result<Company, AppError> {
        require_any_role(actor, &[Role::SuperAdmin])?;

        if self.user_repo.email_in_use(&self.pool, &payload.email, None).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&payload.password).await?;
        let company = self.company_repo.create(&self.pool, payload, &password_hash).await?;

        tracing::info!("🏢 Empresa {} criada por {}", company.id, actor.id);
        Ok(company)
    }

    pub async fn list_companies(&self, actor: &Identity) -> Result<Vec<Company>, AppError> {
        require_any_role(actor, &[Role::SuperAdmin])?;
        self.company_repo.list(&self.pool).await
    }

    pub async fn get_company(&self, actor: &Identity, id: Uuid) -> Result<Company, AppError> {
        require_same_tenant(actor, Some(id), "company")?;
        self.company_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("company"))
    }

    pub async fn update_company(
        &self,
        actor: &Identity,
        id: Uuid,
        payload: &UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        require_same_tenant(actor, Some(id), "company")?;
        require_any_role(actor, &[Role::SuperAdmin, Role::Admin])?;

        if let Some(email) = &payload.email {
            if self.user_repo.email_in_use(&self.pool, email, Some(id)).await? {
                return Err(AppError::EmailAlreadyExists);
            }
        }

        self.company_repo
            .update(&self.pool, id, payload)
            .await?
            .ok_or(AppError::NotFound("company"))
    }

    // =========================================================================
    //  DESATIVAÇÃO EM CASCATA
    // =========================================================================

    /// Empresa inativa, marco de invalidação, usuários e links de agenda
    /// inativos e registro de revogação, tudo em uma única transação.
    pub async fn cascade_deactivate_tenant(&self, company_id: Uuid) -> Result<DeactivationReport, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;
        let revoked_before = Utc::now();

        // 2. Desativa a empresa e grava o marco
        self.company_repo
            .deactivate(&mut *tx, company_id, revoked_before)
            .await?
            .ok_or(AppError::NotFound("company"))?;

        // 3. Desativa todos os usuários do tenant
        let users_deactivated = self.user_repo.deactivate_all_in_company(&mut *tx, company_id).await?;

        // 4. Links de agenda compartilhada deixam de responder
        let share_links_revoked = self
            .share_link_repo
            .deactivate_all_in_company(&mut *tx, company_id)
            .await?;

        // 5. Log de revogação (append-only)
        self.company_repo
            .record_revocation(&mut *tx, company_id, revoked_before)
            .await?;

        tx.commit().await?;

        tracing::warn!(
            "⛔ Tenant {} desativado: {} usuários e {} links desativados, tokens anteriores a {} revogados",
            company_id,
            users_deactivated,
            share_links_revoked,
            revoked_before
        );

        Ok(DeactivationReport {
            company_id,
            users_deactivated,
            share_links_revoked,
            revoked_before,
        })
    }

    /// Desativar um admin derruba o tenant inteiro dele.
    pub async fn cascade_deactivate_admin(&self, admin_id: Uuid) -> Result<DeactivationReport, AppError> {
        let admin = self
            .user_repo
            .find_by_id(&self.pool, admin_id)
            .await?
            .filter(|user| user.role == Role::Admin)
            .ok_or(AppError::NotFound("admin"))?;

        let company_id = admin.company_id.ok_or(AppError::NotFound("company"))?;
        self.cascade_deactivate_tenant(company_id).await
    }

    /// Admin da própria empresa ou super_admin.
    pub async fn deactivate_company(&self, actor: &Identity, company_id: Uuid) -> Result<DeactivationReport, AppError> {
        require_same_tenant(actor, Some(company_id), "company")?;
        require_any_role(actor, &[Role::SuperAdmin, Role::Admin])?;
        self.cascade_deactivate_tenant(company_id).await
    }

    /// Só a flag da empresa volta; os usuários seguem inativos.
    pub async fn reactivate_tenant(&self, actor: &Identity, company_id: Uuid) -> Result<Company, AppError> {
        require_any_role(actor, &[Role::SuperAdmin])?;

        let company = self
            .company_repo
            .reactivate(&self.pool, company_id)
            .await?
            .ok_or(AppError::NotFound("company"))?;

        tracing::info!("✅ Tenant {} reativado por {}", company_id, actor.id);
        Ok(company)
    }
}

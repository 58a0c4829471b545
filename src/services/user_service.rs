// src/services/user_service.rs

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, NewUser, UserRepository},
    middleware::rbac::{ensure_can_create, ensure_can_manage, require_same_tenant},
    models::{
        auth::{CreateSuperAdminPayload, Identity},
        role::Role,
        user::{CreateUserPayload, UpdateUserPayload, User, UserWithCredentials},
    },
    services::{
        auth::{generate_password, hash_password},
        notification::{dispatch, Notification, Notifier},
        tenancy_service::TenantService,
    },
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    tenant_service: TenantService,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        tenant_service: TenantService,
        notifier: Arc<dyn Notifier>,
        notify_timeout: Duration,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            company_repo,
            tenant_service,
            notifier,
            notify_timeout,
            pool,
        }
    }

    /// Bootstrap: só funciona enquanto não existir nenhum super_admin.
    pub async fn create_super_admin(&self, payload: &CreateSuperAdminPayload) -> Result<User, AppError> {
        if self.user_repo.super_admin_exists().await? {
            return Err(AppError::UniqueConstraintViolation("super_admin".into()));
        }
        if self.user_repo.email_in_use(&self.pool, &payload.email, None).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&payload.password).await?;
        let user = self
            .user_repo
            .create(
                &self.pool,
                NewUser {
                    company_id: None,
                    email: &payload.email,
                    username: &payload.username,
                    password_hash: &password_hash,
                    role: Role::SuperAdmin,
                    first_name: None,
                    last_name: None,
                    phone: None,
                    address: None,
                    city: None,
                    postal_code: None,
                    created_by: None,
                },
            )
            .await?;

        tracing::info!("👑 Super admin {} criado", user.id);
        Ok(user)
    }

    pub async fn create_user(&self, actor: &Identity, payload: &CreateUserPayload) -> Result<UserWithCredentials, AppError> {
        // 1. Tabela de criação
        ensure_can_create(actor, payload.role)?;

        // 2. Tenant do novo usuário
        let company_id = if actor.role.is_tenant_global() {
            let company_id = payload
                .company_id
                .ok_or_else(|| AppError::InvalidInput("companyId é obrigatório".into()))?;
            self.company_repo
                .find_by_id(&self.pool, company_id)
                .await?
                .ok_or(AppError::NotFound("company"))?;
            company_id
        } else {
            actor.company_id.ok_or(AppError::Forbidden)?
        };

        // 3. E-mail único entre usuários e empresas
        if self.user_repo.email_in_use(&self.pool, &payload.email, None).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        // 4. Senha temporária
        let temporary_password = generate_password();
        let password_hash = hash_password(&temporary_password).await?;

        let user = self
            .user_repo
            .create(
                &self.pool,
                NewUser {
                    company_id: Some(company_id),
                    email: &payload.email,
                    username: &payload.username,
                    password_hash: &password_hash,
                    role: payload.role,
                    first_name: payload.first_name.as_deref(),
                    last_name: payload.last_name.as_deref(),
                    phone: payload.phone.as_deref(),
                    address: payload.address.as_deref(),
                    city: payload.city.as_deref(),
                    postal_code: payload.postal_code.as_deref(),
                    created_by: Some(actor.id),
                },
            )
            .await?;

        // 5. Credenciais por e-mail, em segundo plano
        dispatch(
            self.notifier.clone(),
            Notification::Credentials {
                to: user.email.clone(),
                display_name: user.display_name(),
                role: user.role.to_string(),
                temporary_password: temporary_password.clone(),
            },
            self.notify_timeout,
        );

        tracing::info!("👤 Usuário {} ({}) criado por {}", user.id, user.role, actor.id);
        Ok(UserWithCredentials { user, temporary_password })
    }

    pub async fn list_users(&self, actor: &Identity, role: Option<Role>) -> Result<Vec<User>, AppError> {
        let scope = if actor.role.is_tenant_global() {
            None
        } else {
            Some(actor.company_id.ok_or(AppError::Forbidden)?)
        };
        self.user_repo.list(&self.pool, scope, role).await
    }

    pub async fn get_user(&self, actor: &Identity, id: Uuid) -> Result<User, AppError> {
        self.load_visible(actor, id).await
    }

    pub async fn update_user(&self, actor: &Identity, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        let target = self.load_visible(actor, id).await?;
        ensure_can_manage(actor, target.role, target.company_id)?;

        // Trocar o papel exige poder criar o novo papel
        if let Some(role) = payload.role {
            if role != target.role {
                ensure_can_create(actor, role)?;
            }
        }

        if let Some(email) = &payload.email {
            if self.user_repo.email_in_use(&self.pool, email, Some(id)).await? {
                return Err(AppError::EmailAlreadyExists);
            }
        }

        self.user_repo
            .update(&self.pool, id, payload)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn delete_user(&self, actor: &Identity, id: Uuid) -> Result<(), AppError> {
        let target = self.load_visible(actor, id).await?;
        ensure_can_manage(actor, target.role, target.company_id)?;

        if !self.user_repo.delete(&self.pool, id).await? {
            return Err(AppError::NotFound("user"));
        }
        tracing::info!("🗑️ Usuário {} removido por {}", id, actor.id);
        Ok(())
    }

    /// Desativar um admin por aqui dispara a cascata do tenant.
    pub async fn set_status(&self, actor: &Identity, id: Uuid, is_active: bool) -> Result<User, AppError> {
        let target = self.load_visible(actor, id).await?;
        ensure_can_manage(actor, target.role, target.company_id)?;

        if !is_active && target.role == Role::Admin {
            self.tenant_service.cascade_deactivate_admin(id).await?;
            return self
                .user_repo
                .find_by_id(&self.pool, id)
                .await?
                .ok_or(AppError::NotFound("user"));
        }

        self.user_repo
            .set_active(&self.pool, id, is_active)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn reset_password(&self, actor: &Identity, id: Uuid) -> Result<UserWithCredentials, AppError> {
        let target = self.load_visible(actor, id).await?;
        ensure_can_manage(actor, target.role, target.company_id)?;

        let temporary_password = generate_password();
        let password_hash = hash_password(&temporary_password).await?;
        // Sessões abertas com a senha antiga caem junto
        self.user_repo
            .update_password(&self.pool, id, &password_hash, Utc::now())
            .await?;

        dispatch(
            self.notifier.clone(),
            Notification::PasswordReset {
                to: target.email.clone(),
                display_name: target.display_name(),
                temporary_password: temporary_password.clone(),
            },
            self.notify_timeout,
        );

        tracing::info!("🔁 Senha de {} redefinida por {}", id, actor.id);
        Ok(UserWithCredentials {
            user: target,
            temporary_password,
        })
    }

    // Usuário fora do tenant do ator = inexistente.
    async fn load_visible(&self, actor: &Identity, id: Uuid) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("user"))?;
        if user.id != actor.id {
            require_same_tenant(actor, user.company_id, "user")?;
        }
        Ok(user)
    }
}

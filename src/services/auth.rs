// src/services/auth.rs

use bcrypt::{hash, verify};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, UserRepository},
    models::{
        auth::{ActorKind, Identity},
        company::Company,
        role::Role,
        user::User,
    },
    services::token::{is_revoked, TokenCodec},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    codec: TokenCodec,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        codec: TokenCodec,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, company_repo, codec, pool }
    }

    /// Tenta primeiro a tabela de usuários e depois a de empresas.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        if let Some(user) = self.user_repo.find_by_email(email).await? {
            if !verify_password(password, &user.password_hash).await? {
                return Err(AppError::InvalidCredentials);
            }
            if !user.is_active {
                tracing::warn!("Login negado para usuário inativo {}", user.id);
                return Err(AppError::InvalidCredentials);
            }
            if let Some(company_id) = user.company_id {
                let company = self
                    .company_repo
                    .find_by_id(&self.pool, company_id)
                    .await?
                    .ok_or(AppError::InvalidCredentials)?;
                if !company.is_active {
                    tracing::warn!("Login negado: empresa {} inativa", company_id);
                    return Err(AppError::InvalidCredentials);
                }
            }
            return Ok(identity_of_user(&user));
        }

        let company = self
            .company_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &company.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !company.is_active {
            tracing::warn!("Login negado para empresa inativa {}", company.id);
            return Err(AppError::InvalidCredentials);
        }
        Ok(identity_of_company(&company))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Identity), AppError> {
        let identity = self.authenticate(email, password).await?;
        let token = self.codec.issue(&identity)?;
        tracing::info!("🔑 Login de {} ({})", identity.id, identity.role);
        Ok((token, identity))
    }

    /// Assinatura/expiração -> revogação do tenant -> conta ativa.
    pub async fn verify_token(&self, token: &str) -> Result<Identity, AppError> {
        // 1. Assinatura, expiração e claims
        let claims = self.codec.decode(token)?;

        // 2. Revogação em massa do tenant
        let company = match claims.company_id {
            Some(company_id) => {
                let company = self
                    .company_repo
                    .find_by_id(&self.pool, company_id)
                    .await?
                    .ok_or(AppError::InvalidToken)?;
                if is_revoked(claims.iat, company.token_invalidation_timestamp) {
                    tracing::warn!("Token revogado para {} (tenant {})", claims.sub, company_id);
                    return Err(AppError::InvalidToken);
                }
                if !company.is_active {
                    tracing::debug!("Token de tenant inativo {}", company_id);
                    return Err(AppError::InvalidToken);
                }
                Some(company)
            }
            None => None,
        };

        // 3. Conta ainda ativa
        match claims.kind {
            ActorKind::Owner => {
                let company = company.ok_or(AppError::InvalidToken)?;
                if company.id != claims.sub {
                    return Err(AppError::InvalidToken);
                }
                Ok(identity_of_company(&company))
            }
            ActorKind::Employee => {
                let user = self
                    .user_repo
                    .find_by_id(&self.pool, claims.sub)
                    .await?
                    .ok_or(AppError::InvalidToken)?;
                if !user.is_active || user.company_id != claims.company_id {
                    tracing::debug!("Token de usuário inativo ou movido {}", user.id);
                    return Err(AppError::InvalidToken);
                }
                if is_revoked(claims.iat, user.token_invalidation_timestamp) {
                    tracing::warn!("Token anterior ao reset de senha de {}", user.id);
                    return Err(AppError::InvalidToken);
                }
                Ok(identity_of_user(&user))
            }
        }
    }
}

pub fn identity_of_user(user: &User) -> Identity {
    Identity {
        id: user.id,
        email: user.email.clone(),
        display_name: user.display_name(),
        role: user.role,
        company_id: user.company_id,
        kind: ActorKind::Employee,
    }
}

// A empresa age como admin do próprio tenant.
pub fn identity_of_company(company: &Company) -> Identity {
    Identity {
        id: company.id,
        email: company.email.clone(),
        display_name: company.name.clone(),
        role: Role::Admin,
        company_id: Some(company.id),
        kind: ActorKind::Owner,
    }
}

// =============================================================================
//  SENHAS (bcrypt fora do runtime assíncrono)
// =============================================================================

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

/// Senha temporária para contas criadas por terceiros.
pub fn generate_password() -> String {
    use rand::{distributions::Alphanumeric, Rng};

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn generated_passwords_are_long_and_distinct() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn company_acts_as_admin_owner_of_itself() {
        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            siret: "12345678900012".into(),
            email: "contact@acme.fr".into(),
            password_hash: String::new(),
            phone: None,
            address: None,
            postal_code: None,
            city: None,
            is_active: true,
            token_invalidation_timestamp: None,
            created_at: now,
            updated_at: now,
        };
        let identity = identity_of_company(&company);
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.company_id, Some(company.id));
        assert!(identity.is_owner());
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("s3nh4-forte").await.unwrap();
        assert!(verify_password("s3nh4-forte", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
    }
}

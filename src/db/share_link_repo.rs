// src/db/share_link_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::share_link::ShareLink,
};

#[derive(Clone)]
pub struct ShareLinkRepository {
    pool: PgPool,
}

impl ShareLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
        can_add_appointments: bool,
        ip_whitelist: &[String],
        created_by: Uuid,
    ) -> Result<ShareLink, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let link = sqlx::query_as::<_, ShareLink>(
            r#"
            INSERT INTO share_links (
                company_id, technician_id, token, expires_at, can_add_appointments, ip_whitelist, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(token)
        .bind(expires_at)
        .bind(can_add_appointments)
        .bind(ip_whitelist)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(link)
    }

    pub async fn find<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<ShareLink>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let link = sqlx::query_as::<_, ShareLink>("SELECT * FROM share_links WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(link)
    }

    /// Acesso anônimo: links de tenant ou técnico inativo não existem.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<ShareLink>, AppError> {
        let link = sqlx::query_as::<_, ShareLink>(
            r#"
            SELECT s.* FROM share_links s
            WHERE s.token = $1
              AND EXISTS (
                  SELECT 1 FROM companies c
                  JOIN users u ON u.company_id = c.id
                  WHERE c.id = s.company_id AND c.is_active
                    AND u.id = s.technician_id AND u.is_active
              )
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        technician_id: Option<Uuid>,
        active_only: bool,
    ) -> Result<Vec<ShareLink>, AppError> {
        let links = sqlx::query_as::<_, ShareLink>(
            r#"
            SELECT * FROM share_links
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR technician_id = $2)
              AND (NOT $3 OR (is_active AND expires_at >= NOW()))
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    /// Valida e contabiliza o acesso em um único UPDATE atômico.
    /// `None` quando o link não existe, expirou, foi revogado, o IP não é permitido
    /// ou o tenant/técnico foi desativado.
    pub async fn consume<'e, E>(&self, executor: E, token: &str, client_ip: &str) -> Result<Option<ShareLink>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let link = sqlx::query_as::<_, ShareLink>(
            r#"
            UPDATE share_links
            SET access_count = access_count + 1, last_accessed_at = NOW()
            WHERE token = $1
              AND is_active
              AND expires_at >= NOW()
              AND (cardinality(ip_whitelist) = 0 OR $2 = ANY(ip_whitelist))
              AND EXISTS (
                  SELECT 1 FROM companies c
                  JOIN users u ON u.company_id = c.id
                  WHERE c.id = share_links.company_id AND c.is_active
                    AND u.id = share_links.technician_id AND u.is_active
              )
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(client_ip)
        .fetch_optional(executor)
        .await?;
        Ok(link)
    }

    pub async fn revoke<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        revoked_by: Uuid,
        reason: Option<&str>,
    ) -> Result<Option<ShareLink>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let link = sqlx::query_as::<_, ShareLink>(
            r#"
            UPDATE share_links
            SET is_active = FALSE, revoked_by = $3, revoked_at = NOW(), revocation_reason = $4
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(revoked_by)
        .bind(reason)
        .fetch_optional(executor)
        .await?;
        Ok(link)
    }

    /// Parte da cascata de desativação do tenant.
    pub async fn deactivate_all_in_company<'e, E>(&self, executor: E, company_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE share_links
            SET is_active = FALSE, revoked_at = NOW(), revocation_reason = 'tenant_deactivated'
            WHERE company_id = $1 AND is_active
            "#,
        )
        .bind(company_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}

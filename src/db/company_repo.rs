// src/db/company_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::company::{Company, CreateCompanyPayload, UpdateCompanyPayload},
};

// O repositório de empresas (tenants) e do log de revogações de token
#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(company)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;
        Ok(companies)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreateCompanyPayload,
        password_hash: &str,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, siret, email, password_hash, phone, address, postal_code, city)
            VALUES ($1, $2, lower($3), $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.siret)
        .bind(&payload.email)
        .bind(password_hash)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.postal_code)
        .bind(&payload.city)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateCompanyPayload,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                email = COALESCE(lower($3), email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                postal_code = COALESCE($6, postal_code),
                city = COALESCE($7, city),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.postal_code)
        .bind(&payload.city)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)
    }

    /// Desativa a empresa e grava o novo marco de invalidação de tokens.
    pub async fn deactivate<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        invalidated_at: DateTime<Utc>,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET is_active = FALSE, token_invalidation_timestamp = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(invalidated_at)
        .fetch_optional(executor)
        .await?;
        Ok(company)
    }

    // Reativa apenas a flag da empresa; o marco de invalidação continua valendo.
    pub async fn reactivate<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            "UPDATE companies SET is_active = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(company)
    }

    pub async fn record_revocation<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        revoked_before: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO token_revocations (company_id, revoked_before) VALUES ($1, $2)")
            .bind(company_id)
            .bind(revoked_before)
            .execute(executor)
            .await?;
        Ok(())
    }
}

// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        role::Role,
        user::{UpdateUserPayload, User},
    },
};

/// Dados já resolvidos para inserir um funcionário.
pub struct NewUser<'a> {
    pub company_id: Option<Uuid>,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub created_by: Option<Uuid>,
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Busca restrita ao tenant: fora dele o usuário simplesmente não existe.
    pub async fn find_in_tenant<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn find_active_technician<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id = $1 AND company_id = $2 AND role = 'technician' AND is_active = TRUE
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        company_id: Option<Uuid>,
        role: Option<Role>,
    ) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND ($2::user_role IS NULL OR role = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(role)
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    /// O e-mail é único entre usuários E empresas.
    pub async fn email_in_use<'e, E>(
        &self,
        executor: E,
        email: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (in_use,) = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2))
                OR EXISTS (SELECT 1 FROM companies WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2))
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;
        Ok(in_use)
    }

    pub async fn super_admin_exists(&self) -> Result<bool, AppError> {
        let (exists,) = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE role = 'super_admin')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                company_id, email, username, password_hash, role,
                first_name, last_name, phone, address, city, postal_code, created_by
            )
            VALUES ($1, lower($2), $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(new_user.company_id)
        .bind(new_user.email)
        .bind(new_user.username)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.phone)
        .bind(new_user.address)
        .bind(new_user.city)
        .bind(new_user.postal_code)
        .bind(new_user.created_by)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateUserPayload,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = COALESCE(lower($2), email),
                username = COALESCE($3, username),
                role = COALESCE($4, role),
                first_name = COALESCE($5, first_name),
                last_name = COALESCE($6, last_name),
                phone = COALESCE($7, phone),
                address = COALESCE($8, address),
                city = COALESCE($9, city),
                postal_code = COALESCE($10, postal_code),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.email)
        .bind(&payload.username)
        .bind(payload.role)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.postal_code)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn set_active<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    /// Desativa todos os usuários do tenant. Retorna quantos foram afetados.
    pub async fn deactivate_all_in_company<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE company_id = $1 AND is_active = TRUE",
        )
        .bind(company_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Troca a senha e invalida os tokens emitidos até `revoked_before`.
    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        password_hash: &str,
        revoked_before: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, token_invalidation_timestamp = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(revoked_before)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// src/db/prospect_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::prospect::{
        CommentType, CreateProspectPayload, ProcessingStatus, Prospect, ProspectComment,
        UpdateProspectPayload,
    },
};

// Em todas as consultas, `owner` restringe ao call center dono do prospect.
#[derive(Clone)]
pub struct ProspectRepository {
    pool: PgPool,
}

impl ProspectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PROSPECTS
    // =========================================================================

    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        call_center_id: Option<Uuid>,
        payload: &CreateProspectPayload,
    ) -> Result<Prospect, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prospect = sqlx::query_as::<_, Prospect>(
            r#"
            INSERT INTO prospects (
                company_id, call_center_id, first_name, last_name, email, phone_home, phone_mobile,
                address, city, postal_code, housing_type, annual_income, age, comments, processing_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(call_center_id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone_home)
        .bind(&payload.phone_mobile)
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.postal_code)
        .bind(&payload.housing_type)
        .bind(&payload.annual_income)
        .bind(payload.age)
        .bind(&payload.comments)
        .bind(payload.processing_status.unwrap_or_default())
        .fetch_one(executor)
        .await?;
        Ok(prospect)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Option<Prospect>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prospect = sqlx::query_as::<_, Prospect>(
            r#"
            SELECT * FROM prospects
            WHERE id = $1 AND company_id = $2 AND ($3::uuid IS NULL OR call_center_id = $3)
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(owner)
        .fetch_optional(executor)
        .await?;
        Ok(prospect)
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        owner: Option<Uuid>,
        status: Option<ProcessingStatus>,
    ) -> Result<Vec<Prospect>, AppError> {
        let prospects = sqlx::query_as::<_, Prospect>(
            r#"
            SELECT * FROM prospects
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR call_center_id = $2)
              AND ($3::processing_status IS NULL OR processing_status = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(owner)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(prospects)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
        payload: &UpdateProspectPayload,
    ) -> Result<Option<Prospect>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prospect = sqlx::query_as::<_, Prospect>(
            r#"
            UPDATE prospects SET
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                email = COALESCE($6, email),
                phone_home = COALESCE($7, phone_home),
                phone_mobile = COALESCE($8, phone_mobile),
                address = COALESCE($9, address),
                city = COALESCE($10, city),
                postal_code = COALESCE($11, postal_code),
                housing_type = COALESCE($12, housing_type),
                annual_income = COALESCE($13, annual_income),
                age = COALESCE($14, age),
                comments = COALESCE($15, comments),
                processing_status = COALESCE($16, processing_status),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND ($3::uuid IS NULL OR call_center_id = $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(owner)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone_home)
        .bind(&payload.phone_mobile)
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.postal_code)
        .bind(&payload.housing_type)
        .bind(&payload.annual_income)
        .bind(payload.age)
        .bind(&payload.comments)
        .bind(payload.processing_status)
        .fetch_optional(executor)
        .await?;
        Ok(prospect)
    }

    pub async fn delete<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM prospects WHERE id = $1 AND company_id = $2 AND ($3::uuid IS NULL OR call_center_id = $3)",
        )
        .bind(id)
        .bind(company_id)
        .bind(owner)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_status(
        &self,
        company_id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Vec<(ProcessingStatus, i64)>, AppError> {
        let counts = sqlx::query_as::<_, (ProcessingStatus, i64)>(
            r#"
            SELECT processing_status, COUNT(*) FROM prospects
            WHERE company_id = $1 AND ($2::uuid IS NULL OR call_center_id = $2)
            GROUP BY processing_status
            "#,
        )
        .bind(company_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    // =========================================================================
    //  COMENTÁRIOS
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_comment<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        prospect_id: Uuid,
        comment: &str,
        comment_type: CommentType,
        user_id: Uuid,
        user_name: &str,
    ) -> Result<ProspectComment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comment = sqlx::query_as::<_, ProspectComment>(
            r#"
            INSERT INTO prospect_comments (company_id, prospect_id, comment, comment_type, user_id, user_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(prospect_id)
        .bind(comment)
        .bind(comment_type)
        .bind(user_id)
        .bind(user_name)
        .fetch_one(executor)
        .await?;
        Ok(comment)
    }

    pub async fn list_comments<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        prospect_id: Uuid,
    ) -> Result<Vec<ProspectComment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comments = sqlx::query_as::<_, ProspectComment>(
            r#"
            SELECT * FROM prospect_comments
            WHERE company_id = $1 AND prospect_id = $2
            ORDER BY created_at
            "#,
        )
        .bind(company_id)
        .bind(prospect_id)
        .fetch_all(executor)
        .await?;
        Ok(comments)
    }
}

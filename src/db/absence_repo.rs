// src/db/absence_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::absence::{Absence, AbsenceType},
};

#[derive(Clone)]
pub struct AbsenceRepository {
    pool: PgPool,
}

impl AbsenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ausências do técnico que tocam o intervalo `[start, end]`.
    pub async fn find_overlapping<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Absence>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let absences = sqlx::query_as::<_, Absence>(
            r#"
            SELECT * FROM absences
            WHERE company_id = $1
              AND technician_id = $2
              AND start_date <= $4
              AND end_date >= $3
            ORDER BY start_date
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;
        Ok(absences)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
        title: &str,
        description: Option<&str>,
        absence_type: AbsenceType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Absence, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let absence = sqlx::query_as::<_, Absence>(
            r#"
            INSERT INTO absences (company_id, technician_id, title, description, absence_type, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(title)
        .bind(description)
        .bind(absence_type)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(executor)
        .await?;
        Ok(absence)
    }

    pub async fn find<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Absence>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let absence = sqlx::query_as::<_, Absence>("SELECT * FROM absences WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(absence)
    }

    pub async fn list(&self, company_id: Uuid, technician_id: Option<Uuid>) -> Result<Vec<Absence>, AppError> {
        let absences = sqlx::query_as::<_, Absence>(
            r#"
            SELECT * FROM absences
            WHERE company_id = $1 AND ($2::uuid IS NULL OR technician_id = $2)
            ORDER BY start_date DESC
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(absences)
    }

    pub async fn update<'e, E>(&self, executor: E, absence: &Absence) -> Result<Option<Absence>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Absence>(
            r#"
            UPDATE absences SET
                title = $3,
                description = $4,
                absence_type = $5,
                start_date = $6,
                end_date = $7,
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(absence.id)
        .bind(absence.company_id)
        .bind(&absence.title)
        .bind(&absence.description)
        .bind(absence.absence_type)
        .bind(absence.start_date)
        .bind(absence.end_date)
        .fetch_optional(executor)
        .await?;
        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM absences WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// src/db/simulator_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::simulator::{SimulatorSubmission, SimulatorSubmissionPayload},
};

#[derive(Clone)]
pub struct SimulatorRepository {
    pool: PgPool,
}

impl SimulatorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &SimulatorSubmissionPayload,
    ) -> Result<SimulatorSubmission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, SimulatorSubmission>(
            r#"
            INSERT INTO simulator_submissions (
                profile, housing, age, heating, radiator, energy, surface, works, sub_options,
                status, address, city, department, last_name, first_name, phone, email, consent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, lower($17), $18)
            RETURNING *
            "#,
        )
        .bind(&payload.profile)
        .bind(&payload.housing)
        .bind(&payload.age)
        .bind(&payload.heating)
        .bind(&payload.radiator)
        .bind(&payload.energy)
        .bind(&payload.surface)
        .bind(&payload.works)
        .bind(Json(&payload.sub_options))
        .bind(&payload.status)
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.department)
        .bind(&payload.last_name)
        .bind(&payload.first_name)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(payload.consent)
        .fetch_one(executor)
        .await?;
        Ok(submission)
    }

    pub async fn list(&self) -> Result<Vec<SimulatorSubmission>, AppError> {
        let submissions = sqlx::query_as::<_, SimulatorSubmission>(
            "SELECT * FROM simulator_submissions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<SimulatorSubmission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, SimulatorSubmission>("SELECT * FROM simulator_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(submission)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM simulator_submissions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

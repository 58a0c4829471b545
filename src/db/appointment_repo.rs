// src/db/appointment_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::appointment::{Appointment, AppointmentScope, AppointmentStatus, ContactSnapshot, ListAppointmentsQuery},
};

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CONCORRÊNCIA
    // =========================================================================

    /// Serializa verificação + escrita por técnico até o fim da transação.
    /// Só faz sentido quando o executor é uma transação.
    pub async fn lock_technician<'e, E>(&self, executor: E, technician_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(technician_id.to_string())
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Horários não cancelados do técnico dentro de `[start, end]`.
    pub async fn find_times_in_range<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<(Uuid, DateTime<Utc>)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            SELECT id, date_time FROM appointments
            WHERE company_id = $1
              AND technician_id = $2
              AND status <> 'cancelled'
              AND date_time BETWEEN $3 AND $4
              AND ($5::uuid IS NULL OR id <> $5)
            ORDER BY date_time
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
        prospect_id: Uuid,
        date_time: DateTime<Utc>,
        comment: Option<&str>,
        contact: &ContactSnapshot,
    ) -> Result<Appointment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (
                company_id, technician_id, prospect_id, date_time, comment,
                name, address, city, postal_code, phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(prospect_id)
        .bind(date_time)
        .bind(comment)
        .bind(&contact.name)
        .bind(&contact.address)
        .bind(&contact.city)
        .bind(&contact.postal_code)
        .bind(&contact.phone)
        .fetch_one(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        scope: AppointmentScope,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments a
            WHERE a.id = $1 AND a.company_id = $2
              AND ($3::uuid IS NULL OR a.technician_id = $3)
              AND ($4::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM prospects p WHERE p.id = a.prospect_id AND p.call_center_id = $4
              ))
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(scope.technician_id)
        .bind(scope.call_center_id)
        .fetch_optional(executor)
        .await?;
        Ok(appointment)
    }

    /// Mesmo filtro de `find`, travando a linha até o fim da transação.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        scope: AppointmentScope,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments a
            WHERE a.id = $1 AND a.company_id = $2
              AND ($3::uuid IS NULL OR a.technician_id = $3)
              AND ($4::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM prospects p WHERE p.id = a.prospect_id AND p.call_center_id = $4
              ))
            FOR UPDATE OF a
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(scope.technician_id)
        .bind(scope.call_center_id)
        .fetch_optional(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn list(
        &self,
        company_id: Uuid,
        scope: AppointmentScope,
        filter: &ListAppointmentsQuery,
    ) -> Result<Vec<Appointment>, AppError> {
        // O escopo do papel (técnico vê só a própria agenda) prevalece sobre o filtro.
        let technician_id = scope.technician_id.or(filter.technician_id);

        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments a
            WHERE a.company_id = $1
              AND ($2::uuid IS NULL OR a.technician_id = $2)
              AND ($3::appointment_status IS NULL OR a.status = $3)
              AND ($4::timestamptz IS NULL OR a.date_time >= $4)
              AND ($5::timestamptz IS NULL OR a.date_time <= $5)
              AND ($6::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM prospects p WHERE p.id = a.prospect_id AND p.call_center_id = $6
              ))
            ORDER BY a.date_time DESC
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(scope.call_center_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    /// Agenda pública do técnico (link de compartilhamento).
    pub async fn list_for_technician<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
    ) -> Result<Vec<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE company_id = $1 AND technician_id = $2 AND status <> 'cancelled'
            ORDER BY date_time
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .fetch_all(executor)
        .await?;
        Ok(appointments)
    }

    /// Compromissos não cancelados do técnico em `[from, to)`, em ordem cronológica.
    pub async fn list_for_technician_between<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE company_id = $1 AND technician_id = $2 AND status <> 'cancelled'
              AND date_time >= $3 AND date_time < $4
            ORDER BY date_time
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(appointments)
    }

    pub async fn count_by_status_between<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        technician_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(AppointmentStatus, i64)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counts = sqlx::query_as::<_, (AppointmentStatus, i64)>(
            r#"
            SELECT status, COUNT(*) FROM appointments
            WHERE company_id = $1 AND technician_id = $2
              AND date_time >= $3 AND date_time < $4
            GROUP BY status
            "#,
        )
        .bind(company_id)
        .bind(technician_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(counts)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        technician_id: Uuid,
        date_time: DateTime<Utc>,
        comment: Option<&str>,
        contact: &ContactSnapshot,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET
                technician_id = $3,
                date_time = $4,
                comment = $5,
                name = $6,
                address = $7,
                city = $8,
                postal_code = $9,
                phone = $10,
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(technician_id)
        .bind(date_time)
        .bind(comment)
        .bind(&contact.name)
        .bind(&contact.address)
        .bind(&contact.city)
        .bind(&contact.postal_code)
        .bind(&contact.phone)
        .fetch_optional(executor)
        .await?;
        Ok(appointment)
    }

    /// Grava só se o status ainda for `expected`; `None` quando outra escrita chegou antes.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET status = $4, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(expected)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(appointment)
    }

    pub async fn delete<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

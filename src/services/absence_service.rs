// src/services/absence_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AbsenceRepository, UserRepository},
    models::{
        absence::{Absence, CreateAbsencePayload, UpdateAbsencePayload},
        auth::Identity,
        role::Role,
    },
};

#[derive(Clone)]
pub struct AbsenceService {
    absence_repo: AbsenceRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl AbsenceService {
    pub fn new(absence_repo: AbsenceRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { absence_repo, user_repo, pool }
    }

    pub async fn create(
        &self,
        actor: &Identity,
        company_id: Uuid,
        payload: &CreateAbsencePayload,
    ) -> Result<Absence, AppError> {
        ensure_range(payload.start_date, payload.end_date)?;
        self.ensure_technician(company_id, payload.technician_id).await?;

        let absence = self
            .absence_repo
            .create(
                &self.pool,
                company_id,
                payload.technician_id,
                &payload.title,
                payload.description.as_deref(),
                payload.absence_type,
                payload.start_date,
                payload.end_date,
            )
            .await?;

        tracing::info!("🌴 Ausência {} registrada para {} por {}", absence.id, absence.technician_id, actor.id);
        Ok(absence)
    }

    pub async fn list(
        &self,
        actor: &Identity,
        company_id: Uuid,
        technician_id: Option<Uuid>,
    ) -> Result<Vec<Absence>, AppError> {
        let technician_id = if actor.role == Role::Technician {
            Some(actor.id)
        } else {
            technician_id
        };
        self.absence_repo.list(company_id, technician_id).await
    }

    pub async fn get(&self, actor: &Identity, company_id: Uuid, id: Uuid) -> Result<Absence, AppError> {
        let absence = self
            .absence_repo
            .find(&self.pool, company_id, id)
            .await?
            .ok_or(AppError::NotFound("absence"))?;

        if actor.role == Role::Technician && absence.technician_id != actor.id {
            return Err(AppError::NotFound("absence"));
        }
        Ok(absence)
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateAbsencePayload,
    ) -> Result<Absence, AppError> {
        let mut absence = self
            .absence_repo
            .find(&self.pool, company_id, id)
            .await?
            .ok_or(AppError::NotFound("absence"))?;

        if let Some(title) = &payload.title {
            absence.title = title.clone();
        }
        if payload.description.is_some() {
            absence.description = payload.description.clone();
        }
        if let Some(absence_type) = payload.absence_type {
            absence.absence_type = absence_type;
        }
        absence.start_date = payload.start_date.unwrap_or(absence.start_date);
        absence.end_date = payload.end_date.unwrap_or(absence.end_date);
        ensure_range(absence.start_date, absence.end_date)?;

        self.absence_repo
            .update(&self.pool, &absence)
            .await?
            .ok_or(AppError::NotFound("absence"))
    }

    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.absence_repo.delete(&self.pool, company_id, id).await? {
            return Err(AppError::NotFound("absence"));
        }
        Ok(())
    }

    async fn ensure_technician(&self, company_id: Uuid, technician_id: Uuid) -> Result<(), AppError> {
        self.user_repo
            .find_in_tenant(&self.pool, company_id, technician_id)
            .await?
            .filter(|user| user.role == Role::Technician)
            .map(|_| ())
            .ok_or(AppError::NotFound("technician"))
    }
}

fn ensure_range(start: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::InvalidInput("startDate deve ser anterior ou igual a endDate".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn inverted_range_is_rejected() {
        let now = Utc::now();
        assert!(ensure_range(now, now + Duration::days(2)).is_ok());
        assert!(ensure_range(now, now).is_ok());
        assert!(matches!(ensure_range(now, now - Duration::hours(1)), Err(AppError::InvalidInput(_))));
    }
}

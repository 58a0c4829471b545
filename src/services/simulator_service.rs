// src/services/simulator_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SimulatorRepository,
    middleware::rbac::require_any_role,
    models::{
        auth::Identity,
        role::Role,
        simulator::{SimulatorSubmission, SimulatorSubmissionPayload},
    },
};

/// Formulários do simulador: entrada pública, consulta restrita ao super_admin.
#[derive(Clone)]
pub struct SimulatorService {
    simulator_repo: SimulatorRepository,
    pool: PgPool,
}

impl SimulatorService {
    pub fn new(simulator_repo: SimulatorRepository, pool: PgPool) -> Self {
        Self { simulator_repo, pool }
    }

    pub async fn submit(&self, payload: &SimulatorSubmissionPayload) -> Result<SimulatorSubmission, AppError> {
        let submission = self.simulator_repo.create(&self.pool, payload).await?;
        tracing::info!("🧮 Simulação {} recebida ({})", submission.id, submission.department);
        Ok(submission)
    }

    pub async fn list(&self, actor: &Identity) -> Result<Vec<SimulatorSubmission>, AppError> {
        require_any_role(actor, &[Role::SuperAdmin])?;
        self.simulator_repo.list().await
    }

    pub async fn get(&self, actor: &Identity, id: Uuid) -> Result<SimulatorSubmission, AppError> {
        require_any_role(actor, &[Role::SuperAdmin])?;
        self.simulator_repo
            .find(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("simulator_submission"))
    }

    pub async fn delete(&self, actor: &Identity, id: Uuid) -> Result<(), AppError> {
        require_any_role(actor, &[Role::SuperAdmin])?;
        if !self.simulator_repo.delete(&self.pool, id).await? {
            return Err(AppError::NotFound("simulator_submission"));
        }
        tracing::info!("🗑️ Simulação {} removida por {}", id, actor.id);
        Ok(())
    }
}

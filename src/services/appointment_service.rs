// src/services/appointment_service.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AbsenceRepository, AppointmentRepository, ProspectRepository, UserRepository},
    middleware::rbac::{require_any_role, require_owner_or_role},
    models::{
        appointment::{
            Appointment, AppointmentScope, AppointmentStatus, AvailabilityRequest, AvailabilityResponse, ContactSnapshot,
            CreateAppointmentPayload, ListAppointmentsQuery, MonthlyScheduleStats, UpdateAppointmentPayload,
        },
        auth::Identity,
        prospect::{CreateProspectPayload, Prospect},
        role::Role,
        share_link::SharedAppointmentPayload,
    },
    services::scheduling::{find_conflict, month_range, ConflictReason, ConflictWindow},
};

const UPCOMING_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AppointmentService {
    appointment_repo: AppointmentRepository,
    absence_repo: AbsenceRepository,
    user_repo: UserRepository,
    prospect_repo: ProspectRepository,
    window: ConflictWindow,
    pool: PgPool,
}

impl AppointmentService {
    pub fn new(
        appointment_repo: AppointmentRepository,
        absence_repo: AbsenceRepository,
        user_repo: UserRepository,
        prospect_repo: ProspectRepository,
        window: ConflictWindow,
        pool: PgPool,
    ) -> Self {
        Self {
            appointment_repo,
            absence_repo,
            user_repo,
            prospect_repo,
            window,
            pool,
        }
    }

    // =========================================================================
    //  MOTOR DE CONFLITOS
    // =========================================================================

    /// `true` quando o horário colide com outro compromisso ou com uma ausência.
    pub async fn check_conflict(
        &self,
        technician_id: Uuid,
        at: DateTime<Utc>,
        company_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        let conflict = self
            .detect_conflict(&mut conn, company_id, technician_id, at, exclude_id)
            .await?;
        Ok(conflict.is_some())
    }

    async fn detect_conflict(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        technician_id: Uuid,
        at: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<ConflictReason>, AppError> {
        let range = self.window.search_range(at);
        let appointments = self
            .appointment_repo
            .find_times_in_range(&mut *conn, company_id, technician_id, range.start, range.end, exclude_id)
            .await?;

        let slot = self.window.around(at);
        let absences: Vec<_> = self
            .absence_repo
            .find_overlapping(&mut *conn, company_id, technician_id, slot.start, slot.end)
            .await?
            .into_iter()
            .map(|a| (a.id, a.start_date, a.end_date))
            .collect();

        Ok(find_conflict(&self.window, at, &appointments, &absences))
    }

    /// Consulta sem efeito colateral, exposta aos clientes.
    pub async fn check_availability(
        &self,
        company_id: Uuid,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResponse, AppError> {
        let mut conn = self.pool.acquire().await?;

        self.user_repo
            .find_active_technician(&mut *conn, company_id, request.technician_id)
            .await?
            .ok_or(AppError::NotFound("technician"))?;

        let conflict = self
            .detect_conflict(
                &mut conn,
                company_id,
                request.technician_id,
                request.date_time,
                request.exclude_appointment_id,
            )
            .await?;

        let slot = self.window.around(request.date_time);
        Ok(AvailabilityResponse {
            available: conflict.is_none(),
            conflict,
            window_start: slot.start,
            window_end: slot.end,
        })
    }

    // Trava o técnico e verifica; deve rodar dentro da transação da escrita.
    async fn lock_and_check(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        technician_id: Uuid,
        at: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        self.appointment_repo.lock_technician(&mut *conn, technician_id).await?;

        if let Some(reason) = self.detect_conflict(conn, company_id, technician_id, at, exclude_id).await? {
            tracing::info!("📅 Conflito para técnico {} em {}: {:?}", technician_id, at, reason);
            return Err(AppError::SchedulingConflict);
        }
        Ok(())
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn create(
        &self,
        actor: &Identity,
        company_id: Uuid,
        payload: &CreateAppointmentPayload,
    ) -> Result<Appointment, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Técnico e prospect precisam existir no tenant
        self.user_repo
            .find_active_technician(&mut *tx, company_id, payload.technician_id)
            .await?
            .ok_or(AppError::NotFound("technician"))?;

        let prospect = self
            .prospect_repo
            .find(&mut *tx, company_id, payload.prospect_id, AppointmentScope::for_identity(actor).call_center_id)
            .await?
            .ok_or(AppError::NotFound("prospect"))?;

        // 3. Trava + verificação de conflito
        self.lock_and_check(&mut tx, company_id, payload.technician_id, payload.date_time, None)
            .await?;

        // 4. Grava com a cópia dos dados de contato
        let contact = ContactSnapshot {
            name: payload.name.clone().unwrap_or_else(|| prospect.full_name()),
            address: payload.address.clone().unwrap_or_else(|| prospect.address.clone()),
            city: payload.city.clone().unwrap_or_else(|| prospect.city.clone()),
            postal_code: payload.postal_code.clone().unwrap_or_else(|| prospect.postal_code.clone()),
            phone: payload.phone.clone().unwrap_or_else(|| prospect.phone_mobile.clone()),
        };

        let appointment = self
            .appointment_repo
            .create(
                &mut *tx,
                company_id,
                payload.technician_id,
                prospect.id,
                payload.date_time,
                payload.comment.as_deref(),
                &contact,
            )
            .await?;

        tx.commit().await?;

        tracing::info!("📅 Compromisso {} criado por {}", appointment.id, actor.id);
        Ok(appointment)
    }

    pub async fn list(
        &self,
        actor: &Identity,
        company_id: Uuid,
        filter: &ListAppointmentsQuery,
    ) -> Result<Vec<Appointment>, AppError> {
        self.appointment_repo
            .list(company_id, AppointmentScope::for_identity(actor), filter)
            .await
    }

    pub async fn get(&self, actor: &Identity, company_id: Uuid, id: Uuid) -> Result<Appointment, AppError> {
        // Fora do escopo do papel o compromisso "não existe"
        self.appointment_repo
            .find(&self.pool, company_id, id, AppointmentScope::for_identity(actor))
            .await?
            .ok_or(AppError::NotFound("appointment"))
    }

    pub async fn update(
        &self,
        actor: &Identity,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateAppointmentPayload,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        // Linha travada: o status lido aqui não muda até o commit
        let current = self
            .appointment_repo
            .find_for_update(&mut *tx, company_id, id, AppointmentScope::for_identity(actor))
            .await?
            .ok_or(AppError::NotFound("appointment"))?;

        if current.status.is_terminal() {
            return Err(AppError::InvalidInput(format!(
                "compromisso {} não pode ser alterado",
                current.status.as_str()
            )));
        }

        let technician_id = payload.technician_id.unwrap_or(current.technician_id);
        let date_time = payload.date_time.unwrap_or(current.date_time);

        if technician_id != current.technician_id {
            self.user_repo
                .find_active_technician(&mut *tx, company_id, technician_id)
                .await?
                .ok_or(AppError::NotFound("technician"))?;
        }

        // Reagendamento: nova verificação, ignorando o próprio compromisso
        if technician_id != current.technician_id || date_time != current.date_time {
            self.lock_and_check(&mut tx, company_id, technician_id, date_time, Some(id))
                .await?;
        }

        let contact = ContactSnapshot {
            name: payload.name.clone().unwrap_or(current.name),
            address: payload.address.clone().unwrap_or(current.address),
            city: payload.city.clone().unwrap_or(current.city),
            postal_code: payload.postal_code.clone().unwrap_or(current.postal_code),
            phone: payload.phone.clone().unwrap_or(current.phone),
        };
        let comment = payload.comment.clone().or(current.comment);

        let updated = self
            .appointment_repo
            .update(&mut *tx, company_id, id, technician_id, date_time, comment.as_deref(), &contact)
            .await?
            .ok_or(AppError::NotFound("appointment"))?;

        tx.commit().await?;

        tracing::info!("📅 Compromisso {} atualizado por {}", id, actor.id);
        Ok(updated)
    }

    pub async fn update_status(
        &self,
        actor: &Identity,
        company_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .appointment_repo
            .find_for_update(&mut *tx, company_id, id, AppointmentScope::for_identity(actor))
            .await?
            .ok_or(AppError::NotFound("appointment"))?;

        // Call center só acompanha; quem muda o status é a gestão ou o próprio técnico
        require_owner_or_role(
            actor,
            Some(current.technician_id),
            &[Role::SuperAdmin, Role::Admin, Role::Agent],
        )?;

        if !current.status.transition_to(status)? {
            return Ok(current);
        }

        let updated = self
            .appointment_repo
            .update_status(&mut *tx, company_id, id, current.status, status)
            .await?
            .ok_or_else(|| AppError::InvalidStatusTransition {
                from: current.status.as_str().into(),
                to: status.as_str().into(),
            })?;

        tx.commit().await?;

        tracing::info!("📅 Compromisso {}: {} -> {}", id, current.status.as_str(), status.as_str());
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Identity, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.appointment_repo.delete(&self.pool, company_id, id).await? {
            return Err(AppError::NotFound("appointment"));
        }
        tracing::info!("🗑️ Compromisso {} removido por {}", id, actor.id);
        Ok(())
    }

    // =========================================================================
    //  AGENDA DO TÉCNICO
    // =========================================================================

    /// Próximos sete dias da agenda do próprio técnico.
    pub async fn upcoming(
        &self,
        actor: &Identity,
        company_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppError> {
        require_any_role(actor, &[Role::Technician])?;
        self.appointment_repo
            .list_for_technician_between(&self.pool, company_id, actor.id, now, now + Duration::days(UPCOMING_DAYS))
            .await
    }

    pub async fn monthly_stats(
        &self,
        actor: &Identity,
        company_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MonthlyScheduleStats, AppError> {
        require_any_role(actor, &[Role::Technician])?;

        let (start, end) =
            month_range(now).ok_or_else(|| AppError::InvalidInput("data fora do intervalo suportado".into()))?;
        let counts = self
            .appointment_repo
            .count_by_status_between(&self.pool, company_id, actor.id, start, end)
            .await?;

        Ok(MonthlyScheduleStats::from_counts(start.format("%Y-%m").to_string(), counts))
    }

    // =========================================================================
    //  AGENDAMENTO VIA LINK COMPARTILHADO
    // =========================================================================

    /// O contato vira um prospect do tenant e o compromisso é criado na mesma transação.
    pub async fn book_shared(
        &self,
        company_id: Uuid,
        technician_id: Uuid,
        payload: &SharedAppointmentPayload,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        self.user_repo
            .find_active_technician(&mut *tx, company_id, technician_id)
            .await?
            .ok_or(AppError::ShareLinkInvalid)?;

        self.lock_and_check(&mut tx, company_id, technician_id, payload.date_time, None)
            .await?;

        let prospect: Prospect = self
            .prospect_repo
            .create(&mut *tx, company_id, None, &prospect_from_shared(payload))
            .await?;

        let contact = ContactSnapshot {
            name: prospect.full_name(),
            address: prospect.address.clone(),
            city: prospect.city.clone(),
            postal_code: prospect.postal_code.clone(),
            phone: prospect.phone_mobile.clone(),
        };

        let appointment = self
            .appointment_repo
            .create(
                &mut *tx,
                company_id,
                technician_id,
                prospect.id,
                payload.date_time,
                payload.comment.as_deref(),
                &contact,
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🔗 Compromisso {} criado via link para técnico {}", appointment.id, technician_id);
        Ok(appointment)
    }
}

fn prospect_from_shared(payload: &SharedAppointmentPayload) -> CreateProspectPayload {
    CreateProspectPayload {
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        email: payload.email.clone(),
        phone_home: None,
        phone_mobile: payload.phone.clone(),
        address: payload.address.clone(),
        city: payload.city.clone(),
        postal_code: payload.postal_code.clone(),
        housing_type: None,
        annual_income: None,
        age: None,
        comments: payload.comment.clone(),
        processing_status: None,
        call_center_id: None,
    }
}

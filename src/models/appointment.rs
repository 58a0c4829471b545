// src/models/appointment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::{auth::Identity, role::Role};
use crate::services::scheduling::ConflictReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Created,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Created => "created",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Valida a transição. `Ok(false)` significa que nada muda (mesmo status).
    pub fn transition_to(self, next: AppointmentStatus) -> Result<bool, AppError> {
        use AppointmentStatus::*;

        if self.is_terminal() {
            return Err(AppError::InvalidStatusTransition {
                from: self.as_str().into(),
                to: next.as_str().into(),
            });
        }
        if self == next {
            return Ok(false);
        }
        match (self, next) {
            (Created, Confirmed) | (Confirmed, Completed) | (Created, Cancelled) | (Confirmed, Cancelled) => Ok(true),
            _ => Err(AppError::InvalidStatusTransition {
                from: self.as_str().into(),
                to: next.as_str().into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub technician_id: Uuid,
    pub prospect_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub comment: Option<String>,

    // Cópia dos dados de contato no momento da criação
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Visibilidade por papel: o técnico vê a própria agenda e o call center
/// apenas os compromissos dos prospects que são dele.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppointmentScope {
    pub technician_id: Option<Uuid>,
    pub call_center_id: Option<Uuid>,
}

impl AppointmentScope {
    pub fn for_identity(identity: &Identity) -> Self {
        match identity.role {
            Role::Technician => Self {
                technician_id: Some(identity.id),
                call_center_id: None,
            },
            Role::CallCenter => Self {
                technician_id: None,
                call_center_id: Some(identity.id),
            },
            Role::SuperAdmin | Role::Admin | Role::Agent => Self::default(),
        }
    }
}

/// Dados de contato gravados junto do compromisso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSnapshot {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentPayload {
    pub technician_id: Uuid,
    pub prospect_id: Uuid,
    pub date_time: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,

    // Opcionais: quando ausentes, são copiados do prospect
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentPayload {
    pub technician_id: Option<Uuid>,
    pub date_time: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatusPayload {
    pub status: AppointmentStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAppointmentsQuery {
    pub technician_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub technician_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    pub conflict: Option<ConflictReason>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Resumo do mês para o técnico.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyScheduleStats {
    /// `AAAA-MM`
    pub month: String,
    pub total: i64,
    pub created: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl MonthlyScheduleStats {
    pub fn from_counts(month: String, counts: impl IntoIterator<Item = (AppointmentStatus, i64)>) -> Self {
        let mut stats = MonthlyScheduleStats { month, ..Default::default() };
        for (status, count) in counts {
            match status {
                AppointmentStatus::Created => stats.created += count,
                AppointmentStatus::Confirmed => stats.confirmed += count,
                AppointmentStatus::Completed => stats.completed += count,
                AppointmentStatus::Cancelled => stats.cancelled += count,
            }
            stats.total += count;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::AppointmentStatus::*;
    use super::AppointmentScope;
    use crate::models::{
        auth::{ActorKind, Identity},
        role::Role,
    };
    use uuid::Uuid;

    fn who(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "x@acme.fr".into(),
            display_name: "X".into(),
            role,
            company_id: Some(Uuid::new_v4()),
            kind: ActorKind::Employee,
        }
    }

    #[test]
    fn scope_follows_role() {
        let tech = who(Role::Technician);
        assert_eq!(AppointmentScope::for_identity(&tech).technician_id, Some(tech.id));

        let cc = who(Role::CallCenter);
        let scope = AppointmentScope::for_identity(&cc);
        assert_eq!(scope.call_center_id, Some(cc.id));
        assert_eq!(scope.technician_id, None);

        for role in [Role::SuperAdmin, Role::Admin, Role::Agent] {
            assert_eq!(AppointmentScope::for_identity(&who(role)), AppointmentScope::default());
        }
    }

    #[test]
    fn forward_path_is_allowed() {
        assert!(Created.transition_to(Confirmed).unwrap());
        assert!(Confirmed.transition_to(Completed).unwrap());
        assert!(Created.transition_to(Cancelled).unwrap());
        assert!(Confirmed.transition_to(Cancelled).unwrap());
    }

    #[test]
    fn same_status_is_a_no_op() {
        assert!(!Created.transition_to(Created).unwrap());
        assert!(!Confirmed.transition_to(Confirmed).unwrap());
    }

    #[test]
    fn terminal_states_never_move() {
        for next in [Created, Confirmed, Completed, Cancelled] {
            assert!(Completed.transition_to(next).is_err());
            assert!(Cancelled.transition_to(next).is_err());
        }
    }

    #[test]
    fn cannot_skip_or_go_back() {
        assert!(Created.transition_to(Completed).is_err());
        assert!(Confirmed.transition_to(Created).is_err());
    }

    #[test]
    fn monthly_stats_sum_into_total() {
        let stats = super::MonthlyScheduleStats::from_counts(
            "2024-05".into(),
            [(Confirmed, 4), (Completed, 2), (Cancelled, 1)],
        );
        assert_eq!(stats.total, 7);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.month, "2024-05");
    }
}

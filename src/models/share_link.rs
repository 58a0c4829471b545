// src/models/share_link.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::appointment::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[default]
    Hours,
    Days,
    // Aproximação: um mês = 30 dias
    Months,
}

impl DurationUnit {
    /// `None` quando a quantidade não é positiva ou estoura o intervalo do chrono.
    pub fn span(self, amount: i64) -> Option<Duration> {
        if amount <= 0 {
            return None;
        }
        match self {
            DurationUnit::Hours => Duration::try_hours(amount),
            DurationUnit::Days => Duration::try_days(amount),
            DurationUnit::Months => amount.checked_mul(30).and_then(Duration::try_days),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub id: Uuid,
    pub company_id: Uuid,
    pub technician_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub can_add_appointments: bool,
    pub is_active: bool,
    pub ip_whitelist: Vec<String>,
    pub access_count: i32,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub revoked_by: Option<Uuid>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    /// Ativo e não expirado. Um link revogado se comporta como expirado.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now <= self.expires_at
    }

    /// Lista vazia libera qualquer IP.
    pub fn allows_ip(&self, ip: &str) -> bool {
        self.ip_whitelist.is_empty() || self.ip_whitelist.iter().any(|allowed| allowed == ip)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareLinkPayload {
    pub technician_id: Uuid,
    #[validate(range(min = 1, message = "A duração deve ser positiva."))]
    pub duration: i64,
    #[serde(default)]
    pub duration_unit: DurationUnit,
    #[serde(default)]
    pub can_add_appointments: bool,
    #[serde(default)]
    pub ip_whitelist: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RevokeShareLinkPayload {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListShareLinksQuery {
    pub technician_id: Option<Uuid>,
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    #[serde(flatten)]
    pub link: ShareLink,
    pub share_url: String,
    pub remaining_time: String,
}

/// Apenas os dados públicos do técnico.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianPublicProfile {
    pub id: Uuid,
    pub display_name: String,
    pub city: Option<String>,
}

/// Compromisso visto por quem tem o link: só horário, status e cidade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicAppointment {
    pub date_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub city: String,
}

impl From<Appointment> for PublicAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            date_time: appointment.date_time,
            status: appointment.status,
            city: appointment.city,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub technician: TechnicianPublicProfile,
    pub can_add_appointments: bool,
    pub expires_at: DateTime<Utc>,
    pub appointments: Vec<PublicAppointment>,
}

/// Agendamento feito por quem tem o link: o contato vira um novo prospect.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedAppointmentPayload {
    pub date_time: DateTime<Utc>,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "O telefone é obrigatório."))]
    pub phone: String,
    #[validate(length(min = 1, message = "O endereço é obrigatório."))]
    pub address: String,
    #[validate(length(min = 1, message = "A cidade é obrigatória."))]
    pub city: String,
    #[validate(length(min = 1, message = "O código postal é obrigatório."))]
    pub postal_code: String,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(is_active: bool, expires_at: DateTime<Utc>, whitelist: &[&str]) -> ShareLink {
        let now = Utc::now();
        ShareLink {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            technician_id: Uuid::new_v4(),
            token: "t".into(),
            expires_at,
            can_add_appointments: false,
            is_active,
            ip_whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
            access_count: 0,
            last_accessed_at: None,
            created_by: Uuid::new_v4(),
            revoked_by: None,
            revoked_at: None,
            revocation_reason: None,
            created_at: now,
        }
    }

    #[test]
    fn months_are_thirty_days() {
        assert_eq!(DurationUnit::Months.span(2), Some(Duration::days(60)));
        assert_eq!(DurationUnit::Hours.span(48), Some(Duration::hours(48)));
        assert_eq!(DurationUnit::Days.span(0), None);
        assert_eq!(DurationUnit::Days.span(-3), None);
    }

    #[test]
    fn expired_and_revoked_links_are_equally_unusable() {
        let now = Utc::now();
        let expired = link(true, now - Duration::hours(1), &[]);
        let revoked = link(false, now + Duration::hours(1), &[]);
        assert!(!expired.is_usable_at(now));
        assert!(!revoked.is_usable_at(now));
        assert!(link(true, now + Duration::hours(1), &[]).is_usable_at(now));
    }

    #[test]
    fn public_appointment_drops_contact_data() {
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            technician_id: Uuid::new_v4(),
            prospect_id: Uuid::new_v4(),
            date_time: now,
            status: AppointmentStatus::Confirmed,
            comment: Some("portão azul".into()),
            name: "Jean Secret".into(),
            address: "1 rue privee".into(),
            city: "Lyon".into(),
            postal_code: "69001".into(),
            phone: "0600000000".into(),
            created_at: now,
            updated_at: now,
        };

        let public = PublicAppointment::from(appointment);
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["city"], "Lyon");
        assert_eq!(json.as_object().unwrap().len(), 3);
        assert!(!json.to_string().contains("0600000000"));
    }

    #[test]
    fn whitelist_filters_only_when_present() {
        let now = Utc::now();
        assert!(link(true, now, &[]).allows_ip("10.0.0.1"));
        let restricted = link(true, now, &["192.168.1.10"]);
        assert!(restricted.allows_ip("192.168.1.10"));
        assert!(!restricted.allows_ip("10.0.0.1"));
    }
}

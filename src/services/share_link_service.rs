// src/services/share_link_service.rs

use std::net::IpAddr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AppointmentRepository, ShareLinkRepository, UserRepository},
    models::{
        appointment::Appointment,
        auth::Identity,
        share_link::{
            CalendarView, CreateShareLinkPayload, ListShareLinksQuery, PublicAppointment, ShareLink,
            ShareLinkResponse, SharedAppointmentPayload, TechnicianPublicProfile,
        },
    },
    services::appointment_service::AppointmentService,
};

/// 32 bytes do gerador do sistema operacional, em base64url sem padding (43 caracteres).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Tempo restante legível, em português ou inglês.
pub fn format_remaining_time(remaining: Duration, lang: &str) -> String {
    let pt = lang == "pt";
    if remaining <= Duration::zero() {
        return if pt { "Expirado".into() } else { "Expired".into() };
    }

    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;

    let unit = |n: i64, pt_one: &str, pt_many: &str, en_one: &str, en_many: &str| -> String {
        let word = match (pt, n > 1) {
            (true, false) => pt_one,
            (true, true) => pt_many,
            (false, false) => en_one,
            (false, true) => en_many,
        };
        format!("{n} {word}")
    };

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(unit(days, "dia", "dias", "day", "days"));
    }
    if hours > 0 {
        parts.push(unit(hours, "hora", "horas", "hour", "hours"));
    }
    // Minutos só aparecem quando falta menos de um dia
    if minutes > 0 && days == 0 {
        parts.push(unit(minutes, "minuto", "minutos", "minute", "minutes"));
    }

    if parts.is_empty() {
        return if pt { "Menos de um minuto".into() } else { "Less than a minute".into() };
    }
    parts.join(if pt { " e " } else { " and " })
}

/// Normaliza e valida a lista de IPs permitidos.
pub fn normalize_whitelist(ips: &[String]) -> Result<Vec<String>, AppError> {
    ips.iter()
        .map(|raw| {
            raw.trim()
                .parse::<IpAddr>()
                .map(|ip| ip.to_canonical().to_string())
                .map_err(|_| AppError::InvalidInput(format!("IP inválido: {raw}")))
        })
        .collect()
}

#[derive(Clone)]
pub struct ShareLinkService {
    share_link_repo: ShareLinkRepository,
    user_repo: UserRepository,
    appointment_repo: AppointmentRepository,
    appointment_service: AppointmentService,
    base_url: String,
    pool: PgPool,
}

impl ShareLinkService {
    pub fn new(
        share_link_repo: ShareLinkRepository,
        user_repo: UserRepository,
        appointment_repo: AppointmentRepository,
        appointment_service: AppointmentService,
        base_url: String,
        pool: PgPool,
    ) -> Self {
        Self {
            share_link_repo,
            user_repo,
            appointment_repo,
            appointment_service,
            base_url,
            pool,
        }
    }

    pub fn share_url(&self, token: &str) -> String {
        format!("{}/api/share/{}", self.base_url.trim_end_matches('/'), token)
    }

    pub fn to_response(&self, link: ShareLink, lang: &str, now: DateTime<Utc>) -> ShareLinkResponse {
        let remaining = if link.is_active { link.expires_at - now } else { Duration::zero() };
        ShareLinkResponse {
            share_url: self.share_url(&link.token),
            remaining_time: format_remaining_time(remaining, lang),
            link,
        }
    }

    pub async fn create(
        &self,
        actor: &Identity,
        company_id: Uuid,
        payload: &CreateShareLinkPayload,
    ) -> Result<ShareLink, AppError> {
        // 1. Duração positiva
        let span = payload
            .duration_unit
            .span(payload.duration)
            .ok_or_else(|| AppError::InvalidInput("duração inválida".into()))?;

        // 2. Técnico do mesmo tenant
        self.user_repo
            .find_active_technician(&self.pool, company_id, payload.technician_id)
            .await?
            .ok_or(AppError::NotFound("technician"))?;

        let whitelist = normalize_whitelist(&payload.ip_whitelist)?;

        // 3. Token aleatório + expiração
        let token = generate_token();
        let expires_at = Utc::now() + span;

        let link = self
            .share_link_repo
            .create(
                &self.pool,
                company_id,
                payload.technician_id,
                &token,
                expires_at,
                payload.can_add_appointments,
                &whitelist,
                actor.id,
            )
            .await?;

        tracing::info!(
            "🔗 Link {} criado para técnico {} por {} (expira em {})",
            link.id,
            link.technician_id,
            actor.id,
            link.expires_at
        );
        Ok(link)
    }

    pub async fn list(&self, company_id: Uuid, query: &ListShareLinksQuery) -> Result<Vec<ShareLink>, AppError> {
        self.share_link_repo
            .list(company_id, query.technician_id, query.active_only)
            .await
    }

    pub async fn get(&self, company_id: Uuid, id: Uuid) -> Result<ShareLink, AppError> {
        self.share_link_repo
            .find(&self.pool, company_id, id)
            .await?
            .ok_or(AppError::NotFound("share_link"))
    }

    pub async fn revoke(
        &self,
        actor: &Identity,
        company_id: Uuid,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<ShareLink, AppError> {
        let link = self
            .share_link_repo
            .revoke(&self.pool, company_id, id, actor.id, reason)
            .await?
            .ok_or(AppError::NotFound("share_link"))?;

        tracing::info!("🔒 Link {} revogado por {}", id, actor.id);
        Ok(link)
    }

    // =========================================================================
    //  ACESSO ANÔNIMO
    // =========================================================================

    /// Valida e contabiliza o acesso (um incremento por chamada bem-sucedida).
    pub async fn consume(&self, token: &str, client_ip: IpAddr) -> Result<CalendarView, AppError> {
        let ip = client_ip.to_canonical().to_string();

        let link = match self.share_link_repo.consume(&self.pool, token, &ip).await? {
            Some(link) => link,
            None => return Err(self.explain_rejection(token, &ip).await?),
        };

        let technician = self
            .user_repo
            .find_in_tenant(&self.pool, link.company_id, link.technician_id)
            .await?
            .ok_or(AppError::ShareLinkInvalid)?;

        let appointments: Vec<PublicAppointment> = self
            .appointment_repo
            .list_for_technician(&self.pool, link.company_id, link.technician_id)
            .await?
            .into_iter()
            .map(PublicAppointment::from)
            .collect();

        Ok(CalendarView {
            technician: TechnicianPublicProfile {
                id: technician.id,
                display_name: technician.display_name(),
                city: technician.city.clone(),
            },
            can_add_appointments: link.can_add_appointments,
            expires_at: link.expires_at,
            appointments,
        })
    }

    /// Agendamento anônimo; exige `can_add_appointments`.
    pub async fn book(
        &self,
        token: &str,
        client_ip: IpAddr,
        payload: &SharedAppointmentPayload,
    ) -> Result<Appointment, AppError> {
        let ip = client_ip.to_canonical().to_string();

        let link = self
            .share_link_repo
            .find_by_token(token)
            .await?
            .filter(|link| link.is_usable_at(Utc::now()))
            .ok_or(AppError::ShareLinkInvalid)?;

        if !link.allows_ip(&ip) {
            return Err(AppError::IpNotAllowed);
        }
        if !link.can_add_appointments {
            return Err(AppError::Forbidden);
        }

        self.appointment_service
            .book_shared(link.company_id, link.technician_id, payload)
            .await
    }

    // O UPDATE não devolve o motivo: IP bloqueado vira 403, o resto é "inválido".
    async fn explain_rejection(&self, token: &str, ip: &str) -> Result<AppError, AppError> {
        let existing = self.share_link_repo.find_by_token(token).await?;
        Ok(match existing {
            Some(link) if link.is_usable_at(Utc::now()) && !link.allows_ip(ip) => {
                tracing::warn!("IP {} bloqueado no link {}", ip, link.id);
                AppError::IpNotAllowed
            }
            _ => AppError::ShareLinkInvalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_43_url_safe_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn remaining_time_in_english() {
        let d = Duration::days(2) + Duration::hours(3) + Duration::minutes(10);
        assert_eq!(format_remaining_time(d, "en"), "2 days and 3 hours");
        assert_eq!(format_remaining_time(Duration::minutes(90), "en"), "1 hour and 30 minutes");
        assert_eq!(format_remaining_time(Duration::seconds(20), "en"), "Less than a minute");
        assert_eq!(format_remaining_time(Duration::seconds(-1), "en"), "Expired");
    }

    #[test]
    fn remaining_time_in_portuguese() {
        assert_eq!(format_remaining_time(Duration::days(1), "pt"), "1 dia");
        assert_eq!(format_remaining_time(Duration::hours(5), "pt"), "5 horas");
        assert_eq!(format_remaining_time(Duration::zero(), "pt"), "Expirado");
    }

    #[test]
    fn whitelist_is_validated_and_canonical() {
        let ips = vec!["192.168.0.1".to_string(), " ::ffff:10.0.0.2 ".to_string()];
        assert_eq!(normalize_whitelist(&ips).unwrap(), vec!["192.168.0.1", "10.0.0.2"]);
        assert!(normalize_whitelist(&["not-an-ip".to_string()]).is_err());
    }

    #[test]
    fn day_long_link_is_usable_at_hour_23_but_not_25() {
        use crate::models::share_link::DurationUnit;

        let created = Utc::now();
        let expires_at = created + DurationUnit::Hours.span(24).unwrap();
        let link = ShareLink {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            technician_id: Uuid::new_v4(),
            token: generate_token(),
            expires_at,
            can_add_appointments: false,
            is_active: true,
            ip_whitelist: vec![],
            access_count: 0,
            last_accessed_at: None,
            created_by: Uuid::new_v4(),
            revoked_by: None,
            revoked_at: None,
            revocation_reason: None,
            created_at: created,
        };
        assert!(link.is_usable_at(created + Duration::hours(23)));
        assert!(!link.is_usable_at(created + Duration::hours(25)));
    }
}

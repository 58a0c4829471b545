// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AbsenceRepository, AppointmentRepository, CompanyRepository, ProspectRepository, ShareLinkRepository,
        SimulatorRepository, UserRepository,
    },
    services::{
        absence_service::AbsenceService,
        appointment_service::AppointmentService,
        auth::AuthService,
        notification::{HttpNotifier, LogNotifier, Notifier},
        prospect_service::ProspectService,
        scheduling::ConflictWindow,
        share_link_service::ShareLinkService,
        simulator_service::SimulatorService,
        tenancy_service::TenantService,
        token::TokenCodec,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (`.env` incluído).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub token_ttl_hours: i64,
    pub conflict_before_minutes: i64,
    pub conflict_after_minutes: i64,
    pub share_base_url: String,
    pub notifier_url: Option<String>,
    pub notifier_timeout_secs: u64,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave/valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} deve ser definida"));

        let config = Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            token_ttl_hours: parse_or(&lookup, "TOKEN_TTL_HOURS", 24)?,
            conflict_before_minutes: parse_or(&lookup, "CONFLICT_WINDOW_BEFORE_MINUTES", 15)?,
            conflict_after_minutes: parse_or(&lookup, "CONFLICT_WINDOW_AFTER_MINUTES", 45)?,
            share_base_url: lookup("SHARE_BASE_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            notifier_url: lookup("NOTIFIER_URL").filter(|url| !url.trim().is_empty()),
            notifier_timeout_secs: parse_or(&lookup, "NOTIFIER_TIMEOUT_SECS", 10)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
        };

        if config.jwt_secret.is_empty() {
            return Err(anyhow!("JWT_SECRET não pode ser vazia"));
        }
        if config.token_ttl_hours <= 0 {
            return Err(anyhow!("TOKEN_TTL_HOURS deve ser positivo"));
        }
        if config.conflict_before_minutes < 0 || config.conflict_after_minutes < 0 {
            return Err(anyhow!("a janela de conflito não pode ser negativa"));
        }
        Ok(config)
    }

    pub fn conflict_window(&self) -> ConflictWindow {
        ConflictWindow::from_minutes(self.conflict_before_minutes, self.conflict_after_minutes)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} inválida: {raw}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub user_service: UserService,
    pub appointment_service: AppointmentService,
    pub absence_service: AbsenceService,
    pub prospect_service: ProspectService,
    pub share_link_service: ShareLinkService,
    pub simulator_service: SimulatorService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Self::from_pool(db_pool, config)
    }

    /// Monta o grafo de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, config: AppConfig) -> anyhow::Result<Self> {
        let notify_timeout = Duration::from_secs(config.notifier_timeout_secs);
        let notifier: Arc<dyn Notifier> = match &config.notifier_url {
            Some(url) => {
                tracing::info!("📧 Notificações via {}", url);
                Arc::new(HttpNotifier::new(url.clone(), notify_timeout)?)
            }
            None => {
                tracing::warn!("NOTIFIER_URL ausente: notificações apenas no log");
                Arc::new(LogNotifier)
            }
        };

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let appointment_repo = AppointmentRepository::new(db_pool.clone());
        let absence_repo = AbsenceRepository::new(db_pool.clone());
        let prospect_repo = ProspectRepository::new(db_pool.clone());
        let share_link_repo = ShareLinkRepository::new(db_pool.clone());

        // --- Serviços ---
        let codec = TokenCodec::new(&config.jwt_secret, chrono::Duration::hours(config.token_ttl_hours));
        let auth_service = AuthService::new(user_repo.clone(), company_repo.clone(), codec, db_pool.clone());
        let tenant_service = TenantService::new(
            company_repo.clone(),
            user_repo.clone(),
            share_link_repo.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(
            user_repo.clone(),
            company_repo,
            tenant_service.clone(),
            notifier,
            notify_timeout,
            db_pool.clone(),
        );
        let appointment_service = AppointmentService::new(
            appointment_repo.clone(),
            absence_repo.clone(),
            user_repo.clone(),
            prospect_repo.clone(),
            config.conflict_window(),
            db_pool.clone(),
        );
        let absence_service = AbsenceService::new(absence_repo, user_repo.clone(), db_pool.clone());
        let prospect_service = ProspectService::new(prospect_repo, user_repo.clone(), db_pool.clone());
        let simulator_service = SimulatorService::new(SimulatorRepository::new(db_pool.clone()), db_pool.clone());
        let share_link_service = ShareLinkService::new(
            share_link_repo,
            user_repo,
            appointment_repo,
            appointment_service.clone(),
            config.share_base_url.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            tenant_service,
            user_service,
            appointment_service,
            absence_service,
            prospect_service,
            share_link_service,
            simulator_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/agenda"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.conflict_window(), ConflictWindow::default());
        assert_eq!(config.notifier_url, None);
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/agenda")]));
        assert!(result.is_err());
    }

    #[test]
    fn window_is_configurable() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/agenda"),
            ("JWT_SECRET", "segredo"),
            ("CONFLICT_WINDOW_BEFORE_MINUTES", "30"),
            ("CONFLICT_WINDOW_AFTER_MINUTES", "60"),
        ]))
        .unwrap();
        assert_eq!(config.conflict_window(), ConflictWindow::from_minutes(30, 60));
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/agenda"),
            ("JWT_SECRET", "segredo"),
            ("TOKEN_TTL_HOURS", "muitas"),
        ]));
        assert!(result.is_err());
    }
}

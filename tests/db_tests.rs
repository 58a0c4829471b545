// Testes contra um Postgres real: cada `#[sqlx::test]` recebe um banco novo
// com as migrações de ./migrations aplicadas (requer DATABASE_URL).

use std::net::IpAddr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use agenda_backend::common::error::AppError;
use agenda_backend::config::{AppConfig, AppState};
use agenda_backend::db::ShareLinkRepository;
use agenda_backend::models::appointment::{Appointment, AppointmentStatus, ListAppointmentsQuery, UpdateAppointmentPayload};
use agenda_backend::models::auth::{ActorKind, Identity};
use agenda_backend::models::role::Role;
use agenda_backend::models::share_link::ShareLink;
use agenda_backend::services::auth::identity_of_user;
use agenda_backend::services::token::TokenCodec;

const SECRET: &str = "segredo-de-teste";

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        // O pool vem do sqlx::test; a URL não é usada
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        token_ttl_hours: 24,
        conflict_before_minutes: 15,
        conflict_after_minutes: 45,
        share_base_url: "http://localhost:3000".to_string(),
        notifier_url: None,
        notifier_timeout_secs: 1,
        db_max_connections: 5,
    }
}

fn state(pool: PgPool) -> AppState {
    AppState::from_pool(pool, test_config()).unwrap()
}

fn codec() -> TokenCodec {
    TokenCodec::new(SECRET, Duration::hours(24))
}

fn root() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "root@agenda.fr".to_string(),
        display_name: "Root".to_string(),
        role: Role::SuperAdmin,
        company_id: None,
        kind: ActorKind::Employee,
    }
}

fn admin_of(company_id: Uuid) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "admin@agenda.fr".to_string(),
        display_name: "Admin".to_string(),
        role: Role::Admin,
        company_id: Some(company_id),
        kind: ActorKind::Employee,
    }
}

fn ip() -> IpAddr {
    "203.0.113.7".parse().unwrap()
}

fn slot() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 5, 10, 9, 0, 0).unwrap()
}

async fn company(state: &AppState, name: &str) -> Uuid {
    let siret = format!("{:014}", Uuid::new_v4().as_u128() % 100_000_000_000_000);
    let payload = serde_json::from_value(json!({
        "name": name,
        "siret": siret,
        "email": format!("contato@{name}.fr"),
        "password": "senha-forte-123",
    }))
    .unwrap();
    state.tenant_service.create_company(&root(), &payload).await.unwrap().id
}

async fn employee(state: &AppState, admin: &Identity, role: Role, username: &str) -> Identity {
    let payload = serde_json::from_value(json!({
        "email": format!("{username}@agenda.fr"),
        "username": username,
        "role": role,
        "firstName": username,
    }))
    .unwrap();
    let created = state.user_service.create_user(admin, &payload).await.unwrap();
    identity_of_user(&created.user)
}

async fn prospect(state: &AppState, actor: &Identity, company_id: Uuid) -> Uuid {
    let payload = serde_json::from_value(json!({
        "firstName": "Marie",
        "lastName": "Curie",
        "phoneMobile": "0600000000",
        "address": "1 rue de Paris",
        "city": "Lyon",
        "postalCode": "69001",
    }))
    .unwrap();
    state.prospect_service.create(actor, company_id, &payload).await.unwrap().id
}

async fn appointment(
    state: &AppState,
    actor: &Identity,
    company_id: Uuid,
    technician_id: Uuid,
    prospect_id: Uuid,
    at: DateTime<Utc>,
) -> Result<Appointment, AppError> {
    let payload = serde_json::from_value(json!({
        "technicianId": technician_id,
        "prospectId": prospect_id,
        "dateTime": at,
    }))
    .unwrap();
    state.appointment_service.create(actor, company_id, &payload).await
}

async fn share_link(state: &AppState, admin: &Identity, company_id: Uuid, technician_id: Uuid) -> ShareLink {
    let payload = serde_json::from_value(json!({ "technicianId": technician_id, "duration": 2 })).unwrap();
    state.share_link_service.create(admin, company_id, &payload).await.unwrap()
}

// ── Tenant ──

#[sqlx::test]
async fn cascade_deactivation_revokes_tokens_users_and_share_links(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let link = share_link(&state, &admin, company_id, tech.id).await;

    let token = codec().issue_at(&tech, Utc::now() - Duration::hours(1)).unwrap();
    assert!(state.auth_service.verify_token(&token).await.is_ok());

    let report = state.tenant_service.cascade_deactivate_tenant(company_id).await.unwrap();
    assert_eq!(report.users_deactivated, 1);
    assert_eq!(report.share_links_revoked, 1);

    let result = state.auth_service.verify_token(&token).await;
    assert!(matches!(result, Err(AppError::InvalidToken)));

    let user = state.user_service.get_user(&root(), tech.id).await.unwrap();
    assert!(!user.is_active);

    let result = state.share_link_service.consume(&link.token, ip()).await;
    assert!(matches!(result, Err(AppError::ShareLinkInvalid)));
}

#[sqlx::test]
async fn share_link_of_deactivated_technician_stops_working(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let link = share_link(&state, &admin, company_id, tech.id).await;

    state.user_service.set_status(&admin, tech.id, false).await.unwrap();

    let result = state.share_link_service.consume(&link.token, ip()).await;
    assert!(matches!(result, Err(AppError::ShareLinkInvalid)));
}

#[sqlx::test]
async fn password_reset_rejects_previously_issued_token(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;

    let token = codec().issue_at(&tech, Utc::now() - Duration::hours(1)).unwrap();
    assert!(state.auth_service.verify_token(&token).await.is_ok());

    state.user_service.reset_password(&admin, tech.id).await.unwrap();

    let result = state.auth_service.verify_token(&token).await;
    assert!(matches!(result, Err(AppError::InvalidToken)));

    // Um token emitido depois do reset continua válido
    let fresh = codec().issue_at(&tech, Utc::now() + Duration::seconds(2)).unwrap();
    assert!(state.auth_service.verify_token(&fresh).await.is_ok());
}

#[sqlx::test]
async fn other_tenant_cannot_see_appointments_or_prospects(pool: PgPool) {
    let state = state(pool);
    let acme = company(&state, "acme").await;
    let globex = company(&state, "globex").await;
    let admin = admin_of(acme);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let prospect_id = prospect(&state, &admin, acme).await;
    let appt = appointment(&state, &admin, acme, tech.id, prospect_id, slot()).await.unwrap();

    let outsider = admin_of(globex);

    let result = state.appointment_service.get(&outsider, globex, appt.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let listed = state
        .appointment_service
        .list(&outsider, globex, &ListAppointmentsQuery::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    let result = state.prospect_service.get(&outsider, globex, prospect_id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // Técnico de outro tenant não pode receber o compromisso
    let result = appointment(&state, &outsider, globex, tech.id, prospect_id, slot()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

// ── Agenda ──

#[sqlx::test]
async fn concurrent_bookings_for_same_slot_admit_only_one(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let first = prospect(&state, &admin, company_id).await;
    let second = prospect(&state, &admin, company_id).await;

    let (a, b) = tokio::join!(
        appointment(&state, &admin, company_id, tech.id, first, slot()),
        appointment(&state, &admin, company_id, tech.id, second, slot() + Duration::minutes(10)),
    );

    let conflicts = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(AppError::SchedulingConflict)))
        .count();
    assert_eq!(conflicts, 1);
    assert!(a.is_ok() || b.is_ok());
}

#[sqlx::test]
async fn rescheduling_inside_own_window_does_not_conflict(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let prospect_id = prospect(&state, &admin, company_id).await;
    let appt = appointment(&state, &admin, company_id, tech.id, prospect_id, slot()).await.unwrap();

    let payload = UpdateAppointmentPayload {
        date_time: Some(slot() + Duration::minutes(10)),
        ..Default::default()
    };
    let updated = state
        .appointment_service
        .update(&admin, company_id, appt.id, &payload)
        .await
        .unwrap();
    assert_eq!(updated.date_time, slot() + Duration::minutes(10));
}

#[sqlx::test]
async fn call_center_only_reaches_appointments_of_its_prospects(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let owner = employee(&state, &admin, Role::CallCenter, "cc-a").await;
    let other = employee(&state, &admin, Role::CallCenter, "cc-b").await;
    let prospect_id = prospect(&state, &owner, company_id).await;
    let appt = appointment(&state, &owner, company_id, tech.id, prospect_id, slot()).await.unwrap();

    assert!(state.appointment_service.get(&owner, company_id, appt.id).await.is_ok());

    let result = state.appointment_service.get(&other, company_id, appt.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let listed = state
        .appointment_service
        .list(&other, company_id, &ListAppointmentsQuery::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    let payload = UpdateAppointmentPayload {
        comment: Some("remarcado".into()),
        ..Default::default()
    };
    let result = state.appointment_service.update(&other, company_id, appt.id, &payload).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = state
        .appointment_service
        .update_status(&other, company_id, appt.id, AppointmentStatus::Cancelled)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // Nem o dono muda o status: só acompanha
    let result = state
        .appointment_service
        .update_status(&owner, company_id, appt.id, AppointmentStatus::Cancelled)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[sqlx::test]
async fn concurrent_terminal_transitions_leave_one_winner(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let prospect_id = prospect(&state, &admin, company_id).await;
    let appt = appointment(&state, &admin, company_id, tech.id, prospect_id, slot()).await.unwrap();
    state
        .appointment_service
        .update_status(&admin, company_id, appt.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    let (completed, cancelled) = tokio::join!(
        state
            .appointment_service
            .update_status(&admin, company_id, appt.id, AppointmentStatus::Completed),
        state
            .appointment_service
            .update_status(&tech, company_id, appt.id, AppointmentStatus::Cancelled),
    );

    let winner = match (completed, cancelled) {
        (Ok(a), Err(AppError::InvalidStatusTransition { .. })) => a.status,
        (Err(AppError::InvalidStatusTransition { .. }), Ok(b)) => b.status,
        other => panic!("esperava exatamente um sucesso: {other:?}"),
    };

    let stored = state.appointment_service.get(&admin, company_id, appt.id).await.unwrap();
    assert_eq!(stored.status, winner);

    // Terminal também bloqueia reagendamento
    let payload = UpdateAppointmentPayload {
        date_time: Some(slot() + Duration::days(1)),
        ..Default::default()
    };
    let result = state.appointment_service.update(&admin, company_id, appt.id, &payload).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[sqlx::test]
async fn upcoming_schedule_covers_the_next_seven_days(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let soon = prospect(&state, &admin, company_id).await;
    let later = prospect(&state, &admin, company_id).await;
    let now = Utc::now();

    let near = appointment(&state, &admin, company_id, tech.id, soon, now + Duration::days(2))
        .await
        .unwrap();
    appointment(&state, &admin, company_id, tech.id, later, now + Duration::days(10))
        .await
        .unwrap();

    let upcoming = state.appointment_service.upcoming(&tech, company_id, now).await.unwrap();
    assert_eq!(upcoming.iter().map(|a| a.id).collect::<Vec<_>>(), vec![near.id]);

    let result = state.appointment_service.upcoming(&admin, company_id, now).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

// ── Links compartilhados ──

#[sqlx::test]
async fn consume_counts_each_access_once(pool: PgPool) {
    let state = state(pool);
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;
    let prospect_id = prospect(&state, &admin, company_id).await;
    appointment(&state, &admin, company_id, tech.id, prospect_id, slot()).await.unwrap();
    let link = share_link(&state, &admin, company_id, tech.id).await;

    let view = state.share_link_service.consume(&link.token, ip()).await.unwrap();
    assert_eq!(view.appointments.len(), 1);
    assert_eq!(view.technician.id, tech.id);

    let stored = state.share_link_service.get(company_id, link.id).await.unwrap();
    assert_eq!(stored.access_count, 1);
    assert!(stored.last_accessed_at.is_some());
}

#[sqlx::test]
async fn revoked_link_fails_exactly_like_expired_one(pool: PgPool) {
    let state = state(pool.clone());
    let company_id = company(&state, "acme").await;
    let admin = admin_of(company_id);
    let tech = employee(&state, &admin, Role::Technician, "tech").await;

    let revoked = share_link(&state, &admin, company_id, tech.id).await;
    state
        .share_link_service
        .revoke(&admin, company_id, revoked.id, Some("vazou"))
        .await
        .unwrap();

    let expired = ShareLinkRepository::new(pool.clone())
        .create(
            &pool,
            company_id,
            tech.id,
            "token-ja-expirado",
            Utc::now() - Duration::hours(1),
            false,
            &[],
            admin.id,
        )
        .await
        .unwrap();

    let from_revoked = state.share_link_service.consume(&revoked.token, ip()).await;
    let from_expired = state.share_link_service.consume(&expired.token, ip()).await;
    assert!(matches!(from_revoked, Err(AppError::ShareLinkInvalid)));
    assert!(matches!(from_expired, Err(AppError::ShareLinkInvalid)));

    // Falhas não contam acesso
    let stored = state.share_link_service.get(company_id, revoked.id).await.unwrap();
    assert_eq!(stored.access_count, 0);
}

// ── Simulador ──

#[sqlx::test]
async fn simulator_submission_keeps_sub_options(pool: PgPool) {
    let state = state(pool);
    let payload = serde_json::from_value(json!({
        "profile": "proprietaire",
        "housing": "maison",
        "age": "plus-15-ans",
        "heating": ["fioul"],
        "energy": "D",
        "surface": "100-150",
        "works": ["combles", "chauffage"],
        "subOptions": { "comblesType": ["perdus"], "chauffageType": ["pac-air-eau"] },
        "status": "modeste",
        "address": "1 rue de Paris",
        "city": "Lyon",
        "department": "69",
        "lastName": "Curie",
        "firstName": "Marie",
        "phone": "0600000000",
        "email": "marie@curie.fr",
        "consent": true,
    }))
    .unwrap();

    let created = state.simulator_service.submit(&payload).await.unwrap();
    let stored = state.simulator_service.get(&root(), created.id).await.unwrap();
    assert_eq!(stored.sub_options.combles_type, vec!["perdus".to_string()]);
    assert!(stored.sub_options.vmc_type.is_empty());
    assert_eq!(stored.works.len(), 2);

    let result = state.simulator_service.list(&admin_of(Uuid::new_v4())).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::create_super_admin,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::deactivate_company,
        handlers::companies::reactivate_company,

        // --- Users ---
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::update_user_status,
        handlers::users::reset_password,

        // --- Appointments ---
        handlers::appointments::create_appointment,
        handlers::appointments::list_appointments,
        handlers::appointments::get_appointment,
        handlers::appointments::update_appointment,
        handlers::appointments::update_appointment_status,
        handlers::appointments::delete_appointment,
        handlers::appointments::check_availability,

        // --- Absences ---
        handlers::absences::create_absence,
        handlers::absences::list_absences,
        handlers::absences::get_absence,
        handlers::absences::update_absence,
        handlers::absences::delete_absence,

        // --- Prospects ---
        handlers::prospects::create_prospect,
        handlers::prospects::list_prospects,
        handlers::prospects::prospect_stats,
        handlers::prospects::get_prospect,
        handlers::prospects::update_prospect,
        handlers::prospects::delete_prospect,
        handlers::prospects::list_comments,
        handlers::prospects::add_comment,

        // --- Share links ---
        handlers::share_links::create_share_link,
        handlers::share_links::list_share_links,
        handlers::share_links::get_share_link,
        handlers::share_links::revoke_share_link,
        handlers::share_links::view_shared_calendar,
        handlers::share_links::book_shared_appointment,

        // --- Schedule ---
        handlers::schedule::upcoming_schedule,
        handlers::schedule::monthly_stats,

        // --- Simulator ---
        handlers::simulator::submit_simulation,
        handlers::simulator::list_simulations,
        handlers::simulator::get_simulation,
        handlers::simulator::delete_simulation,
    ),
    components(
        schemas(
            handlers::health::HealthStatus,

            // --- Auth ---
            models::role::Role,
            models::auth::ActorKind,
            models::auth::Identity,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::CreateSuperAdminPayload,

            // --- Companies ---
            models::company::Company,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,
            models::company::DeactivationReport,

            // --- Users ---
            models::user::User,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,
            models::user::UpdateUserStatusPayload,
            models::user::UserWithCredentials,

            // --- Appointments ---
            models::appointment::AppointmentStatus,
            models::appointment::Appointment,
            models::appointment::CreateAppointmentPayload,
            models::appointment::UpdateAppointmentPayload,
            models::appointment::UpdateAppointmentStatusPayload,
            models::appointment::AvailabilityRequest,
            models::appointment::AvailabilityResponse,
            services::scheduling::ConflictReason,

            // --- Absences ---
            models::absence::AbsenceType,
            models::absence::Absence,
            models::absence::CreateAbsencePayload,
            models::absence::UpdateAbsencePayload,

            // --- Prospects ---
            models::prospect::ProcessingStatus,
            models::prospect::CommentType,
            models::prospect::Prospect,
            models::prospect::ProspectComment,
            models::prospect::CreateProspectPayload,
            models::prospect::UpdateProspectPayload,
            models::prospect::CreateCommentPayload,
            models::prospect::ProspectStats,

            // --- Share links ---
            models::share_link::DurationUnit,
            models::share_link::ShareLink,
            models::share_link::CreateShareLinkPayload,
            models::share_link::RevokeShareLinkPayload,
            models::share_link::ShareLinkResponse,
            models::share_link::TechnicianPublicProfile,
            models::share_link::PublicAppointment,
            models::share_link::CalendarView,
            models::share_link::SharedAppointmentPayload,

            // --- Schedule ---
            models::appointment::MonthlyScheduleStats,

            // --- Simulator ---
            models::simulator::SimulatorSubOptions,
            models::simulator::SimulatorSubmission,
            models::simulator::SimulatorSubmissionPayload,
            models::simulator::SimulatorReceipt,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Login e bootstrap do super admin"),
        (name = "Companies", description = "Gestão de empresas (tenants)"),
        (name = "Users", description = "Funcionários e hierarquia de papéis"),
        (name = "Appointments", description = "Agenda dos técnicos com detecção de conflito"),
        (name = "Absences", description = "Ausências dos técnicos"),
        (name = "Prospects", description = "Funil de prospects e comentários"),
        (name = "Share Links", description = "Links de agenda compartilhada"),
        (name = "Shared Calendar", description = "Acesso anônimo via link"),
        (name = "Schedule", description = "Agenda do próprio técnico"),
        (name = "Simulator", description = "Formulários do simulador de obras")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

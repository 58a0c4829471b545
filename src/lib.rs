// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Monta o router completo da API sobre um estado já construído.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/super-admin", post(handlers::auth::create_super_admin));

    // Agenda compartilhada: acesso anônimo pelo token do link
    let share_routes = Router::new()
        .route("/{token}", get(handlers::share_links::view_shared_calendar))
        .route("/{token}/appointments", post(handlers::share_links::book_shared_appointment));

    // Formulário público do simulador
    let simulator_public_routes = Router::new().route("/submit", post(handlers::simulator::submit_simulation));

    let simulator_routes = Router::new()
        .route("/submissions", get(handlers::simulator::list_simulations))
        .route(
            "/submissions/{id}",
            get(handlers::simulator::get_simulation).delete(handlers::simulator::delete_simulation),
        );

    let schedule_routes = Router::new()
        .route("/upcoming", get(handlers::schedule::upcoming_schedule))
        .route("/stats/monthly", get(handlers::schedule::monthly_stats));

    let company_routes = Router::new()
        .route(
            "/",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/{id}",
            get(handlers::companies::get_company).put(handlers::companies::update_company),
        )
        .route("/{id}/deactivate", post(handlers::companies::deactivate_company))
        .route("/{id}/reactivate", post(handlers::companies::reactivate_company));

    let user_routes = Router::new()
        .route("/", post(handlers::users::create_user).get(handlers::users::list_users))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/{id}/status", patch(handlers::users::update_user_status))
        .route("/{id}/reset-password", post(handlers::users::reset_password));

    let appointment_routes = Router::new()
        .route(
            "/",
            post(handlers::appointments::create_appointment).get(handlers::appointments::list_appointments),
        )
        .route("/availability", post(handlers::appointments::check_availability))
        .route(
            "/{id}",
            get(handlers::appointments::get_appointment)
                .put(handlers::appointments::update_appointment)
                .delete(handlers::appointments::delete_appointment),
        )
        .route("/{id}/status", put(handlers::appointments::update_appointment_status));

    let absence_routes = Router::new()
        .route(
            "/",
            post(handlers::absences::create_absence).get(handlers::absences::list_absences),
        )
        .route(
            "/{id}",
            get(handlers::absences::get_absence)
                .put(handlers::absences::update_absence)
                .delete(handlers::absences::delete_absence),
        );

    let prospect_routes = Router::new()
        .route(
            "/",
            post(handlers::prospects::create_prospect).get(handlers::prospects::list_prospects),
        )
        .route("/stats", get(handlers::prospects::prospect_stats))
        .route(
            "/{id}",
            get(handlers::prospects::get_prospect)
                .put(handlers::prospects::update_prospect)
                .delete(handlers::prospects::delete_prospect),
        )
        .route(
            "/{id}/comments",
            get(handlers::prospects::list_comments).post(handlers::prospects::add_comment),
        );

    let share_link_routes = Router::new()
        .route(
            "/",
            post(handlers::share_links::create_share_link).get(handlers::share_links::list_share_links),
        )
        .route("/{id}", get(handlers::share_links::get_share_link))
        .route("/{id}/revoke", put(handlers::share_links::revoke_share_link));

    // Tudo aqui exige um bearer token válido
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .nest("/companies", company_routes)
        .nest("/users", user_routes)
        .nest("/appointments", appointment_routes)
        .nest("/absences", absence_routes)
        .nest("/prospects", prospect_routes)
        .nest("/share-links", share_link_routes)
        .nest("/schedule", schedule_routes)
        .nest("/simulator", simulator_routes)
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/share", share_routes)
        .nest("/api/simulator", simulator_public_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

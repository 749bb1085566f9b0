use crate::handlers::{
    health::health_check,
    profiles::{get_profile, invite_candidates, list_profiles, update_profile},
    relationships::{
        accept_invitation, invitations_received, list_friends, redirect_to_profile,
        reject_invitation, remove_from_friends, send_invitation,
    },
    reports::create_report,
    users::{login, register, registration_form},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Login route, target of the registration redirect
pub const LOGIN_PATH: &str = "/api/v1/login";
/// Profile page route, default target of the mutation redirects
pub const PROFILE_PATH: &str = "/api/v1/profile";

/// Create application router with all routes and middleware
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Registration and login
        .route("/api/v1/register", get(registration_form).post(register))
        .route(LOGIN_PATH, post(login))
        // Profile page
        .route(PROFILE_PATH, get(get_profile).post(update_profile))
        // Profile listings
        .route("/api/v1/profiles", get(list_profiles))
        .route("/api/v1/profiles/to-invite", get(invite_candidates))
        // Invitations
        .route("/api/v1/invitations", get(invitations_received))
        .route(
            "/api/v1/invitations/send",
            post(send_invitation).get(redirect_to_profile),
        )
        .route(
            "/api/v1/invitations/accept",
            post(accept_invitation).get(redirect_to_profile),
        )
        .route(
            "/api/v1/invitations/reject",
            post(reject_invitation).get(redirect_to_profile),
        )
        // Friends
        .route("/api/v1/friends", get(list_friends))
        .route(
            "/api/v1/friends/remove",
            post(remove_from_friends).get(redirect_to_profile),
        )
        // Abuse reports
        .route("/api/v1/reports", post(create_report))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

use crate::auth::AuthConfig;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use common::{
    FieldErrors, LoginForm, ProfilePkForm, ProfileUpdateForm, ProfileUpdateRequest, RegisterForm,
    ReportForm, UserUpdateForm,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::handlers::{
    profiles::{
        ProfileListEntry, ProfileListResponse, ProfilePageResponse, ProfileResponse, RelationState,
        UserSummary,
    },
    relationships::{InvitationResponse, RelationshipResponse},
    reports::ReportResponse,
    users::{RegistrationFormResponse, TokenResponse, UserResponse},
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Access token settings
    pub auth: Arc<AuthConfig>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Per-field messages, present for validation errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// A `303 See Other` to `location`, still carrying the JSON envelope so
/// clients that do not follow redirects get the outcome and message.
#[derive(Debug)]
pub struct SeeOther<T> {
    pub location: String,
    pub body: ApiResponse<T>,
}

impl<T> SeeOther<T> {
    pub fn new(location: impl Into<String>, data: T, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            body: ApiResponse {
                data,
                message: message.into(),
                success: true,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for SeeOther<T> {
    fn into_response(self) -> Response {
        (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, self.location)],
            Json(self.body),
        )
            .into_response()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::registration_form,
        crate::handlers::users::register,
        crate::handlers::users::login,
        crate::handlers::profiles::get_profile,
        crate::handlers::profiles::update_profile,
        crate::handlers::profiles::list_profiles,
        crate::handlers::profiles::invite_candidates,
        crate::handlers::relationships::invitations_received,
        crate::handlers::relationships::send_invitation,
        crate::handlers::relationships::accept_invitation,
        crate::handlers::relationships::reject_invitation,
        crate::handlers::relationships::remove_from_friends,
        crate::handlers::relationships::list_friends,
        crate::handlers::reports::create_report,
    ),
    components(
        schemas(
            ApiResponse<UserResponse>,
            ApiResponse<TokenResponse>,
            ApiResponse<ProfilePageResponse>,
            ApiResponse<ProfileListResponse>,
            ApiResponse<Vec<ProfileResponse>>,
            ApiResponse<Vec<InvitationResponse>>,
            ApiResponse<RelationshipResponse>,
            ApiResponse<ReportResponse>,
            ErrorResponse,
            FieldErrors,
            HealthResponse,
            RegisterForm,
            LoginForm,
            UserUpdateForm,
            ProfileUpdateForm,
            ProfileUpdateRequest,
            ProfilePkForm,
            ReportForm,
            RegistrationFormResponse,
            TokenResponse,
            UserResponse,
            UserSummary,
            ProfileResponse,
            ProfilePageResponse,
            ProfileListEntry,
            ProfileListResponse,
            RelationState,
            InvitationResponse,
            RelationshipResponse,
            ReportResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Registration and login"),
        (name = "profiles", description = "Profile page and profile listings"),
        (name = "relationships", description = "Friend invitations and removal"),
        (name = "reports", description = "Abuse reports"),
    ),
    info(
        title = "SocialNet API",
        description = "User profiles, friend invitations and abuse reports",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the protected paths
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

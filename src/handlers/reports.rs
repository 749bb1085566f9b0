use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{NaiveDateTime, Utc};
use common::{ReportForm, validate_form};
use model::entities::{report, user};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;

/// Report response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportResponse {
    pub id: i32,
    pub author_id: i32,
    pub reported_user_id: i32,
    pub message: String,
    pub created_at: NaiveDateTime,
}

impl From<report::Model> for ReportResponse {
    fn from(model: report::Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            reported_user_id: model.reported_user_id,
            message: model.message,
            created_at: model.created_at,
        }
    }
}

/// Report another user for abuse
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    tag = "reports",
    security(("bearer" = [])),
    request_body = ReportForm,
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<ReportResponse>),
        (status = 400, description = "Invalid report", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Reported user not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, form), fields(reported_user_id = form.reported_user_id))]
pub async fn create_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<ReportForm>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponse>>), ApiError> {
    trace!("Entering create_report function");

    validate_form(&form).map_err(ApiError::Validation)?;
    if form.reported_user_id == auth.user_id {
        return Err(ApiError::field("reported_user_id", "You cannot report yourself."));
    }

    user::Entity::find_by_id(form.reported_user_id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let created = report::ActiveModel {
        author_id: Set(auth.user_id),
        reported_user_id: Set(form.reported_user_id),
        message: Set(form.message),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User ID {} reported user ID {} (report {})", created.author_id, created.reported_user_id, created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ReportResponse::from(created),
            message: "Report submitted".to_string(),
            success: true,
        }),
    ))
}

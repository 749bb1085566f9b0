use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::profiles::{ProfileResponse, load_caller_profile, with_owners};
use crate::router::PROFILE_PATH;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, SeeOther};
use axum::{
    extract::State,
    http::{HeaderMap, header::REFERER},
    response::{Json, Redirect},
};
use chrono::{NaiveDateTime, Utc};
use common::ProfilePkForm;
use model::entities::{
    profile,
    relationship::{self, RelationshipStatus},
};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Relationship response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelationshipResponse {
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    /// `send` while pending, then `accepted`
    pub status: String,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
}

impl From<relationship::Model> for RelationshipResponse {
    fn from(model: relationship::Model) -> Self {
        Self {
            id: model.id,
            sender_id: model.sender_id,
            receiver_id: model.receiver_id,
            status: model.status.to_value(),
            created: model.created,
            updated: model.updated,
        }
    }
}

/// A pending invitation addressed to the caller
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvitationResponse {
    pub id: i32,
    pub sender: ProfileResponse,
    pub status: String,
    pub created: NaiveDateTime,
}

/// Where a relationship mutation sends the client back to: the referring
/// page when the request names one, otherwise the profile page.
fn redirect_target(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|referer| !referer.is_empty())
        .unwrap_or(PROFILE_PATH)
        .to_string()
}

async fn load_other_profile<C: ConnectionTrait>(
    db: &C,
    profile_pk: i32,
) -> Result<profile::Model, ApiError> {
    profile::Entity::find_by_id(profile_pk)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Profile with ID {} not found", profile_pk);
            ApiError::NotFound("Profile")
        })
}

/// The pending invitation from `sender_id` to `receiver_id`, if any.
async fn pending_invitation<C: ConnectionTrait>(
    db: &C,
    sender_id: i32,
    receiver_id: i32,
) -> Result<relationship::Model, ApiError> {
    relationship::Entity::find_between(sender_id, receiver_id)
        .filter(relationship::Column::SenderId.eq(sender_id))
        .filter(relationship::Column::Status.eq(RelationshipStatus::Send))
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("No pending invitation from profile {} to profile {}", sender_id, receiver_id);
            ApiError::NotFound("Invitation")
        })
}

/// Answer for GET requests on the POST-only relationship routes
pub async fn redirect_to_profile() -> Redirect {
    Redirect::to(PROFILE_PATH)
}

/// List pending invitations addressed to the caller
#[utoipa::path(
    get,
    path = "/api/v1/invitations",
    tag = "relationships",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Invitations retrieved successfully", body = ApiResponse<Vec<InvitationResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn invitations_received(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InvitationResponse>>>, ApiError> {
    trace!("Entering invitations_received function for user ID {}", auth.user_id);

    let me = load_caller_profile(&state.db, &auth).await?;
    let invitations = relationship::Entity::invitations_received(me.id)
        .all(&state.db)
        .await?;
    debug!("Found {} pending invitations for profile {}", invitations.len(), me.id);

    let sender_ids: Vec<i32> = invitations.iter().map(|rel| rel.sender_id).collect();
    let senders = if sender_ids.is_empty() {
        Vec::new()
    } else {
        profile::Entity::find()
            .filter(profile::Column::Id.is_in(sender_ids))
            .all(&state.db)
            .await?
    };
    let senders: HashMap<i32, ProfileResponse> = with_owners(&state.db, senders)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let data = invitations
        .into_iter()
        .filter_map(|rel| {
            let sender = senders.get(&rel.sender_id)?.clone();
            Some(InvitationResponse {
                id: rel.id,
                sender,
                status: rel.status.to_value(),
                created: rel.created,
            })
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        message: "Invitations retrieved successfully".to_string(),
        success: true,
    }))
}

/// Send a friend invitation to another profile
#[utoipa::path(
    post,
    path = "/api/v1/invitations/send",
    tag = "relationships",
    security(("bearer" = [])),
    request_body = ProfilePkForm,
    responses(
        (status = 303, description = "Invitation sent, redirect back", body = ApiResponse<RelationshipResponse>),
        (status = 400, description = "Cannot invite yourself", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 409, description = "A relationship already exists", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn send_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ProfilePkForm>,
) -> Result<SeeOther<RelationshipResponse>, ApiError> {
    trace!("Entering send_invitation function");

    let sender = load_caller_profile(&state.db, &auth).await?;
    let receiver = load_other_profile(&state.db, form.profile_pk).await?;

    if sender.id == receiver.id {
        return Err(ApiError::BadRequest("You cannot invite yourself".to_string()));
    }

    if let Some(existing) = relationship::Entity::find_between(sender.id, receiver.id)
        .one(&state.db)
        .await?
    {
        debug!("Relationship {} already links profiles {} and {}", existing.id, sender.id, receiver.id);
        return Err(ApiError::Conflict(
            "A relationship with this profile already exists".to_string(),
        ));
    }

    let created = relationship::ActiveModel::invitation(sender.id, receiver.id, Utc::now().naive_utc())
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            // Lost a race against a concurrent invitation for the same pair
            Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::Conflict(
                "A relationship with this profile already exists".to_string(),
            ),
            _ => ApiError::Database(e),
        })?;

    info!("Profile {} invited profile {} (relationship {})", sender.id, receiver.id, created.id);
    Ok(SeeOther::new(
        redirect_target(&headers),
        RelationshipResponse::from(created),
        "Invitation sent",
    ))
}

/// Accept a pending invitation sent by another profile
#[utoipa::path(
    post,
    path = "/api/v1/invitations/accept",
    tag = "relationships",
    security(("bearer" = [])),
    request_body = ProfilePkForm,
    responses(
        (status = 303, description = "Invitation accepted, redirect back", body = ApiResponse<RelationshipResponse>),
        (status = 404, description = "Profile or invitation not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn accept_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ProfilePkForm>,
) -> Result<SeeOther<RelationshipResponse>, ApiError> {
    trace!("Entering accept_invitation function");

    let me = load_caller_profile(&state.db, &auth).await?;
    let sender = load_other_profile(&state.db, form.profile_pk).await?;
    let invitation = pending_invitation(&state.db, sender.id, me.id).await?;

    let mut active: relationship::ActiveModel = invitation.into();
    active.status = Set(RelationshipStatus::Accepted);
    active.updated = Set(Utc::now().naive_utc());
    let accepted = active.update(&state.db).await?;

    info!("Profile {} accepted the invitation of profile {}", me.id, sender.id);
    Ok(SeeOther::new(
        redirect_target(&headers),
        RelationshipResponse::from(accepted),
        "Invitation accepted",
    ))
}

/// Reject a pending invitation sent by another profile
#[utoipa::path(
    post,
    path = "/api/v1/invitations/reject",
    tag = "relationships",
    security(("bearer" = [])),
    request_body = ProfilePkForm,
    responses(
        (status = 303, description = "Invitation rejected, redirect back", body = ApiResponse<String>),
        (status = 404, description = "Profile or invitation not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn reject_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ProfilePkForm>,
) -> Result<SeeOther<String>, ApiError> {
    trace!("Entering reject_invitation function");

    let me = load_caller_profile(&state.db, &auth).await?;
    let sender = load_other_profile(&state.db, form.profile_pk).await?;
    let invitation = pending_invitation(&state.db, sender.id, me.id).await?;

    let relationship_id = invitation.id;
    invitation.delete(&state.db).await?;

    info!("Profile {} rejected the invitation of profile {}", me.id, sender.id);
    Ok(SeeOther::new(
        redirect_target(&headers),
        format!("Relationship {} deleted", relationship_id),
        "Invitation rejected",
    ))
}

/// Remove the relationship between the caller and another profile
///
/// Works from either side, whoever sent the original invitation.
#[utoipa::path(
    post,
    path = "/api/v1/friends/remove",
    tag = "relationships",
    security(("bearer" = [])),
    request_body = ProfilePkForm,
    responses(
        (status = 303, description = "Relationship removed, redirect back", body = ApiResponse<String>),
        (status = 404, description = "Profile or relationship not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn remove_from_friends(
    auth: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ProfilePkForm>,
) -> Result<SeeOther<String>, ApiError> {
    trace!("Entering remove_from_friends function");

    let me = load_caller_profile(&state.db, &auth).await?;
    let other = load_other_profile(&state.db, form.profile_pk).await?;

    let existing = relationship::Entity::find_between(me.id, other.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("No relationship between profiles {} and {}", me.id, other.id);
            ApiError::NotFound("Relationship")
        })?;

    let relationship_id = existing.id;
    let result = existing.delete(&state.db).await?;
    debug!("Delete operation completed. Rows affected: {}", result.rows_affected);

    info!("Relationship {} between profiles {} and {} removed", relationship_id, me.id, other.id);
    Ok(SeeOther::new(
        redirect_target(&headers),
        format!("Relationship {} deleted", relationship_id),
        "Removed from friends",
    ))
}

/// List the caller's friends
#[utoipa::path(
    get,
    path = "/api/v1/friends",
    tag = "relationships",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Friends retrieved successfully", body = ApiResponse<Vec<ProfileResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_friends(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProfileResponse>>>, ApiError> {
    trace!("Entering list_friends function for user ID {}", auth.user_id);

    let me = load_caller_profile(&state.db, &auth).await?;
    let friends = me.friends(&state.db).await?;
    let friends = with_owners(&state.db, friends).await?;

    Ok(Json(ApiResponse {
        data: friends,
        message: "Friends retrieved successfully".to_string(),
        success: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_redirect_target_prefers_referer() {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("/api/v1/profiles"));
        assert_eq!(redirect_target(&headers), "/api/v1/profiles");
    }

    #[test]
    fn test_redirect_target_falls_back_to_profile() {
        assert_eq!(redirect_target(&HeaderMap::new()), PROFILE_PATH);
    }
}

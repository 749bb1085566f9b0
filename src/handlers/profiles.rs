use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::users::{USERNAME_TAKEN, username_conflict, username_taken};
use crate::router::PROFILE_PATH;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, SeeOther};
use axum::{extract::State, response::Json};
use chrono::{NaiveDateTime, Utc};
use common::{FieldErrors, ProfileUpdateRequest};
use model::entities::{
    profile,
    relationship::{self, RelationshipStatus},
    user,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Public view of a profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub image: String,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
}

impl ProfileResponse {
    pub fn new(profile: profile::Model, owner: &user::Model) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            username: owner.username.clone(),
            image: profile.image,
            created: profile.created,
            updated: profile.updated,
        }
    }
}

/// The caller's own profile page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfilePageResponse {
    pub profile: ProfileResponse,
    pub email: String,
}

/// Minimal user reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
}

/// Relationship between a listed profile and the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationState {
    None,
    /// The caller invited this profile
    InvitationSent,
    /// This profile invited the caller
    InvitationReceived,
    Friends,
}

impl RelationState {
    fn of(rel: Option<&relationship::Model>, me: i32) -> Self {
        match rel {
            None => RelationState::None,
            Some(rel) if rel.status == RelationshipStatus::Accepted => RelationState::Friends,
            Some(rel) if rel.is_sent_by(me) => RelationState::InvitationSent,
            Some(_) => RelationState::InvitationReceived,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileListEntry {
    pub profile: ProfileResponse,
    pub relationship: RelationState,
}

/// All other profiles, annotated relative to the caller
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileListResponse {
    pub profiles: Vec<ProfileListEntry>,
    /// Users the caller sent a relationship to
    pub sent: Vec<UserSummary>,
    /// Users who sent a relationship to the caller
    pub received: Vec<UserSummary>,
    /// True when there is no other profile to show
    pub is_empty: bool,
}

/// Splits the caller's relationships into the profile ids they were sent to
/// and the profile ids they were received from.
pub(crate) fn partition_relationships(
    me: i32,
    relationships: &[relationship::Model],
) -> (Vec<i32>, Vec<i32>) {
    let mut sent = Vec::new();
    let mut received = Vec::new();
    for rel in relationships {
        if rel.is_sent_by(me) {
            sent.push(rel.receiver_id);
        } else if rel.is_received_by(me) {
            received.push(rel.sender_id);
        }
    }
    (sent, received)
}

/// Load the caller's profile
pub(crate) async fn load_caller_profile<C: ConnectionTrait>(
    db: &C,
    auth: &AuthUser,
) -> Result<profile::Model, ApiError> {
    profile::Entity::find_by_user(auth.user_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("No profile for user ID {}", auth.user_id);
            ApiError::NotFound("Profile")
        })
}

/// Attach owner usernames to profiles, keeping their order
pub(crate) async fn with_owners<C: ConnectionTrait>(
    db: &C,
    profiles: Vec<profile::Model>,
) -> Result<Vec<ProfileResponse>, DbErr> {
    if profiles.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i32> = profiles.iter().map(|p| p.user_id).collect();
    let owners: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(profiles
        .into_iter()
        .filter_map(|p| {
            let owner = owners.get(&p.user_id)?;
            Some(ProfileResponse::new(p, owner))
        })
        .collect())
}

/// Get the caller's profile page
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfilePageResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProfilePageResponse>>, ApiError> {
    trace!("Entering get_profile function for user ID {}", auth.user_id);

    let owner = user::Entity::find_by_id(auth.user_id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let my_profile = load_caller_profile(&state.db, &auth).await?;

    debug!("Loaded profile ID {} for user ID {}", my_profile.id, owner.id);
    Ok(Json(ApiResponse {
        data: ProfilePageResponse {
            email: owner.email.clone(),
            profile: ProfileResponse::new(my_profile, &owner),
        },
        message: "Profile retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update the caller's identity fields and picture
///
/// Both forms are validated; nothing is saved unless both are valid.
#[utoipa::path(
    post,
    path = "/api/v1/profile",
    tag = "profiles",
    security(("bearer" = [])),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 303, description = "Profile updated, redirect to the profile page", body = ApiResponse<ProfilePageResponse>),
        (status = 400, description = "One of the forms is invalid", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<SeeOther<ProfilePageResponse>, ApiError> {
    trace!("Entering update_profile function for user ID {}", auth.user_id);

    let mut errors = request.validate_all().err().unwrap_or_else(FieldErrors::new);
    if !errors.contains("user.username")
        && username_taken(&state.db, &request.user.username, Some(auth.user_id)).await?
    {
        errors.add("user.username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        debug!("Profile update rejected, nothing saved: {:?}", errors);
        return Err(ApiError::Validation(errors));
    }

    let txn = state.db.begin().await?;

    let existing_user = user::Entity::find_by_id(auth.user_id)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let existing_profile = load_caller_profile(&txn, &auth).await?;

    let mut user_active: user::ActiveModel = existing_user.into();
    user_active.username = Set(request.user.username.clone());
    user_active.email = Set(request.user.email.clone());
    let updated_user = user_active
        .update(&txn)
        .await
        .map_err(|e| username_conflict("user.username", e))?;

    let mut profile_active: profile::ActiveModel = existing_profile.into();
    profile_active.image = Set(request.profile.image.clone());
    profile_active.updated = Set(Utc::now().naive_utc());
    let updated_profile = profile_active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "User ID {} updated: username={}, image={}",
        updated_user.id, updated_user.username, updated_profile.image
    );
    let page = ProfilePageResponse {
        email: updated_user.email.clone(),
        profile: ProfileResponse::new(updated_profile, &updated_user),
    };
    Ok(SeeOther::new(PROFILE_PATH, page, "Account updated!"))
}

/// List every other profile with its relationship to the caller
#[utoipa::path(
    get,
    path = "/api/v1/profiles",
    tag = "profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profiles retrieved successfully", body = ApiResponse<ProfileListResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_profiles(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProfileListResponse>>, ApiError> {
    trace!("Entering list_profiles function for user ID {}", auth.user_id);

    let me = load_caller_profile(&state.db, &auth).await?;
    let others = profile::Entity::find_all_except_user(auth.user_id)
        .all(&state.db)
        .await?;
    let others = with_owners(&state.db, others).await?;
    let relationships = relationship::Entity::involving(me.id)
        .all(&state.db)
        .await?;
    debug!(
        "Found {} other profiles and {} relationships",
        others.len(),
        relationships.len()
    );

    let by_other_party: HashMap<i32, &relationship::Model> = relationships
        .iter()
        .map(|rel| (rel.other_party(me.id), rel))
        .collect();
    let summaries: HashMap<i32, UserSummary> = others
        .iter()
        .map(|p| {
            (
                p.id,
                UserSummary {
                    id: p.user_id,
                    username: p.username.clone(),
                },
            )
        })
        .collect();

    let (sent_ids, received_ids) = partition_relationships(me.id, &relationships);
    let to_summaries = |ids: Vec<i32>| -> Vec<UserSummary> {
        ids.iter()
            .filter_map(|id| summaries.get(id).cloned())
            .collect()
    };
    let sent = to_summaries(sent_ids);
    let received = to_summaries(received_ids);

    let is_empty = others.is_empty();
    let profiles = others
        .into_iter()
        .map(|p| ProfileListEntry {
            relationship: RelationState::of(by_other_party.get(&p.id).copied(), me.id),
            profile: p,
        })
        .collect();

    info!("Listed profiles for user ID {}, empty: {}", auth.user_id, is_empty);
    Ok(Json(ApiResponse {
        data: ProfileListResponse {
            profiles,
            sent,
            received,
            is_empty,
        },
        message: "Profiles retrieved successfully".to_string(),
        success: true,
    }))
}

/// List the profiles the caller is not connected with yet
#[utoipa::path(
    get,
    path = "/api/v1/profiles/to-invite",
    tag = "profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Candidates retrieved successfully", body = ApiResponse<Vec<ProfileResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn invite_candidates(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProfileResponse>>>, ApiError> {
    trace!("Entering invite_candidates function for user ID {}", auth.user_id);

    let me = load_caller_profile(&state.db, &auth).await?;
    let candidates = me.profiles_to_invite(&state.db).await?;
    let candidates = with_owners(&state.db, candidates).await?;

    info!("Found {} profiles to invite for user ID {}", candidates.len(), auth.user_id);
    Ok(Json(ApiResponse {
        data: candidates,
        message: "Profiles to invite retrieved successfully".to_string(),
        success: true,
    }))
}

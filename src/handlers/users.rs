use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::router::LOGIN_PATH;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, SeeOther};
use axum::{extract::State, response::Json};
use chrono::{NaiveDateTime, Utc};
use common::{FieldErrors, LoginForm, RegisterForm, validate_form};
use model::entities::{profile, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

pub(crate) const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Fields of the registration form, returned to render an empty form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationFormResponse {
    pub title: String,
    pub fields: Vec<String>,
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub date_joined: NaiveDateTime,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            date_joined: model.date_joined,
        }
    }
}

/// Access token issued on login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Whether `username` is used by a user other than `exclude_user_id`, ignoring case.
pub(crate) async fn username_taken<C: ConnectionTrait>(
    db: &C,
    username: &str,
    exclude_user_id: Option<i32>,
) -> Result<bool, DbErr> {
    let mut query = user::Entity::find_by_username_ci(username);
    if let Some(user_id) = exclude_user_id {
        query = query.filter(user::Column::Id.ne(user_id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Maps a unique violation on the username column to the form error.
pub(crate) fn username_conflict(field: &str, db_error: DbErr) -> ApiError {
    match db_error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::field(field, USERNAME_TAKEN),
        _ => ApiError::Database(db_error),
    }
}

/// Describe the registration form
#[utoipa::path(
    get,
    path = "/api/v1/register",
    tag = "users",
    responses(
        (status = 200, description = "Empty registration form", body = ApiResponse<RegistrationFormResponse>)
    )
)]
#[instrument]
pub async fn registration_form() -> Json<ApiResponse<RegistrationFormResponse>> {
    Json(ApiResponse {
        data: RegistrationFormResponse {
            title: "Registration".to_string(),
            fields: ["username", "email", "password1", "password2"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
        message: "Registration form".to_string(),
        success: true,
    })
}

/// Register a new user
///
/// Creates the user together with their profile and redirects to the login route.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    tag = "users",
    request_body = RegisterForm,
    responses(
        (status = 303, description = "User created, redirect to login", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<SeeOther<UserResponse>, ApiError> {
    trace!("Entering register function");

    let mut errors = validate_form(&form).err().unwrap_or_else(FieldErrors::new);
    if !errors.contains("username") && username_taken(&state.db, &form.username, None).await? {
        debug!("Username '{}' is already taken", form.username);
        errors.add("username", USERNAME_TAKEN);
    }
    errors.into_result().map_err(ApiError::Validation)?;

    let password_hash = hash_password(&form.password1)?;
    let now = Utc::now().naive_utc();

    trace!("Inserting user and profile in one transaction");
    let txn = state.db.begin().await?;

    let new_user = user::ActiveModel {
        username: Set(form.username.clone()),
        email: Set(form.email.clone()),
        password_hash: Set(password_hash),
        date_joined: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| username_conflict("username", e))?;

    let new_profile = profile::ActiveModel {
        user_id: Set(new_user.id),
        image: Set(profile::DEFAULT_IMAGE.to_string()),
        created: Set(now),
        updated: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        "User created with ID: {}, username: {}, profile ID: {}",
        new_user.id, new_user.username, new_profile.id
    );
    let message = format!("Account created for {}!", new_user.username);
    Ok(SeeOther::new(LOGIN_PATH, UserResponse::from(new_user), message))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "users",
    request_body = LoginForm,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    trace!("Entering login function");
    validate_form(&form).map_err(ApiError::Validation)?;

    let Some(existing) = user::Entity::find()
        .filter(user::Column::Username.eq(form.username.as_str()))
        .one(&state.db)
        .await?
    else {
        warn!("Login attempt for unknown user '{}'", form.username);
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&form.password, &existing.password_hash) {
        warn!("Wrong password for user ID {}", existing.id);
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = state.auth.issue_token(existing.id, &existing.username)?;
    info!("User ID {} logged in", existing.id);

    Ok(Json(ApiResponse {
        data: TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.auth.token_ttl_secs(),
        },
        message: "Login successful".to_string(),
        success: true,
    }))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use common::Role;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{hash_password, AuthUser, ADMIN_ONLY};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Request body for creating a staff account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Sign-in email (must be unique)
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
}

/// Request body for updating a staff account
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role.into(),
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

async fn find_user(state: &AppState, user_id: i32) -> ApiResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("User with ID {} not found", user_id);
            ApiError::not_found("User", user_id)
        })
}

async fn ensure_email_free(state: &AppState, email: &str, except: Option<i32>) -> ApiResult<()> {
    let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(&state.db).await?.is_some() {
        return Err(ApiError::Conflict(format!("Email {} is already in use", email)));
    }
    Ok(())
}

/// Create a new staff account
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    trace!("Entering create_user function");
    auth.require(ADMIN_ONLY)?;
    request.validate()?;

    let email = request.email.to_lowercase();
    ensure_email_free(&state, &email, None).await?;
    debug!("Creating user {} with role {}", email, request.role);

    let user = user::ActiveModel {
        name: Set(request.name),
        email: Set(email),
        password_hash: Set(hash_password(&request.password, state.config.bcrypt_cost)?),
        role: Set(request.role.into()),
        is_active: Set(true),
        reset_token: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User created successfully with ID: {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(user), "User created successfully")),
    ))
}

/// Get all staff accounts
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<UserResponse>>>> {
    auth.require(ADMIN_ONLY)?;

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} users", users.len());

    Ok(Json(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
        "Users retrieved successfully",
    )))
}

/// Get a staff account by ID
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    auth.require(ADMIN_ONLY)?;
    let user = find_user(&state, user_id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(user), "User retrieved successfully")))
}

/// Update a staff account
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn update_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    trace!("Entering update_user function for user_id: {}", user_id);
    auth.require(ADMIN_ONLY)?;
    request.validate()?;

    let existing = find_user(&state, user_id).await?;

    if auth.id == user_id && (request.is_active == Some(false) || request.role.is_some_and(|r| r != Role::Admin)) {
        return Err(ApiError::BadRequest(
            "Administrators cannot demote or deactivate themselves".to_string(),
        ));
    }

    let mut active = existing.into_active_model();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(email) = request.email {
        let email = email.to_lowercase();
        ensure_email_free(&state, &email, Some(user_id)).await?;
        active.email = Set(email);
    }
    if let Some(password) = request.password {
        active.password_hash = Set(hash_password(&password, state.config.bcrypt_cost)?);
    }
    if let Some(role) = request.role {
        active.role = Set(role.into());
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }

    let user = active.update(&state.db).await?;
    info!("User {} updated", user.id);
    Ok(Json(ApiResponse::ok(UserResponse::from(user), "User updated successfully")))
}

/// Delete a staff account
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 400, description = "Cannot delete yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_user(
    auth: AuthUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(ADMIN_ONLY)?;
    if auth.id == user_id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    let result = user::Entity::delete_by_id(user_id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        warn!("User with ID {} not found for deletion", user_id);
        return Err(ApiError::not_found("User", user_id));
    }

    info!("User {} deleted", user_id);
    Ok(Json(ApiResponse::ok(
        format!("User {} deleted", user_id),
        "User deleted successfully",
    )))
}

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{Duration, Utc};
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{hash_password, issue_token, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::handlers::users::UserResponse;
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Wrong credentials", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    trace!("Entering login function");
    request.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("Login attempt for unknown email");
            invalid()
        })?;

    if !user.is_active {
        warn!("Login attempt for inactive user {}", user.id);
        return Err(invalid());
    }

    if !verify_password(&request.password, &user.password_hash)? {
        warn!("Wrong password for user {}", user.id);
        return Err(invalid());
    }

    let token = issue_token(&user, &state.config)?;
    info!("User {} signed in", user.id);

    Ok(Json(ApiResponse::ok(
        LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.jwt_expiration_seconds,
            user: UserResponse::from(user),
        },
        "Login successful",
    )))
}

/// The signed-in user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = user::Entity::find_by_id(auth.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User", auth.id))?;

    Ok(Json(ApiResponse::ok(
        UserResponse::from(user),
        "User retrieved successfully",
    )))
}

/// Change the signed-in user's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<String>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Current password is wrong", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering change_password function for user {}", auth.id);
    request.validate()?;

    let user = user::Entity::find_by_id(auth.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User", auth.id))?;

    if !verify_password(&request.current_password, &user.password_hash)? {
        warn!("User {} supplied a wrong current password", auth.id);
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let mut active = user.into_active_model();
    active.password_hash = Set(hash_password(&request.new_password, state.config.bcrypt_cost)?);
    active.update(&state.db).await?;

    info!("User {} changed their password", auth.id);
    Ok(Json(ApiResponse::ok(
        "Password changed".to_string(),
        "Password changed successfully",
    )))
}

/// Request a password reset link
///
/// Always answers the same way so the endpoint cannot be used to probe for
/// registered addresses.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = ApiResponse<String>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Reset mail could not be sent", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering forgot_password function");
    request.validate()?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.to_lowercase()))
        .one(&state.db)
        .await?;

    match user {
        Some(user) if user.is_active => {
            let token = uuid::Uuid::new_v4().simple().to_string();
            let expires_at = Utc::now() + Duration::minutes(state.config.reset_token_ttl_minutes);
            let name = user.name.clone();
            let email = user.email.clone();

            let mut active = user.into_active_model();
            active.reset_token = Set(Some(token.clone()));
            active.reset_token_expires_at = Set(Some(expires_at));
            let user = active.update(&state.db).await?;
            debug!("Issued reset token for user {}", user.id);

            let link = format!(
                "{}/reset-password?token={}",
                state.config.frontend_url.trim_end_matches('/'),
                token
            );
            if let Err(e) = state.mailer.send_password_reset(&email, &name, &link).await {
                error!("Failed to send reset mail to user {}: {}", user.id, e);
                return Err(ApiError::Internal(
                    "Password reset mail could not be sent".to_string(),
                ));
            }
        }
        _ => debug!("No active user for reset request"),
    }

    Ok(Json(ApiResponse::ok(
        "If the account exists, a reset link has been sent".to_string(),
        "Password reset requested",
    )))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<String>),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<String>>)> {
    trace!("Entering reset_password function");
    request.validate()?;

    let invalid = || ApiError::BadRequest("Invalid or expired reset token".to_string());

    let user = user::Entity::find()
        .filter(user::Column::ResetToken.eq(request.token.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    let expired = user
        .reset_token_expires_at
        .map(|expires_at| expires_at < Utc::now())
        .unwrap_or(true);
    if expired {
        warn!("Expired reset token used for user {}", user.id);
        return Err(invalid());
    }

    let user_id = user.id;
    let mut active = user.into_active_model();
    active.password_hash = Set(hash_password(&request.new_password, state.config.bcrypt_cost)?);
    active.reset_token = Set(None);
    active.reset_token_expires_at = Set(None);
    active.update(&state.db).await?;

    info!("User {} reset their password", user_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            "Password reset".to_string(),
            "Password has been reset successfully",
        )),
    ))
}

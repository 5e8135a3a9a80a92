use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::setting;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, ADMIN_ONLY};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Setting printed on exported documents as their heading.
pub const UNIVERSITY_NAME_KEY: &str = "university_name";
pub const DEFAULT_UNIVERSITY_NAME: &str = "University Management System";

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct SettingRequest {
    #[validate(length(min = 1, max = 100))]
    pub key: String,
    #[validate(length(max = 2000))]
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingResponse {
    pub id: i32,
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

impl From<setting::Model> for SettingResponse {
    fn from(model: setting::Model) -> Self {
        Self {
            id: model.id,
            key: model.key,
            value: model.value,
            description: model.description,
        }
    }
}

/// Value of `key`, if set.
pub async fn setting_value(db: &DatabaseConnection, key: &str) -> ApiResult<Option<String>> {
    Ok(setting::Entity::find()
        .filter(setting::Column::Key.eq(key))
        .one(db)
        .await?
        .map(|s| s.value))
}

/// Create a setting
#[utoipa::path(
    post,
    path = "/api/settings",
    tag = "settings",
    request_body = SettingRequest,
    responses(
        (status = 201, description = "Setting created successfully", body = ApiResponse<SettingResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Key already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_setting(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<SettingRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SettingResponse>>)> {
    trace!("Entering create_setting function");
    auth.require(ADMIN_ONLY)?;
    request.validate()?;

    let setting = setting::ActiveModel {
        key: Set(request.key),
        value: Set(request.value),
        description: Set(request.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Setting '{}' created", setting.key);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SettingResponse::from(setting), "Setting created successfully")),
    ))
}

/// Get all settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Settings retrieved successfully", body = ApiResponse<Vec<SettingResponse>>)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_settings(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<SettingResponse>>>> {
    let settings = setting::Entity::find()
        .order_by_asc(setting::Column::Key)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} settings", settings.len());

    Ok(Json(ApiResponse::ok(
        settings.into_iter().map(SettingResponse::from).collect(),
        "Settings retrieved successfully",
    )))
}

/// Get a setting by ID
#[utoipa::path(
    get,
    path = "/api/settings/{setting_id}",
    tag = "settings",
    params(("setting_id" = i32, Path, description = "Setting ID")),
    responses(
        (status = 200, description = "Setting retrieved successfully", body = ApiResponse<SettingResponse>),
        (status = 404, description = "Setting not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_setting(
    _auth: AuthUser,
    Path(setting_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<SettingResponse>>> {
    let setting = setting::Entity::find_by_id(setting_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Setting", setting_id))?;

    Ok(Json(ApiResponse::ok(SettingResponse::from(setting), "Setting retrieved successfully")))
}

/// Update a setting
#[utoipa::path(
    put,
    path = "/api/settings/{setting_id}",
    tag = "settings",
    params(("setting_id" = i32, Path, description = "Setting ID")),
    request_body = SettingRequest,
    responses(
        (status = 200, description = "Setting updated successfully", body = ApiResponse<SettingResponse>),
        (status = 404, description = "Setting not found", body = ErrorResponse),
        (status = 409, description = "Key already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_setting(
    auth: AuthUser,
    Path(setting_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<SettingRequest>,
) -> ApiResult<Json<ApiResponse<SettingResponse>>> {
    auth.require(ADMIN_ONLY)?;
    request.validate()?;

    let existing = setting::Entity::find_by_id(setting_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Setting", setting_id))?;

    let mut active = existing.into_active_model();
    active.key = Set(request.key);
    active.value = Set(request.value);
    active.description = Set(request.description);
    let setting = active.update(&state.db).await?;

    info!("Setting '{}' updated", setting.key);
    Ok(Json(ApiResponse::ok(SettingResponse::from(setting), "Setting updated successfully")))
}

/// Delete a setting
#[utoipa::path(
    delete,
    path = "/api/settings/{setting_id}",
    tag = "settings",
    params(("setting_id" = i32, Path, description = "Setting ID")),
    responses(
        (status = 200, description = "Setting deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Setting not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_setting(
    auth: AuthUser,
    Path(setting_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(ADMIN_ONLY)?;

    let result = setting::Entity::delete_by_id(setting_id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found("Setting", setting_id));
    }

    info!("Setting {} deleted", setting_id);
    Ok(Json(ApiResponse::ok(
        format!("Setting {} deleted", setting_id),
        "Setting deleted successfully",
    )))
}

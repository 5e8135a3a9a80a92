use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{department, faculty};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, ADMIN_ONLY};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateFacultyRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    /// Short unique code, e.g. "ENG"
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    pub dean: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateFacultyRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    pub dean: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FacultyResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub dean: Option<String>,
    pub description: Option<String>,
}

impl From<faculty::Model> for FacultyResponse {
    fn from(model: faculty::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            dean: model.dean,
            description: model.description,
        }
    }
}

/// Create a faculty
#[utoipa::path(
    post,
    path = "/api/faculties",
    tag = "faculties",
    request_body = CreateFacultyRequest,
    responses(
        (status = 201, description = "Faculty created successfully", body = ApiResponse<FacultyResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Name or code already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_faculty(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateFacultyRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<FacultyResponse>>)> {
    trace!("Entering create_faculty function");
    auth.require(ADMIN_ONLY)?;
    request.validate()?;

    let faculty = faculty::ActiveModel {
        name: Set(request.name),
        code: Set(request.code.to_uppercase()),
        dean: Set(request.dean),
        description: Set(request.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_dashboard().await;
    info!("Faculty created successfully with ID: {}, code: {}", faculty.id, faculty.code);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(FacultyResponse::from(faculty), "Faculty created successfully")),
    ))
}

/// Get all faculties
#[utoipa::path(
    get,
    path = "/api/faculties",
    tag = "faculties",
    responses(
        (status = 200, description = "Faculties retrieved successfully", body = ApiResponse<Vec<FacultyResponse>>)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_faculties(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<FacultyResponse>>>> {
    let faculties = faculty::Entity::find()
        .order_by_asc(faculty::Column::Name)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} faculties", faculties.len());

    Ok(Json(ApiResponse::ok(
        faculties.into_iter().map(FacultyResponse::from).collect(),
        "Faculties retrieved successfully",
    )))
}

/// Get a faculty by ID
#[utoipa::path(
    get,
    path = "/api/faculties/{faculty_id}",
    tag = "faculties",
    params(("faculty_id" = i32, Path, description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty retrieved successfully", body = ApiResponse<FacultyResponse>),
        (status = 404, description = "Faculty not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_faculty(
    _auth: AuthUser,
    Path(faculty_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<FacultyResponse>>> {
    let faculty = faculty::Entity::find_by_id(faculty_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Faculty", faculty_id))?;

    Ok(Json(ApiResponse::ok(FacultyResponse::from(faculty), "Faculty retrieved successfully")))
}

/// Update a faculty
#[utoipa::path(
    put,
    path = "/api/faculties/{faculty_id}",
    tag = "faculties",
    params(("faculty_id" = i32, Path, description = "Faculty ID")),
    request_body = UpdateFacultyRequest,
    responses(
        (status = 200, description = "Faculty updated successfully", body = ApiResponse<FacultyResponse>),
        (status = 404, description = "Faculty not found", body = ErrorResponse),
        (status = 409, description = "Name or code already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_faculty(
    auth: AuthUser,
    Path(faculty_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateFacultyRequest>,
) -> ApiResult<Json<ApiResponse<FacultyResponse>>> {
    trace!("Entering update_faculty function for faculty_id: {}", faculty_id);
    auth.require(ADMIN_ONLY)?;
    request.validate()?;

    let existing = faculty::Entity::find_by_id(faculty_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Faculty", faculty_id))?;

    let mut active = existing.into_active_model();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(code) = request.code {
        active.code = Set(code.to_uppercase());
    }
    if request.dean.is_some() {
        active.dean = Set(request.dean);
    }
    if request.description.is_some() {
        active.description = Set(request.description);
    }

    let faculty = active.update(&state.db).await?;
    info!("Faculty {} updated", faculty.id);
    Ok(Json(ApiResponse::ok(FacultyResponse::from(faculty), "Faculty updated successfully")))
}

/// Delete a faculty without departments
#[utoipa::path(
    delete,
    path = "/api/faculties/{faculty_id}",
    tag = "faculties",
    params(("faculty_id" = i32, Path, description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Faculty not found", body = ErrorResponse),
        (status = 409, description = "Faculty still has departments", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_faculty(
    auth: AuthUser,
    Path(faculty_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(ADMIN_ONLY)?;

    let departments = department::Entity::find()
        .filter(department::Column::FacultyId.eq(faculty_id))
        .count(&state.db)
        .await?;
    if departments > 0 {
        warn!("Faculty {} still has {} departments", faculty_id, departments);
        return Err(ApiError::Conflict(format!(
            "Faculty {} still has {} departments",
            faculty_id, departments
        )));
    }

    let result = faculty::Entity::delete_by_id(faculty_id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found("Faculty", faculty_id));
    }

    state.invalidate_dashboard().await;
    info!("Faculty {} deleted", faculty_id);
    Ok(Json(ApiResponse::ok(
        format!("Faculty {} deleted", faculty_id),
        "Faculty deleted successfully",
    )))
}

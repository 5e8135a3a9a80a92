use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::{course, department};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{AuthUser, REGISTRY_ROLES};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCourseRequest {
    pub department_id: i32,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 0, max = 30))]
    pub credits: i32,
    /// Semester of the program the course belongs to
    #[validate(range(min = 1, max = 20))]
    pub semester: i32,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCourseRequest {
    pub department_id: Option<i32>,
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 0, max = 30))]
    pub credits: Option<i32>,
    #[validate(range(min = 1, max = 20))]
    pub semester: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub department_id: i32,
    pub code: String,
    pub title: String,
    pub credits: i32,
    pub semester: i32,
    pub description: Option<String>,
}

impl From<course::Model> for CourseResponse {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            department_id: model.department_id,
            code: model.code,
            title: model.title,
            credits: model.credits,
            semester: model.semester,
            description: model.description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct CourseQuery {
    pub department_id: Option<i32>,
    #[validate(range(min = 1, max = 20))]
    pub semester: Option<i32>,
}

async fn ensure_department(db: &DatabaseConnection, department_id: i32) -> ApiResult<()> {
    if department::Entity::find_by_id(department_id).one(db).await?.is_none() {
        warn!("Referenced department {} does not exist", department_id);
        return Err(ApiError::BadRequest(format!(
            "Department {} does not exist",
            department_id
        )));
    }
    Ok(())
}

/// Create a course
#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created successfully", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Invalid request or unknown department", body = ErrorResponse),
        (status = 409, description = "Code already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_course(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CourseResponse>>)> {
    trace!("Entering create_course function");
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;
    ensure_department(&state.db, request.department_id).await?;

    let course = course::ActiveModel {
        department_id: Set(request.department_id),
        code: Set(request.code.to_uppercase()),
        title: Set(request.title),
        credits: Set(request.credits),
        semester: Set(request.semester),
        description: Set(request.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_dashboard().await;
    info!("Course created successfully with ID: {}, code: {}", course.id, course.code);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CourseResponse::from(course), "Course created successfully")),
    ))
}

/// Get all courses
#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "courses",
    params(CourseQuery),
    responses(
        (status = 200, description = "Courses retrieved successfully", body = ApiResponse<Vec<CourseResponse>>)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_courses(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<CourseQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<CourseResponse>>>> {
    let mut query_builder = course::Entity::find();
    if let Some(department_id) = query.department_id {
        query_builder = query_builder.filter(course::Column::DepartmentId.eq(department_id));
    }
    if let Some(semester) = query.semester {
        query_builder = query_builder.filter(course::Column::Semester.eq(semester));
    }

    let courses = query_builder
        .order_by_asc(course::Column::Semester)
        .order_by_asc(course::Column::Code)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} courses", courses.len());

    Ok(Json(ApiResponse::ok(
        courses.into_iter().map(CourseResponse::from).collect(),
        "Courses retrieved successfully",
    )))
}

/// Get a course by ID
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    tag = "courses",
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course retrieved successfully", body = ApiResponse<CourseResponse>),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course(
    _auth: AuthUser,
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<CourseResponse>>> {
    let course = course::Entity::find_by_id(course_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", course_id))?;

    Ok(Json(ApiResponse::ok(CourseResponse::from(course), "Course retrieved successfully")))
}

/// Update a course
#[utoipa::path(
    put,
    path = "/api/courses/{course_id}",
    tag = "courses",
    params(("course_id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated successfully", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Invalid request or unknown department", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_course(
    auth: AuthUser,
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCourseRequest>,
) -> ApiResult<Json<ApiResponse<CourseResponse>>> {
    trace!("Entering update_course function for course_id: {}", course_id);
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let existing = course::Entity::find_by_id(course_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", course_id))?;

    let mut active = existing.into_active_model();
    if let Some(department_id) = request.department_id {
        ensure_department(&state.db, department_id).await?;
        active.department_id = Set(department_id);
    }
    if let Some(code) = request.code {
        active.code = Set(code.to_uppercase());
    }
    if let Some(title) = request.title {
        active.title = Set(title);
    }
    if let Some(credits) = request.credits {
        active.credits = Set(credits);
    }
    if let Some(semester) = request.semester {
        active.semester = Set(semester);
    }
    if request.description.is_some() {
        active.description = Set(request.description);
    }

    let course = active.update(&state.db).await?;
    info!("Course {} updated", course.id);
    Ok(Json(ApiResponse::ok(CourseResponse::from(course), "Course updated successfully")))
}

/// Delete a course
#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}",
    tag = "courses",
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_course(
    auth: AuthUser,
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(REGISTRY_ROLES)?;

    let result = course::Entity::delete_by_id(course_id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        warn!("Course with ID {} not found for deletion", course_id);
        return Err(ApiError::not_found("Course", course_id));
    }

    state.invalidate_dashboard().await;
    info!("Course {} deleted", course_id);
    Ok(Json(ApiResponse::ok(
        format!("Course {} deleted", course_id),
        "Course deleted successfully",
    )))
}

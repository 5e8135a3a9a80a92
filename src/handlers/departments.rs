use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::DEFAULT_TOTAL_SEMESTERS;
use model::entities::{department, faculty, student};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{AuthUser, ADMIN_ONLY};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateDepartmentRequest {
    pub faculty_id: i32,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    /// Tuition fee for one semester
    #[schema(value_type = String)]
    pub price: Decimal,
    pub batch: Option<String>,
    /// Program length in semesters (default: 8)
    #[validate(range(min = 1, max = 20))]
    pub total_semesters: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateDepartmentRequest {
    pub faculty_id: Option<i32>,
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub batch: Option<String>,
    #[validate(range(min = 1, max = 20))]
    pub total_semesters: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepartmentResponse {
    pub id: i32,
    pub faculty_id: i32,
    pub name: String,
    pub code: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub batch: Option<String>,
    pub total_semesters: i32,
}

impl From<department::Model> for DepartmentResponse {
    fn from(model: department::Model) -> Self {
        Self {
            id: model.id,
            faculty_id: model.faculty_id,
            name: model.name,
            code: model.code,
            price: model.price,
            batch: model.batch,
            total_semesters: model.total_semesters,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct DepartmentQuery {
    /// Only departments of this faculty
    pub faculty_id: Option<i32>,
}

fn ensure_price(price: Decimal) -> ApiResult<()> {
    if price < Decimal::ZERO {
        return Err(ApiError::Validation("Price cannot be negative".to_string()));
    }
    Ok(())
}

async fn ensure_faculty(db: &DatabaseConnection, faculty_id: i32) -> ApiResult<()> {
    if faculty::Entity::find_by_id(faculty_id).one(db).await?.is_none() {
        warn!("Referenced faculty {} does not exist", faculty_id);
        return Err(ApiError::BadRequest(format!("Faculty {} does not exist", faculty_id)));
    }
    Ok(())
}

/// Create a department
#[utoipa::path(
    post,
    path = "/api/departments",
    tag = "departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created successfully", body = ApiResponse<DepartmentResponse>),
        (status = 400, description = "Invalid request or unknown faculty", body = ErrorResponse),
        (status = 409, description = "Code already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_department(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateDepartmentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DepartmentResponse>>)> {
    trace!("Entering create_department function");
    auth.require(ADMIN_ONLY)?;
    request.validate()?;
    ensure_price(request.price)?;
    ensure_faculty(&state.db, request.faculty_id).await?;

    let department = department::ActiveModel {
        faculty_id: Set(request.faculty_id),
        name: Set(request.name),
        code: Set(request.code.to_uppercase()),
        price: Set(request.price),
        batch: Set(request.batch),
        total_semesters: Set(request.total_semesters.unwrap_or(DEFAULT_TOTAL_SEMESTERS)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_dashboard().await;
    info!(
        "Department created successfully with ID: {}, code: {}, price: {}",
        department.id, department.code, department.price
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            DepartmentResponse::from(department),
            "Department created successfully",
        )),
    ))
}

/// Get all departments
#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "departments",
    params(DepartmentQuery),
    responses(
        (status = 200, description = "Departments retrieved successfully", body = ApiResponse<Vec<DepartmentResponse>>)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_departments(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<DepartmentQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<DepartmentResponse>>>> {
    let mut query_builder = department::Entity::find();
    if let Some(faculty_id) = query.faculty_id {
        query_builder = query_builder.filter(department::Column::FacultyId.eq(faculty_id));
    }

    let departments = query_builder
        .order_by_asc(department::Column::Name)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} departments", departments.len());

    Ok(Json(ApiResponse::ok(
        departments.into_iter().map(DepartmentResponse::from).collect(),
        "Departments retrieved successfully",
    )))
}

/// Get a department by ID
#[utoipa::path(
    get,
    path = "/api/departments/{department_id}",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department retrieved successfully", body = ApiResponse<DepartmentResponse>),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_department(
    _auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<DepartmentResponse>>> {
    let department = department::Entity::find_by_id(department_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Department", department_id))?;

    Ok(Json(ApiResponse::ok(
        DepartmentResponse::from(department),
        "Department retrieved successfully",
    )))
}

/// Update a department
///
/// A new price only applies to ledger rows created afterwards.
#[utoipa::path(
    put,
    path = "/api/departments/{department_id}",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated successfully", body = ApiResponse<DepartmentResponse>),
        (status = 400, description = "Invalid request or unknown faculty", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_department(
    auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateDepartmentRequest>,
) -> ApiResult<Json<ApiResponse<DepartmentResponse>>> {
    trace!("Entering update_department function for department_id: {}", department_id);
    auth.require(ADMIN_ONLY)?;
    request.validate()?;

    let existing = department::Entity::find_by_id(department_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Department", department_id))?;

    let mut active = existing.into_active_model();
    if let Some(faculty_id) = request.faculty_id {
        ensure_faculty(&state.db, faculty_id).await?;
        active.faculty_id = Set(faculty_id);
    }
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(code) = request.code {
        active.code = Set(code.to_uppercase());
    }
    if let Some(price) = request.price {
        ensure_price(price)?;
        active.price = Set(price);
    }
    if request.batch.is_some() {
        active.batch = Set(request.batch);
    }
    if let Some(total_semesters) = request.total_semesters {
        active.total_semesters = Set(total_semesters);
    }

    let department = active.update(&state.db).await?;
    info!("Department {} updated", department.id);
    Ok(Json(ApiResponse::ok(
        DepartmentResponse::from(department),
        "Department updated successfully",
    )))
}

/// Delete a department without students
#[utoipa::path(
    delete,
    path = "/api/departments/{department_id}",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Department not found", body = ErrorResponse),
        (status = 409, description = "Department still has students", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_department(
    auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(ADMIN_ONLY)?;

    let students = student::Entity::find()
        .filter(student::Column::DepartmentId.eq(department_id))
        .count(&state.db)
        .await?;
    if students > 0 {
        warn!("Department {} still has {} students", department_id, students);
        return Err(ApiError::Conflict(format!(
            "Department {} still has {} students",
            department_id, students
        )));
    }

    let result = department::Entity::delete_by_id(department_id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found("Department", department_id));
    }

    state.invalidate_dashboard().await;
    info!("Department {} deleted", department_id);
    Ok(Json(ApiResponse::ok(
        format!("Department {} deleted", department_id),
        "Department deleted successfully",
    )))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use common::ApplicationStatus;
use model::entities::{application, department};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::student_accounts::StudentAccountResponse;
use super::students::{AdmissionResponse, StudentResponse};
use crate::auth::{AuthUser, REGISTRY_ROLES};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateApplicationRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub faculty_id: i32,
    pub department_id: i32,
    #[validate(length(min = 1, max = 20))]
    pub academic_year: String,
    #[validate(length(min = 1, max = 20))]
    pub session: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateApplicationRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub faculty_id: Option<i32>,
    pub department_id: Option<i32>,
    #[validate(length(min = 1, max = 20))]
    pub academic_year: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub session: Option<String>,
    pub remarks: Option<String>,
}

/// Optional note recorded with an approval or rejection
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct DecisionRequest {
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub faculty_id: i32,
    pub department_id: i32,
    pub academic_year: String,
    pub session: String,
    pub status: ApplicationStatus,
    pub remarks: Option<String>,
    /// Student created by the approval
    pub student_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<application::Model> for ApplicationResponse {
    fn from(model: application::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            faculty_id: model.faculty_id,
            department_id: model.department_id,
            academic_year: model.academic_year,
            session: model.session,
            status: model.status.into(),
            remarks: model.remarks,
            student_id: model.student_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct ApplicationQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 100)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    /// pending, approved or rejected
    pub status: Option<String>,
    pub department_id: Option<i32>,
}

/// The department must exist and sit in the given faculty.
async fn ensure_placement(db: &DatabaseConnection, faculty_id: i32, department_id: i32) -> ApiResult<()> {
    let department = department::Entity::find_by_id(department_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("Department {} does not exist", department_id)))?;
    if department.faculty_id != faculty_id {
        return Err(ApiError::Validation(format!(
            "Department {} does not belong to faculty {}",
            department_id, faculty_id
        )));
    }
    Ok(())
}

async fn find_application(state: &AppState, application_id: i32) -> ApiResult<application::Model> {
    application::Entity::find_by_id(application_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("Application with ID {} not found", application_id);
            ApiError::not_found("Application", application_id)
        })
}

/// Submit an admission application
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Application created successfully", body = ApiResponse<ApplicationResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_application(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateApplicationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ApplicationResponse>>)> {
    trace!("Entering create_application function");
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;
    ensure_placement(&state.db, request.faculty_id, request.department_id).await?;

    let application = application::ActiveModel {
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        email: Set(request.email.to_lowercase()),
        phone: Set(request.phone),
        faculty_id: Set(request.faculty_id),
        department_id: Set(request.department_id),
        academic_year: Set(request.academic_year),
        session: Set(request.session),
        status: Set(application::ApplicationStatus::Pending),
        remarks: Set(request.remarks),
        student_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_dashboard().await;
    info!("Application created successfully with ID: {}", application.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            ApplicationResponse::from(application),
            "Application created successfully",
        )),
    ))
}

/// Get applications
#[utoipa::path(
    get,
    path = "/api/applications",
    tag = "applications",
    params(ApplicationQuery),
    responses(
        (status = 200, description = "Applications retrieved successfully", body = ApiResponse<Vec<ApplicationResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_applications(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<ApplicationQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ApplicationResponse>>>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(100);

    let mut query_builder = application::Entity::find();
    if let Some(status) = query.status.as_deref() {
        let status: ApplicationStatus = status
            .parse()
            .map_err(|e: common::ParseEnumError| ApiError::Validation(e.to_string()))?;
        query_builder = query_builder
            .filter(application::Column::Status.eq(application::ApplicationStatus::from(status)));
    }
    if let Some(department_id) = query.department_id {
        query_builder = query_builder.filter(application::Column::DepartmentId.eq(department_id));
    }

    let applications = query_builder
        .order_by_desc(application::Column::CreatedAt)
        .order_by_desc(application::Column::Id)
        .paginate(&state.db, limit)
        .fetch_page(page - 1)
        .await?;
    debug!("Retrieved {} applications", applications.len());

    Ok(Json(ApiResponse::ok(
        applications.into_iter().map(ApplicationResponse::from).collect(),
        "Applications retrieved successfully",
    )))
}

/// Get an application by ID
#[utoipa::path(
    get,
    path = "/api/applications/{application_id}",
    tag = "applications",
    params(("application_id" = i32, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application retrieved successfully", body = ApiResponse<ApplicationResponse>),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_application(
    _auth: AuthUser,
    Path(application_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<ApplicationResponse>>> {
    let application = find_application(&state, application_id).await?;
    Ok(Json(ApiResponse::ok(
        ApplicationResponse::from(application),
        "Application retrieved successfully",
    )))
}

/// Edit a pending application
#[utoipa::path(
    put,
    path = "/api/applications/{application_id}",
    tag = "applications",
    params(("application_id" = i32, Path, description = "Application ID")),
    request_body = UpdateApplicationRequest,
    responses(
        (status = 200, description = "Application updated successfully", body = ApiResponse<ApplicationResponse>),
        (status = 404, description = "Application not found", body = ErrorResponse),
        (status = 409, description = "Application already decided", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_application(
    auth: AuthUser,
    Path(application_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateApplicationRequest>,
) -> ApiResult<Json<ApiResponse<ApplicationResponse>>> {
    trace!("Entering update_application function for application_id: {}", application_id);
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let existing = find_application(&state, application_id).await?;
    if existing.status != application::ApplicationStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Application {} has already been decided",
            application_id
        )));
    }

    if request.faculty_id.is_some() || request.department_id.is_some() {
        ensure_placement(
            &state.db,
            request.faculty_id.unwrap_or(existing.faculty_id),
            request.department_id.unwrap_or(existing.department_id),
        )
        .await?;
    }

    let mut active = existing.into_active_model();
    if let Some(first_name) = request.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = request.email {
        active.email = Set(email.to_lowercase());
    }
    if request.phone.is_some() {
        active.phone = Set(request.phone);
    }
    if let Some(faculty_id) = request.faculty_id {
        active.faculty_id = Set(faculty_id);
    }
    if let Some(department_id) = request.department_id {
        active.department_id = Set(department_id);
    }
    if let Some(academic_year) = request.academic_year {
        active.academic_year = Set(academic_year);
    }
    if let Some(session) = request.session {
        active.session = Set(session);
    }
    if request.remarks.is_some() {
        active.remarks = Set(request.remarks);
    }

    let application = active.update(&state.db).await?;
    info!("Application {} updated", application.id);
    Ok(Json(ApiResponse::ok(
        ApplicationResponse::from(application),
        "Application updated successfully",
    )))
}

/// Delete an application
#[utoipa::path(
    delete,
    path = "/api/applications/{application_id}",
    tag = "applications",
    params(("application_id" = i32, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_application(
    auth: AuthUser,
    Path(application_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(REGISTRY_ROLES)?;

    let result = application::Entity::delete_by_id(application_id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found("Application", application_id));
    }

    state.invalidate_dashboard().await;
    info!("Application {} deleted", application_id);
    Ok(Json(ApiResponse::ok(
        format!("Application {} deleted", application_id),
        "Application deleted successfully",
    )))
}

/// Approve an application
///
/// Creates the student in semester 1 with a generated student number and the
/// first ledger row at the department price, then links it to the application.
#[utoipa::path(
    post,
    path = "/api/applications/{application_id}/approve",
    tag = "applications",
    params(("application_id" = i32, Path, description = "Application ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Application approved", body = ApiResponse<AdmissionResponse>),
        (status = 404, description = "Application not found", body = ErrorResponse),
        (status = 409, description = "Application not pending or email already enrolled", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn approve_application(
    auth: AuthUser,
    Path(application_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<Json<ApiResponse<AdmissionResponse>>> {
    trace!("Entering approve_application function for application_id: {}", application_id);
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let admission = compute::admission::approve_application(&state.db, application_id, request.remarks).await?;

    state.invalidate_dashboard().await;
    info!(
        "Application {} approved by user {}, student {}",
        admission.application.id, auth.id, admission.student.student_id
    );
    Ok(Json(ApiResponse::ok(
        AdmissionResponse {
            application: ApplicationResponse::from(admission.application),
            student: StudentResponse::from(admission.student),
            account: StudentAccountResponse::from(admission.account),
        },
        "Application approved successfully",
    )))
}

/// Reject an application
#[utoipa::path(
    post,
    path = "/api/applications/{application_id}/reject",
    tag = "applications",
    params(("application_id" = i32, Path, description = "Application ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Application rejected", body = ApiResponse<ApplicationResponse>),
        (status = 404, description = "Application not found", body = ErrorResponse),
        (status = 409, description = "Application not pending", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reject_application(
    auth: AuthUser,
    Path(application_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<Json<ApiResponse<ApplicationResponse>>> {
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let application =
        compute::admission::reject_application(&state.db, application_id, request.remarks).await?;

    state.invalidate_dashboard().await;
    info!("Application {} rejected by user {}", application.id, auth.id);
    Ok(Json(ApiResponse::ok(
        ApplicationResponse::from(application),
        "Application rejected successfully",
    )))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use common::{BalanceBreakdown, BalanceStatus, GRADUATED_SEMESTER};
use compute::admission::{register_student, Enrollment};
use compute::balance::{current_account, current_accounts, TuitionInputs};
use compute::rollover::parse_semester;
use model::entities::{department, payment, student, student_account};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::applications::ApplicationResponse;
use super::payments::PaymentResponse;
use super::student_accounts::StudentAccountResponse;
use crate::auth::{AuthUser, REGISTRY_ROLES};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// Direct enrollment without an application
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateStudentRequest {
    /// Public student number; generated as `{DEPTCODE}-{YEAR}-{NNNN}` when absent
    #[validate(length(min = 1, max = 40))]
    pub student_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub faculty_id: i32,
    pub department_id: i32,
    /// Starting semester (default: "1")
    pub semester: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub academic_year: String,
    #[validate(length(min = 1, max = 20))]
    pub session: String,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub faculty_id: Option<i32>,
    pub department_id: Option<i32>,
    /// Semester number or "Graduated"
    pub semester: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub academic_year: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub session: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub faculty_id: i32,
    pub department_id: i32,
    pub semester: String,
    pub academic_year: String,
    pub session: String,
    pub is_active: bool,
    pub enrolled_at: NaiveDate,
}

impl From<student::Model> for StudentResponse {
    fn from(model: student::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            faculty_id: model.faculty_id,
            department_id: model.department_id,
            semester: model.semester,
            academic_year: model.academic_year,
            session: model.session,
            is_active: model.is_active,
            enrolled_at: model.enrolled_at,
        }
    }
}

/// A newly enrolled student and the ledger row of the starting semester
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    pub student: StudentResponse,
    pub account: StudentAccountResponse,
}

/// Result of approving an application
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdmissionResponse {
    pub application: ApplicationResponse,
    pub student: StudentResponse,
    pub account: StudentAccountResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentBalanceResponse {
    pub student_id: i32,
    pub student_code: String,
    pub name: String,
    /// Ledger row the balance was computed from
    pub account: StudentAccountResponse,
    pub breakdown: BalanceBreakdown,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct StudentQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 100)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    pub department_id: Option<i32>,
    pub faculty_id: Option<i32>,
    /// Semester number or "Graduated"
    pub semester: Option<String>,
    pub is_active: Option<bool>,
    /// Matches name, email or student number
    #[validate(length(min = 1, max = 100))]
    pub search: Option<String>,
    /// paid, partial or unpaid, judged on the current ledger row
    pub payment_status: Option<String>,
}

/// Canonical stored form of a semester: "Graduated" or a number within the
/// department's program, without padding.
fn normalize_semester(semester: &str, department: &department::Model) -> ApiResult<String> {
    if semester == GRADUATED_SEMESTER {
        return Ok(GRADUATED_SEMESTER.to_string());
    }
    let number = parse_semester(semester)?;
    if number > department.total_semesters {
        return Err(ApiError::Validation(format!(
            "Semester {} is beyond the {} semesters of department {}",
            number, department.total_semesters, department.code
        )));
    }
    Ok(number.to_string())
}

async fn find_student(state: &AppState, student_id: i32) -> ApiResult<student::Model> {
    student::Entity::find_by_id(student_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("Student with ID {} not found", student_id);
            ApiError::not_found("Student", student_id)
        })
}

/// Enroll a student directly
#[utoipa::path(
    post,
    path = "/api/students",
    tag = "students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student enrolled successfully", body = ApiResponse<EnrollmentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse),
        (status = 409, description = "Email or student number already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_student(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<EnrollmentResponse>>)> {
    trace!("Entering create_student function");
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let enrollment = Enrollment {
        student_id: request.student_id,
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email.to_lowercase(),
        phone: request.phone,
        faculty_id: request.faculty_id,
        department_id: request.department_id,
        semester: request.semester,
        academic_year: request.academic_year,
        session: request.session,
    };
    let (student, account) = register_student(&state.db, enrollment).await?;

    state.invalidate_dashboard().await;
    info!("Student enrolled with ID: {}, number: {}", student.id, student.student_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            EnrollmentResponse {
                student: StudentResponse::from(student),
                account: StudentAccountResponse::from(account),
            },
            "Student enrolled successfully",
        )),
    ))
}

/// Get students
#[utoipa::path(
    get,
    path = "/api/students",
    tag = "students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Students retrieved successfully", body = ApiResponse<Vec<StudentResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_students(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<StudentQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<StudentResponse>>>> {
    trace!("Entering get_students function");

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(100);
    let payment_status = query
        .payment_status
        .as_deref()
        .map(str::parse::<BalanceStatus>)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    debug!("Fetching students - page: {}, limit: {}", page, limit);

    let mut query_builder = student::Entity::find();
    if let Some(department_id) = query.department_id {
        query_builder = query_builder.filter(student::Column::DepartmentId.eq(department_id));
    }
    if let Some(faculty_id) = query.faculty_id {
        query_builder = query_builder.filter(student::Column::FacultyId.eq(faculty_id));
    }
    if let Some(semester) = &query.semester {
        query_builder = query_builder.filter(student::Column::Semester.eq(semester.as_str()));
    }
    if let Some(is_active) = query.is_active {
        query_builder = query_builder.filter(student::Column::IsActive.eq(is_active));
    }
    if let Some(search) = &query.search {
        query_builder = query_builder.filter(
            Condition::any()
                .add(student::Column::FirstName.contains(search.as_str()))
                .add(student::Column::LastName.contains(search.as_str()))
                .add(student::Column::Email.contains(search.as_str()))
                .add(student::Column::StudentId.contains(search.as_str())),
        );
    }
    let query_builder = query_builder.order_by_asc(student::Column::StudentId);

    let students = match payment_status {
        None => {
            query_builder
                .paginate(&state.db, limit)
                .fetch_page(page - 1)
                .await?
        }
        // Classification lives on the ledger, so page after filtering
        Some(wanted) => {
            let candidates = query_builder.all(&state.db).await?;
            let ids: Vec<i32> = candidates.iter().map(|s| s.id).collect();
            let accounts = current_accounts(&state.db, &ids).await?;

            candidates
                .into_iter()
                .filter(|s| {
                    accounts
                        .get(&s.id)
                        .is_some_and(|account| TuitionInputs::from(account).status() == wanted)
                })
                .skip(((page - 1) * limit) as usize)
                .take(limit as usize)
                .collect()
        }
    };

    info!("Retrieved {} students", students.len());
    Ok(Json(ApiResponse::ok(
        students.into_iter().map(StudentResponse::from).collect(),
        "Students retrieved successfully",
    )))
}

/// Get a student by ID
#[utoipa::path(
    get,
    path = "/api/students/{student_id}",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student retrieved successfully", body = ApiResponse<StudentResponse>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student(
    _auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<StudentResponse>>> {
    let student = find_student(&state, student_id).await?;
    Ok(Json(ApiResponse::ok(StudentResponse::from(student), "Student retrieved successfully")))
}

/// Update a student's profile or placement
///
/// Changing the semester here does not create ledger rows; the semester
/// rollover does that.
#[utoipa::path(
    put,
    path = "/api/students/{student_id}",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated successfully", body = ApiResponse<StudentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_student(
    auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateStudentRequest>,
) -> ApiResult<Json<ApiResponse<StudentResponse>>> {
    trace!("Entering update_student function for student_id: {}", student_id);
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let existing = find_student(&state, student_id).await?;

    let faculty_id = request.faculty_id.unwrap_or(existing.faculty_id);
    let department_id = request.department_id.unwrap_or(existing.department_id);
    let placement_changed = request.faculty_id.is_some() || request.department_id.is_some();
    let semester = if placement_changed || request.semester.is_some() {
        let department = department::Entity::find_by_id(department_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::BadRequest(format!("Department {} does not exist", department_id)))?;
        if department.faculty_id != faculty_id {
            return Err(ApiError::Validation(format!(
                "Department {} does not belong to faculty {}",
                department_id, faculty_id
            )));
        }
        let semester = request.semester.as_deref().unwrap_or(existing.semester.as_str());
        normalize_semester(semester, &department)?
    } else {
        existing.semester.clone()
    };

    // Graduated students are never active
    let graduated = semester == GRADUATED_SEMESTER;
    let is_active = match request.is_active {
        Some(true) if graduated => {
            return Err(ApiError::Validation(
                "A graduated student cannot be active".to_string(),
            ));
        }
        Some(is_active) => is_active,
        None if graduated => false,
        None => existing.is_active,
    };

    let mut active = existing.into_active_model();
    active.faculty_id = Set(faculty_id);
    active.department_id = Set(department_id);
    if let Some(first_name) = request.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = request.email {
        let email = email.to_lowercase();
        let taken = student::Entity::find()
            .filter(student::Column::Email.eq(email.as_str()))
            .filter(student::Column::Id.ne(student_id))
            .one(&state.db)
            .await?;
        if taken.is_some() {
            return Err(ApiError::Conflict(format!("Email {} is already in use", email)));
        }
        active.email = Set(email);
    }
    if request.phone.is_some() {
        active.phone = Set(request.phone);
    }
    active.semester = Set(semester);
    if let Some(academic_year) = request.academic_year {
        active.academic_year = Set(academic_year);
    }
    if let Some(session) = request.session {
        active.session = Set(session);
    }
    active.is_active = Set(is_active);

    let student = active.update(&state.db).await?;
    state.invalidate_dashboard().await;
    info!("Student {} updated", student.id);
    Ok(Json(ApiResponse::ok(StudentResponse::from(student), "Student updated successfully")))
}

/// Delete a student together with its ledger rows and payments
#[utoipa::path(
    delete,
    path = "/api/students/{student_id}",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_student(
    auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(REGISTRY_ROLES)?;

    let result = student::Entity::delete_by_id(student_id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        warn!("Student with ID {} not found for deletion", student_id);
        return Err(ApiError::not_found("Student", student_id));
    }

    state.invalidate_dashboard().await;
    info!("Student {} deleted", student_id);
    Ok(Json(ApiResponse::ok(
        format!("Student {} deleted", student_id),
        "Student deleted successfully",
    )))
}

/// Balance of the student's current ledger row
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/balance",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Balance computed successfully", body = ApiResponse<StudentBalanceResponse>),
        (status = 404, description = "Student or ledger row not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_balance(
    _auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<StudentBalanceResponse>>> {
    let student = find_student(&state, student_id).await?;
    let account = current_account(&state.db, student.id)
        .await?
        .ok_or_else(|| {
            warn!("Student {} has no ledger rows", student.id);
            ApiError::NotFound(format!("Student {} has no student account", student.id))
        })?;

    let breakdown = TuitionInputs::from(&account).breakdown();
    debug!(
        "Balance of student {} on account {}: {} ({})",
        student.id, account.id, breakdown.balance, breakdown.status
    );

    Ok(Json(ApiResponse::ok(
        StudentBalanceResponse {
            student_id: student.id,
            name: student.full_name(),
            student_code: student.student_id,
            account: StudentAccountResponse::from(account),
            breakdown,
        },
        "Balance computed successfully",
    )))
}

/// All ledger rows of a student, oldest first
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/accounts",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student accounts retrieved successfully", body = ApiResponse<Vec<StudentAccountResponse>>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_accounts(
    _auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<StudentAccountResponse>>>> {
    let student = find_student(&state, student_id).await?;
    let accounts = student_account::Entity::find()
        .filter(student_account::Column::StudentId.eq(student.id))
        .order_by_asc(student_account::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::ok(
        accounts.into_iter().map(StudentAccountResponse::from).collect(),
        "Student accounts retrieved successfully",
    )))
}

/// All payments of a student, newest first
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/payments",
    tag = "students",
    params(("student_id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_payments(
    _auth: AuthUser,
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentResponse>>>> {
    let student = find_student(&state, student_id).await?;
    let payments = payment::Entity::find()
        .filter(payment::Column::StudentId.eq(student.id))
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::ok(
        payments.into_iter().map(PaymentResponse::from).collect(),
        "Payments retrieved successfully",
    )))
}

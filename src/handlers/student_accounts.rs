use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use common::{AccountStatus, BalanceStatus};
use compute::balance::TuitionInputs;
use compute::ledger::{adjust_account, AccountAdjustment};
use model::entities::student_account;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{AuthUser, FINANCE_ROLES};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// One semester ledger row with its computed balance
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentAccountResponse {
    pub id: i32,
    pub student_id: i32,
    pub academic_year: String,
    pub semester: String,
    #[schema(value_type = String)]
    pub tuition_fee: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub paid_amount: Decimal,
    #[schema(value_type = String)]
    pub total_due: Decimal,
    /// Scholarship percentage
    #[schema(value_type = Option<String>)]
    pub scholarship: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub forwarded: Option<Decimal>,
    pub status: AccountStatus,
    pub paid_type: Option<String>,
    #[schema(value_type = String)]
    pub balance: Decimal,
    pub balance_status: BalanceStatus,
    pub created_at: DateTime<Utc>,
}

impl From<student_account::Model> for StudentAccountResponse {
    fn from(model: student_account::Model) -> Self {
        let inputs = TuitionInputs::from(&model);
        Self {
            id: model.id,
            student_id: model.student_id,
            academic_year: model.academic_year,
            semester: model.semester,
            tuition_fee: model.tuition_fee,
            discount: model.discount,
            paid_amount: model.paid_amount,
            total_due: model.total_due,
            scholarship: model.scholarship,
            forwarded: model.forwarded,
            status: model.status.into(),
            paid_type: model.paid_type,
            balance: inputs.balance(),
            balance_status: inputs.status(),
            created_at: model.created_at,
        }
    }
}

/// Manual adjustment of a ledger row. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateStudentAccountRequest {
    /// Flat discount, 0 up to the tuition fee
    #[schema(value_type = Option<String>)]
    pub discount: Option<Decimal>,
    /// Scholarship percentage, 0 to 100
    #[schema(value_type = Option<String>)]
    pub scholarship: Option<Decimal>,
    /// Balance carried over from an earlier semester
    #[schema(value_type = Option<String>)]
    pub forwarded: Option<Decimal>,
    #[validate(length(min = 1, max = 30))]
    pub paid_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct StudentAccountQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 100)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    pub student_id: Option<i32>,
    /// pending, partial or paid
    pub status: Option<String>,
    pub academic_year: Option<String>,
    pub semester: Option<String>,
}

/// Get ledger rows
#[utoipa::path(
    get,
    path = "/api/student-accounts",
    tag = "student-accounts",
    params(StudentAccountQuery),
    responses(
        (status = 200, description = "Student accounts retrieved successfully", body = ApiResponse<Vec<StudentAccountResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_accounts(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<StudentAccountQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<StudentAccountResponse>>>> {
    trace!("Entering get_student_accounts function");

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(100);

    let mut query_builder = student_account::Entity::find();
    if let Some(student_id) = query.student_id {
        query_builder = query_builder.filter(student_account::Column::StudentId.eq(student_id));
    }
    if let Some(status) = query.status.as_deref() {
        let status: AccountStatus = status
            .parse()
            .map_err(|e: common::ParseEnumError| ApiError::Validation(e.to_string()))?;
        query_builder = query_builder
            .filter(student_account::Column::Status.eq(student_account::AccountStatus::from(status)));
    }
    if let Some(academic_year) = &query.academic_year {
        query_builder =
            query_builder.filter(student_account::Column::AcademicYear.eq(academic_year.as_str()));
    }
    if let Some(semester) = &query.semester {
        query_builder = query_builder.filter(student_account::Column::Semester.eq(semester.as_str()));
    }

    let accounts = query_builder
        .order_by_desc(student_account::Column::Id)
        .paginate(&state.db, limit)
        .fetch_page(page - 1)
        .await?;
    debug!("Retrieved {} student accounts", accounts.len());

    Ok(Json(ApiResponse::ok(
        accounts.into_iter().map(StudentAccountResponse::from).collect(),
        "Student accounts retrieved successfully",
    )))
}

/// Get a ledger row by ID
#[utoipa::path(
    get,
    path = "/api/student-accounts/{account_id}",
    tag = "student-accounts",
    params(("account_id" = i32, Path, description = "Student account ID")),
    responses(
        (status = 200, description = "Student account retrieved successfully", body = ApiResponse<StudentAccountResponse>),
        (status = 404, description = "Student account not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_account(
    _auth: AuthUser,
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<StudentAccountResponse>>> {
    let account = student_account::Entity::find_by_id(account_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Student account", account_id))?;

    Ok(Json(ApiResponse::ok(
        StudentAccountResponse::from(account),
        "Student account retrieved successfully",
    )))
}

/// Adjust discount, scholarship, carried balance or payment plan of a ledger row
#[utoipa::path(
    put,
    path = "/api/student-accounts/{account_id}",
    tag = "student-accounts",
    params(("account_id" = i32, Path, description = "Student account ID")),
    request_body = UpdateStudentAccountRequest,
    responses(
        (status = 200, description = "Student account updated successfully", body = ApiResponse<StudentAccountResponse>),
        (status = 400, description = "Adjustment out of range", body = ErrorResponse),
        (status = 403, description = "Finance role required", body = ErrorResponse),
        (status = 404, description = "Student account not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_student_account(
    auth: AuthUser,
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateStudentAccountRequest>,
) -> ApiResult<Json<ApiResponse<StudentAccountResponse>>> {
    trace!("Entering update_student_account function for account_id: {}", account_id);
    auth.require(FINANCE_ROLES)?;
    request.validate()?;

    let account = adjust_account(
        &state.db,
        account_id,
        AccountAdjustment {
            discount: request.discount,
            scholarship: request.scholarship,
            forwarded: request.forwarded,
            paid_type: request.paid_type,
        },
    )
    .await?;

    state.invalidate_dashboard().await;
    info!("Student account {} adjusted by user {}", account.id, auth.id);
    Ok(Json(ApiResponse::ok(
        StudentAccountResponse::from(account),
        "Student account updated successfully",
    )))
}

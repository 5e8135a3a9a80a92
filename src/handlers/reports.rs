use axum::{
    extract::{Query, State},
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use common::{DueEntry, FinancialReport, PaymentReport};
use compute::reports::{dues_report, financial_report, payment_report};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::auth::{AuthUser, FINANCE_ROLES};
use crate::error::ApiResult;
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[validate(schema(function = "validate_range"))]
pub struct PaymentReportQuery {
    /// First day, inclusive
    pub from: Option<NaiveDate>,
    /// Last day, inclusive
    pub to: Option<NaiveDate>,
}

fn validate_range(query: &PaymentReportQuery) -> Result<(), ValidationError> {
    match (query.from, query.to) {
        (Some(from), Some(to)) if to < from => Err(ValidationError::new("to_before_from")),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct DuesQuery {
    pub department_id: Option<i32>,
}

/// Billed, discounted, collected and outstanding money per department
#[utoipa::path(
    get,
    path = "/api/reports/financial",
    tag = "reports",
    responses(
        (status = 200, description = "Financial report generated", body = ApiResponse<FinancialReport>),
        (status = 403, description = "Finance role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_financial_report(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<FinancialReport>>> {
    auth.require(FINANCE_ROLES)?;

    let report = financial_report(&state.db).await?;
    info!("Financial report over {} departments", report.departments.len());
    Ok(Json(ApiResponse::ok(report, "Financial report generated successfully")))
}

/// Payments in a date range, grouped by method and by month
#[utoipa::path(
    get,
    path = "/api/reports/payments",
    tag = "reports",
    params(PaymentReportQuery),
    responses(
        (status = 200, description = "Payment report generated", body = ApiResponse<PaymentReport>),
        (status = 400, description = "Invalid date range", body = ErrorResponse),
        (status = 403, description = "Finance role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payment_report(
    auth: AuthUser,
    Valid(Query(query)): Valid<Query<PaymentReportQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<PaymentReport>>> {
    auth.require(FINANCE_ROLES)?;

    let report = payment_report(&state.db, query.from, query.to).await?;
    info!("Payment report: {} payments, total {}", report.payment_count, report.total_amount);
    Ok(Json(ApiResponse::ok(report, "Payment report generated successfully")))
}

/// Active students still owing money on their current semester
#[utoipa::path(
    get,
    path = "/api/reports/dues",
    tag = "reports",
    params(DuesQuery),
    responses(
        (status = 200, description = "Dues report generated", body = ApiResponse<Vec<DueEntry>>),
        (status = 403, description = "Finance role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_dues_report(
    auth: AuthUser,
    Valid(Query(query)): Valid<Query<DuesQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<DueEntry>>>> {
    auth.require(FINANCE_ROLES)?;

    let dues = dues_report(&state.db, query.department_id).await?;
    info!("Dues report: {} students owing", dues.len());
    Ok(Json(ApiResponse::ok(dues, "Dues report generated successfully")))
}

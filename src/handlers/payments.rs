use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use common::{PaymentMethod, PaymentType};
use compute::ledger::{amend_payment, record_payment, reverse_payment, NewPayment, PaymentAmendment};
use model::entities::payment;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::student_accounts::StudentAccountResponse;
use crate::auth::{AuthUser, FINANCE_ROLES};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreatePaymentRequest {
    pub student_id: i32,
    /// Ledger row to apply the payment to; the student's current row when absent
    pub student_account_id: Option<i32>,
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdatePaymentRequest {
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub method: Option<PaymentMethod>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub student_id: i32,
    pub student_account_id: Option<i32>,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            student_account_id: model.student_account_id,
            amount: model.amount,
            payment_date: model.payment_date,
            payment_type: model.payment_type.into(),
            method: model.method.into(),
            reference: model.reference,
            note: model.note,
            created_at: model.created_at,
        }
    }
}

/// A stored payment and the ledger row it moved, if any
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordedPaymentResponse {
    pub payment: PaymentResponse,
    pub account: Option<StudentAccountResponse>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct PaymentQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 100)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    pub student_id: Option<i32>,
    /// Earliest payment date, inclusive
    pub from: Option<NaiveDate>,
    /// Latest payment date, inclusive
    pub to: Option<NaiveDate>,
    /// cash, card, bankTransfer or mobileBanking
    pub method: Option<String>,
    /// tuition, admission, exam or other
    pub payment_type: Option<String>,
}

/// Record a payment
///
/// Tuition payments are added to the paid amount of the ledger row in the
/// same transaction and the row's status is recomputed.
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<RecordedPaymentResponse>),
        (status = 400, description = "Invalid amount or no ledger row to apply it to", body = ErrorResponse),
        (status = 403, description = "Finance role required", body = ErrorResponse),
        (status = 404, description = "Student or student account not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RecordedPaymentResponse>>)> {
    trace!("Entering create_payment function");
    auth.require(FINANCE_ROLES)?;
    request.validate()?;

    let (payment, account) = record_payment(
        &state.db,
        NewPayment {
            student_id: request.student_id,
            student_account_id: request.student_account_id,
            amount: request.amount,
            payment_date: request.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            payment_type: request.payment_type.into(),
            method: request.method.into(),
            reference: request.reference,
            note: request.note,
        },
    )
    .await?;

    state.invalidate_dashboard().await;
    info!("Payment {} recorded by user {}", payment.id, auth.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            RecordedPaymentResponse {
                payment: PaymentResponse::from(payment),
                account: account.map(StudentAccountResponse::from),
            },
            "Payment recorded successfully",
        )),
    ))
}

/// Get payments
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "payments",
    params(PaymentQuery),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payments(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<PaymentQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentResponse>>>> {
    trace!("Entering get_payments function");

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(100);

    let mut query_builder = payment::Entity::find();
    if let Some(student_id) = query.student_id {
        query_builder = query_builder.filter(payment::Column::StudentId.eq(student_id));
    }
    if let Some(from) = query.from {
        query_builder = query_builder.filter(payment::Column::PaymentDate.gte(from));
    }
    if let Some(to) = query.to {
        query_builder = query_builder.filter(payment::Column::PaymentDate.lte(to));
    }
    if let Some(method) = query.method.as_deref() {
        let method: PaymentMethod = method
            .parse()
            .map_err(|e: common::ParseEnumError| ApiError::Validation(e.to_string()))?;
        query_builder = query_builder.filter(payment::Column::Method.eq(payment::PaymentMethod::from(method)));
    }
    if let Some(payment_type) = query.payment_type.as_deref() {
        let payment_type: PaymentType = payment_type
            .parse()
            .map_err(|e: common::ParseEnumError| ApiError::Validation(e.to_string()))?;
        query_builder =
            query_builder.filter(payment::Column::PaymentType.eq(payment::PaymentType::from(payment_type)));
    }

    let payments = query_builder
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .paginate(&state.db, limit)
        .fetch_page(page - 1)
        .await?;
    debug!("Retrieved {} payments", payments.len());

    Ok(Json(ApiResponse::ok(
        payments.into_iter().map(PaymentResponse::from).collect(),
        "Payments retrieved successfully",
    )))
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/api/payments/{payment_id}",
    tag = "payments",
    params(("payment_id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment retrieved successfully", body = ApiResponse<PaymentResponse>),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payment(
    _auth: AuthUser,
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<PaymentResponse>>> {
    let payment = payment::Entity::find_by_id(payment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment", payment_id))?;

    Ok(Json(ApiResponse::ok(PaymentResponse::from(payment), "Payment retrieved successfully")))
}

/// Amend a payment
#[utoipa::path(
    put,
    path = "/api/payments/{payment_id}",
    tag = "payments",
    params(("payment_id" = i32, Path, description = "Payment ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment updated successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_payment(
    auth: AuthUser,
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdatePaymentRequest>,
) -> ApiResult<Json<ApiResponse<PaymentResponse>>> {
    trace!("Entering update_payment function for payment_id: {}", payment_id);
    auth.require(FINANCE_ROLES)?;
    request.validate()?;

    let payment = amend_payment(
        &state.db,
        payment_id,
        PaymentAmendment {
            amount: request.amount,
            payment_date: request.payment_date,
            method: request.method.map(Into::into),
            reference: request.reference,
            note: request.note,
        },
    )
    .await?;

    state.invalidate_dashboard().await;
    info!("Payment {} amended by user {}", payment.id, auth.id);
    Ok(Json(ApiResponse::ok(PaymentResponse::from(payment), "Payment updated successfully")))
}

/// Delete a payment, reversing it on the ledger
#[utoipa::path(
    delete,
    path = "/api/payments/{payment_id}",
    tag = "payments",
    params(("payment_id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment deleted successfully", body = ApiResponse<PaymentResponse>),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    auth: AuthUser,
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<PaymentResponse>>> {
    auth.require(FINANCE_ROLES)?;

    let payment = reverse_payment(&state.db, payment_id).await?;

    state.invalidate_dashboard().await;
    info!("Payment {} reversed by user {}", payment.id, auth.id);
    Ok(Json(ApiResponse::ok(PaymentResponse::from(payment), "Payment deleted successfully")))
}

use axum::{
    extract::{Query, State},
    response::Json,
};
use axum_valid::Valid;
use common::DashboardStats;
use compute::reports::{dashboard_stats, recent_payments};
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::payments::PaymentResponse;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::schemas::{ApiResponse, AppState, CachedData, DASHBOARD_STATS_KEY};

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct RecentPaymentsQuery {
    /// Number of payments (default: 10)
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

/// Headline numbers for the dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard stats retrieved successfully", body = ApiResponse<DashboardStats>)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_dashboard_stats(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<DashboardStats>>> {
    if let Some(CachedData::DashboardStats(stats)) = state.cache.get(DASHBOARD_STATS_KEY).await {
        debug!("Dashboard stats served from cache");
        return Ok(Json(ApiResponse::ok(stats, "Dashboard stats retrieved from cache")));
    }

    let stats = dashboard_stats(&state.db).await?;
    state
        .cache
        .insert(DASHBOARD_STATS_KEY.to_string(), CachedData::DashboardStats(stats.clone()))
        .await;

    Ok(Json(ApiResponse::ok(stats, "Dashboard stats retrieved successfully")))
}

/// Latest payments, newest first
#[utoipa::path(
    get,
    path = "/api/dashboard/recent-payments",
    tag = "dashboard",
    params(RecentPaymentsQuery),
    responses(
        (status = 200, description = "Recent payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_recent_payments(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<RecentPaymentsQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentResponse>>>> {
    let payments = recent_payments(&state.db, query.limit.unwrap_or(10)).await?;

    Ok(Json(ApiResponse::ok(
        payments.into_iter().map(PaymentResponse::from).collect(),
        "Recent payments retrieved successfully",
    )))
}

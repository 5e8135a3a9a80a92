use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use common::{CalendarEventType, RolloverSummary};
use compute::{apply_semester_rollover, RolloverRequest};
use model::entities::{
    academic_calendar_event as event, academic_calendar_event_department as event_department,
    department,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::auth::{AuthUser, REGISTRY_ROLES};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiResponse, AppState};

/// A calendar event as submitted on create and on update
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[validate(schema(function = "validate_event_request"))]
pub struct CalendarEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(alias = "eventType")]
    pub event_type: CalendarEventType,
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    #[serde(alias = "endDate")]
    pub end_date: NaiveDate,
    /// Semester the event refers to; required for `semesterEnd`
    pub semester: Option<String>,
    /// Required for `semesterEnd`; ledger rows of the next semester open in it
    #[serde(alias = "academicYear")]
    pub academic_year: Option<String>,
    /// Defaults to true
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
    #[serde(default, alias = "affectedDepartments")]
    pub affected_departments: Vec<i32>,
}

fn validate_event_request(request: &CalendarEventRequest) -> Result<(), ValidationError> {
    if request.end_date < request.start_date {
        return Err(ValidationError::new("end_date_before_start_date"));
    }
    if request.event_type == CalendarEventType::SemesterEnd
        && (request.semester.as_deref().is_none_or(str::is_empty)
            || request.academic_year.as_deref().is_none_or(str::is_empty))
    {
        return Err(ValidationError::new("semester_end_requires_semester_and_academic_year"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalendarEventResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub event_type: CalendarEventType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub is_active: bool,
    pub affected_departments: Vec<i32>,
}

impl CalendarEventResponse {
    fn new(model: event::Model, affected_departments: Vec<i32>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            event_type: model.event_type.into(),
            start_date: model.start_date,
            end_date: model.end_date,
            semester: model.semester,
            academic_year: model.academic_year,
            is_active: model.is_active,
            affected_departments,
        }
    }
}

/// The stored event and, when it ended a semester, what the rollover did
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalendarEventWithRollover {
    pub event: CalendarEventResponse,
    pub rollover: Option<RolloverSummary>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct CalendarEventQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Page size (default: 100)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
    /// semesterStart, semesterEnd, holiday, examPeriod, registration or other
    pub event_type: Option<String>,
    pub academic_year: Option<String>,
    pub is_active: Option<bool>,
}

/// Deduplicates `ids` and checks that each one names a department.
async fn checked_departments<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> ApiResult<Vec<i32>> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(ids);
    }

    let found = department::Entity::find()
        .filter(department::Column::Id.is_in(ids.iter().copied()))
        .count(conn)
        .await?;
    if found != ids.len() as u64 {
        warn!("Calendar event names unknown departments: {:?}", ids);
        return Err(ApiError::BadRequest(
            "One or more affected departments do not exist".to_string(),
        ));
    }
    Ok(ids)
}

async fn link_departments<C: ConnectionTrait>(conn: &C, event_id: i32, department_ids: &[i32]) -> ApiResult<()> {
    event_department::Entity::delete_many()
        .filter(event_department::Column::EventId.eq(event_id))
        .exec(conn)
        .await?;

    if department_ids.is_empty() {
        return Ok(());
    }
    event_department::Entity::insert_many(department_ids.iter().map(|department_id| {
        event_department::ActiveModel {
            event_id: Set(event_id),
            department_id: Set(*department_id),
        }
    }))
    .exec_without_returning(conn)
    .await?;
    Ok(())
}

async fn departments_of<C: ConnectionTrait>(conn: &C, event_ids: &[i32]) -> ApiResult<HashMap<i32, Vec<i32>>> {
    let rows = event_department::Entity::find()
        .filter(event_department::Column::EventId.is_in(event_ids.iter().copied()))
        .order_by_asc(event_department::Column::DepartmentId)
        .all(conn)
        .await?;

    let mut by_event: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in rows {
        by_event.entry(row.event_id).or_default().push(row.department_id);
    }
    Ok(by_event)
}

/// Runs the rollover on `conn` when the event ends a semester.
async fn rollover_for<C: ConnectionTrait>(
    conn: &C,
    saved: &event::Model,
    department_ids: &[i32],
) -> ApiResult<RolloverSummary> {
    let request = RolloverRequest::new(
        saved.semester.clone().unwrap_or_default(),
        saved.academic_year.clone().unwrap_or_default(),
        department_ids.to_vec(),
    );
    info!(
        "Event {} ends semester {} of {} for departments {:?}",
        saved.id, request.semester, request.academic_year, request.department_ids
    );
    Ok(apply_semester_rollover(conn, &request).await?)
}

/// Create a calendar event
///
/// An active `semesterEnd` event promotes the students of the affected
/// departments in the same transaction, and the summary is returned with it.
#[utoipa::path(
    post,
    path = "/api/academic-calendar",
    tag = "academic-calendar",
    request_body = CalendarEventRequest,
    responses(
        (status = 201, description = "Event created, rollover applied if it ended a semester", body = ApiResponse<CalendarEventWithRollover>),
        (status = 400, description = "Invalid request or unknown department", body = ErrorResponse),
        (status = 500, description = "Rollover failed, nothing was changed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CalendarEventRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CalendarEventWithRollover>>)> {
    trace!("Entering create_event function");
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let txn = state.db.begin().await?;
    let department_ids = checked_departments(&txn, &request.affected_departments).await?;

    let saved = event::ActiveModel {
        title: Set(request.title),
        description: Set(request.description),
        event_type: Set(request.event_type.into()),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        semester: Set(request.semester),
        academic_year: Set(request.academic_year),
        is_active: Set(request.is_active.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    link_departments(&txn, saved.id, &department_ids).await?;

    let rollover = if saved.triggers_rollover() {
        Some(rollover_for(&txn, &saved, &department_ids).await?)
    } else {
        None
    };

    txn.commit().await?;

    if rollover.is_some() {
        state.invalidate_dashboard().await;
    }
    info!("Calendar event created with ID: {}, rollover: {}", saved.id, rollover.is_some());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            CalendarEventWithRollover {
                event: CalendarEventResponse::new(saved, department_ids),
                rollover,
            },
            "Calendar event created successfully",
        )),
    ))
}

/// Get calendar events
#[utoipa::path(
    get,
    path = "/api/academic-calendar",
    tag = "academic-calendar",
    params(CalendarEventQuery),
    responses(
        (status = 200, description = "Calendar events retrieved successfully", body = ApiResponse<Vec<CalendarEventResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_events(
    _auth: AuthUser,
    Valid(Query(query)): Valid<Query<CalendarEventQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<CalendarEventResponse>>>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(100);

    let mut query_builder = event::Entity::find();
    if let Some(event_type) = query.event_type.as_deref() {
        let event_type: CalendarEventType = event_type
            .parse()
            .map_err(|e: common::ParseEnumError| ApiError::Validation(e.to_string()))?;
        query_builder = query_builder.filter(event::Column::EventType.eq(event::EventType::from(event_type)));
    }
    if let Some(academic_year) = &query.academic_year {
        query_builder = query_builder.filter(event::Column::AcademicYear.eq(academic_year.as_str()));
    }
    if let Some(is_active) = query.is_active {
        query_builder = query_builder.filter(event::Column::IsActive.eq(is_active));
    }

    let events = query_builder
        .order_by_asc(event::Column::StartDate)
        .order_by_asc(event::Column::Id)
        .paginate(&state.db, limit)
        .fetch_page(page - 1)
        .await?;
    let ids: Vec<i32> = events.iter().map(|e| e.id).collect();
    let mut departments = departments_of(&state.db, &ids).await?;
    debug!("Retrieved {} calendar events", events.len());

    Ok(Json(ApiResponse::ok(
        events
            .into_iter()
            .map(|e| {
                let affected = departments.remove(&e.id).unwrap_or_default();
                CalendarEventResponse::new(e, affected)
            })
            .collect(),
        "Calendar events retrieved successfully",
    )))
}

/// Get a calendar event by ID
#[utoipa::path(
    get,
    path = "/api/academic-calendar/{event_id}",
    tag = "academic-calendar",
    params(("event_id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Calendar event retrieved successfully", body = ApiResponse<CalendarEventResponse>),
        (status = 404, description = "Calendar event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_event(
    _auth: AuthUser,
    Path(event_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<CalendarEventResponse>>> {
    let found = event::Entity::find_by_id(event_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Calendar event", event_id))?;
    let affected = departments_of(&state.db, &[event_id])
        .await?
        .remove(&event_id)
        .unwrap_or_default();

    Ok(Json(ApiResponse::ok(
        CalendarEventResponse::new(found, affected),
        "Calendar event retrieved successfully",
    )))
}

/// Replace a calendar event
///
/// The rollover runs when the update turns the event into an active
/// `semesterEnd` event; saving an event that already was one does not run it
/// again.
#[utoipa::path(
    put,
    path = "/api/academic-calendar/{event_id}",
    tag = "academic-calendar",
    params(("event_id" = i32, Path, description = "Event ID")),
    request_body = CalendarEventRequest,
    responses(
        (status = 200, description = "Event updated, rollover applied if it now ends a semester", body = ApiResponse<CalendarEventWithRollover>),
        (status = 400, description = "Invalid request or unknown department", body = ErrorResponse),
        (status = 404, description = "Calendar event not found", body = ErrorResponse),
        (status = 500, description = "Rollover failed, nothing was changed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_event(
    auth: AuthUser,
    Path(event_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CalendarEventRequest>,
) -> ApiResult<Json<ApiResponse<CalendarEventWithRollover>>> {
    trace!("Entering update_event function for event_id: {}", event_id);
    auth.require(REGISTRY_ROLES)?;
    request.validate()?;

    let txn = state.db.begin().await?;

    let existing = event::Entity::find_by_id(event_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Calendar event", event_id))?;
    let was_semester_end = existing.triggers_rollover();
    let department_ids = checked_departments(&txn, &request.affected_departments).await?;

    let mut active = existing.into_active_model();
    active.title = Set(request.title);
    active.description = Set(request.description);
    active.event_type = Set(request.event_type.into());
    active.start_date = Set(request.start_date);
    active.end_date = Set(request.end_date);
    active.semester = Set(request.semester);
    active.academic_year = Set(request.academic_year);
    active.is_active = Set(request.is_active.unwrap_or(true));
    let saved = active.update(&txn).await?;
    link_departments(&txn, saved.id, &department_ids).await?;

    let rollover = if saved.triggers_rollover() && !was_semester_end {
        Some(rollover_for(&txn, &saved, &department_ids).await?)
    } else {
        None
    };

    txn.commit().await?;

    if rollover.is_some() {
        state.invalidate_dashboard().await;
    }
    info!("Calendar event {} updated, rollover: {}", saved.id, rollover.is_some());
    Ok(Json(ApiResponse::ok(
        CalendarEventWithRollover {
            event: CalendarEventResponse::new(saved, department_ids),
            rollover,
        },
        "Calendar event updated successfully",
    )))
}

/// Delete a calendar event
///
/// Promotions already made by the event stay in place.
#[utoipa::path(
    delete,
    path = "/api/academic-calendar/{event_id}",
    tag = "academic-calendar",
    params(("event_id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Calendar event deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Calendar event not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_event(
    auth: AuthUser,
    Path(event_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(REGISTRY_ROLES)?;

    let txn = state.db.begin().await?;
    link_departments(&txn, event_id, &[]).await?;
    let result = event::Entity::delete_by_id(event_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found("Calendar event", event_id));
    }
    txn.commit().await?;

    info!("Calendar event {} deleted", event_id);
    Ok(Json(ApiResponse::ok(
        format!("Calendar event {} deleted", event_id),
        "Calendar event deleted successfully",
    )))
}

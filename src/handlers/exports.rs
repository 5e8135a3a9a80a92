use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use model::entities::{course, department, payment, student};
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::collections::HashMap;
use tracing::{info, instrument, trace};

use super::settings::{setting_value, DEFAULT_UNIVERSITY_NAME, UNIVERSITY_NAME_KEY};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::export::{Cell, ExportFormat, ExportKind, ExportTable};
use crate::schemas::AppState;

async fn department_codes(db: &DatabaseConnection) -> ApiResult<HashMap<i32, String>> {
    Ok(department::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.code))
        .collect())
}

async fn students_table(db: &DatabaseConnection, university: &str) -> ApiResult<ExportTable> {
    let departments = department_codes(db).await?;
    let students = student::Entity::find()
        .order_by_asc(student::Column::StudentId)
        .all(db)
        .await?;

    let mut table = ExportTable::new(
        format!("{} - Students", university),
        "Students",
        &["Student ID", "Name", "Email", "Department", "Semester", "Session", "Status"],
    );
    for s in students {
        table.push_row(vec![
            Cell::text(s.student_id.as_str()),
            Cell::text(s.full_name()),
            Cell::text(s.email),
            Cell::text(departments.get(&s.department_id).cloned().unwrap_or_default()),
            Cell::text(s.semester),
            Cell::text(s.session),
            Cell::text(if s.is_active { "active" } else { "inactive" }),
        ]);
    }
    Ok(table)
}

async fn courses_table(db: &DatabaseConnection, university: &str) -> ApiResult<ExportTable> {
    let departments = department_codes(db).await?;
    let courses = course::Entity::find()
        .order_by_asc(course::Column::DepartmentId)
        .order_by_asc(course::Column::Semester)
        .order_by_asc(course::Column::Code)
        .all(db)
        .await?;

    let mut table = ExportTable::new(
        format!("{} - Courses", university),
        "Courses",
        &["Code", "Title", "Department", "Semester", "Credits"],
    );
    for c in courses {
        table.push_row(vec![
            Cell::text(c.code),
            Cell::text(c.title),
            Cell::text(departments.get(&c.department_id).cloned().unwrap_or_default()),
            Cell::text(c.semester.to_string()),
            Cell::text(c.credits.to_string()),
        ]);
    }
    Ok(table)
}

async fn payments_table(db: &DatabaseConnection, university: &str) -> ApiResult<ExportTable> {
    let students: HashMap<i32, String> = student::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.student_id))
        .collect();
    let payments = payment::Entity::find()
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await?;

    let mut table = ExportTable::new(
        format!("{} - Payments", university),
        "Payments",
        &["Date", "Student ID", "Type", "Method", "Amount", "Reference"],
    );
    for p in payments {
        table.push_row(vec![
            Cell::text(p.payment_date.to_string()),
            Cell::text(students.get(&p.student_id).cloned().unwrap_or_default()),
            Cell::text(common::PaymentType::from(p.payment_type).as_str()),
            Cell::text(common::PaymentMethod::from(p.method).as_str()),
            Cell::Number(p.amount.to_f64().unwrap_or_default()),
            Cell::text(p.reference.unwrap_or_default()),
        ]);
    }
    Ok(table)
}

/// Download students, courses or payments as a PDF or Excel file
#[utoipa::path(
    get,
    path = "/api/export/{entity}/{format}",
    tag = "exports",
    params(
        ("entity" = String, Path, description = "students, courses or payments"),
        ("format" = String, Path, description = "pdf or excel")
    ),
    responses(
        (status = 200, description = "Document generated", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 400, description = "Unknown entity or format", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn export_document(
    _auth: AuthUser,
    Path((entity, format)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ApiResult<Response> {
    trace!("Entering export_document function");
    let kind: ExportKind = entity
        .parse()
        .map_err(|e: crate::export::ExportError| ApiError::BadRequest(e.to_string()))?;
    let format: ExportFormat = format
        .parse()
        .map_err(|e: crate::export::ExportError| ApiError::BadRequest(e.to_string()))?;

    let university = setting_value(&state.db, UNIVERSITY_NAME_KEY)
        .await?
        .unwrap_or_else(|| DEFAULT_UNIVERSITY_NAME.to_string());

    let table = match kind {
        ExportKind::Students => students_table(&state.db, &university).await?,
        ExportKind::Courses => courses_table(&state.db, &university).await?,
        ExportKind::Payments => payments_table(&state.db, &university).await?,
    };

    let bytes = format
        .render(&table)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let filename = format!("{}.{}", kind.as_str(), format.extension());

    info!("Exported {} rows of {} as {}", table.rows.len(), kind.as_str(), filename);
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

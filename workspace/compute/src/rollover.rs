//! Semester rollover.
//!
//! When a semester ends for a set of departments, every active student of
//! those departments sitting in that semester moves to the next one and gets a
//! fresh ledger row billed at the department price. Students who finish the
//! last semester of their program graduate instead and get no new row.
//!
//! The batch is all-or-nothing and can be repeated: a ledger row that already
//! exists for the next semester is left alone.

use std::collections::HashMap;

use chrono::Utc;
use common::{GRADUATED_SEMESTER, RolloverSummary};
use model::entities::{department, student, student_account};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{ComputeError, Result};

/// Which semester just ended, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverRequest {
    /// Semester number that ended, as text ("1", "2", ...)
    pub semester: String,
    /// Academic year the new ledger rows are opened in
    pub academic_year: String,
    pub department_ids: Vec<i32>,
}

impl RolloverRequest {
    pub fn new(semester: impl Into<String>, academic_year: impl Into<String>, department_ids: Vec<i32>) -> Self {
        Self {
            semester: semester.into(),
            academic_year: academic_year.into(),
            department_ids,
        }
    }
}

/// Parses a semester number. Only positive integers are semesters.
pub fn parse_semester(semester: &str) -> Result<i32> {
    match semester.trim().parse::<i32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(ComputeError::InvalidSemester(semester.to_string())),
    }
}

/// Runs the rollover in its own transaction.
pub async fn run_semester_rollover(
    db: &DatabaseConnection,
    request: &RolloverRequest,
) -> Result<RolloverSummary> {
    let txn = db.begin().await?;
    let summary = apply_semester_rollover(&txn, request).await?;
    txn.commit().await?;
    Ok(summary)
}

/// Applies the rollover on `conn`.
///
/// Callers that need the rollover to commit together with other writes pass
/// an open transaction; nothing here commits.
#[instrument(skip(conn))]
pub async fn apply_semester_rollover<C: ConnectionTrait>(
    conn: &C,
    request: &RolloverRequest,
) -> Result<RolloverSummary> {
    trace!("Entering apply_semester_rollover");

    let current = parse_semester(&request.semester)?;
    let next = current
        .checked_add(1)
        .ok_or_else(|| ComputeError::InvalidSemester(request.semester.clone()))?;

    let mut summary = RolloverSummary {
        semester: current.to_string(),
        academic_year: request.academic_year.clone(),
        ..Default::default()
    };

    if request.department_ids.is_empty() {
        debug!("No departments given, nothing to roll over");
        return Ok(summary);
    }

    let departments: HashMap<i32, department::Model> = department::Entity::find()
        .filter(department::Column::Id.is_in(request.department_ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    if let Some(missing) = request
        .department_ids
        .iter()
        .find(|id| !departments.contains_key(id))
    {
        warn!("Department {} does not exist", missing);
        return Err(ComputeError::not_found("Department", *missing));
    }

    let students = student::Entity::find()
        .filter(student::Column::IsActive.eq(true))
        .filter(student::Column::DepartmentId.is_in(request.department_ids.iter().copied()))
        .filter(student::Column::Semester.eq(current.to_string()))
        .order_by_asc(student::Column::Id)
        .all(conn)
        .await?;

    debug!(
        "Found {} active students in semester {} across {} departments",
        students.len(),
        current,
        departments.len()
    );

    for student in students {
        summary.processed += 1;

        // Presence is checked above; the filter only returns these departments
        let Some(dept) = departments.get(&student.department_id) else {
            continue;
        };

        let student_pk = student.id;
        let mut active = student.into_active_model();

        if next > dept.total_semesters {
            trace!("Student {} finished semester {} of {}, graduating", student_pk, current, dept.total_semesters);
            active.semester = Set(GRADUATED_SEMESTER.to_string());
            active.is_active = Set(false);
            active.update(conn).await?;
            summary.graduated += 1;
            continue;
        }

        active.semester = Set(next.to_string());
        active.update(conn).await?;
        summary.promoted += 1;

        let existing = student_account::Entity::find()
            .filter(student_account::Column::StudentId.eq(student_pk))
            .filter(student_account::Column::AcademicYear.eq(request.academic_year.as_str()))
            .filter(student_account::Column::Semester.eq(next.to_string()))
            .count(conn)
            .await?;

        if existing > 0 {
            debug!("Student {} already has a ledger row for semester {}", student_pk, next);
            summary.skipped_existing_accounts += 1;
            continue;
        }

        student_account::ActiveModel {
            student_id: Set(student_pk),
            academic_year: Set(request.academic_year.clone()),
            semester: Set(next.to_string()),
            tuition_fee: Set(dept.price),
            discount: Set(Decimal::ZERO),
            paid_amount: Set(Decimal::ZERO),
            total_due: Set(dept.price),
            scholarship: Set(None),
            forwarded: Set(None),
            status: Set(student_account::AccountStatus::Pending),
            paid_type: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        summary.accounts_created += 1;
    }

    info!(
        "Semester {} rollover for {}: processed={}, promoted={}, graduated={}, accounts_created={}, skipped={}",
        summary.semester,
        summary.academic_year,
        summary.processed,
        summary.promoted,
        summary.graduated,
        summary.accounts_created,
        summary.skipped_existing_accounts
    );

    Ok(summary)
}

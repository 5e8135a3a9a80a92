//! Admission decisions: approving turns an application into an enrolled
//! student with a first-semester ledger row, rejecting just closes it.

use chrono::Utc;
use model::entities::{application, department, student, student_account};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{ComputeError, Result};
use crate::rollover::parse_semester;

/// Everything an approval created or changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub application: application::Model,
    pub student: student::Model,
    pub account: student_account::Model,
}

/// Year part used in generated student numbers: "2024-2025" gives "2024".
fn intake_year(academic_year: &str) -> &str {
    academic_year
        .split(['-', '/'])
        .next()
        .map(str::trim)
        .unwrap_or(academic_year)
}

/// Next free student number of the form `{DEPTCODE}-{YEAR}-{NNNN}`.
///
/// The sequence continues after the highest number already issued for the
/// department and year, so deleted students never cause a reuse.
pub async fn next_student_number<C: ConnectionTrait>(
    conn: &C,
    department_code: &str,
    academic_year: &str,
) -> Result<String> {
    let prefix = format!("{}-{}-", department_code.to_uppercase(), intake_year(academic_year));

    let issued = student::Entity::find()
        .filter(student::Column::StudentId.starts_with(prefix.as_str()))
        .all(conn)
        .await?;

    let highest = issued
        .iter()
        .filter_map(|s| s.student_id.get(prefix.len()..)?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    Ok(format!("{}{:04}", prefix, highest + 1))
}

/// A student to enroll, with the academic placement to start in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    /// Student number; generated when absent
    pub student_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub faculty_id: i32,
    pub department_id: i32,
    /// Semester to start in, "1" when absent
    pub semester: Option<String>,
    pub academic_year: String,
    pub session: String,
}

impl From<&application::Model> for Enrollment {
    fn from(application: &application::Model) -> Self {
        Self {
            student_id: None,
            first_name: application.first_name.clone(),
            last_name: application.last_name.clone(),
            email: application.email.clone(),
            phone: application.phone.clone(),
            faculty_id: application.faculty_id,
            department_id: application.department_id,
            semester: None,
            academic_year: application.academic_year.clone(),
            session: application.session.clone(),
        }
    }
}

/// Creates the student and the ledger row of the starting semester, billed at
/// the department price. Nothing here commits.
pub async fn enroll_student<C: ConnectionTrait>(
    conn: &C,
    enrollment: Enrollment,
) -> Result<(student::Model, student_account::Model)> {
    trace!("Entering enroll_student");

    let department = department::Entity::find_by_id(enrollment.department_id)
        .one(conn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Department", enrollment.department_id))?;

    if department.faculty_id != enrollment.faculty_id {
        return Err(ComputeError::Validation(format!(
            "Department {} does not belong to faculty {}",
            department.id, enrollment.faculty_id
        )));
    }

    let semester = match enrollment.semester.as_deref() {
        Some(semester) => {
            let number = parse_semester(semester)?;
            if number > department.total_semesters {
                return Err(ComputeError::InvalidSemester(semester.to_string()));
            }
            number.to_string()
        }
        None => "1".to_string(),
    };

    let email_taken = student::Entity::find()
        .filter(student::Column::Email.eq(enrollment.email.as_str()))
        .one(conn)
        .await?
        .is_some();
    if email_taken {
        return Err(ComputeError::Conflict(format!(
            "A student with email {} already exists",
            enrollment.email
        )));
    }

    let student_number = match enrollment.student_id {
        Some(number) => number,
        None => next_student_number(conn, &department.code, &enrollment.academic_year).await?,
    };
    debug!("Enrolling {} in semester {}", student_number, semester);

    let student = student::ActiveModel {
        student_id: Set(student_number),
        first_name: Set(enrollment.first_name),
        last_name: Set(enrollment.last_name),
        email: Set(enrollment.email),
        phone: Set(enrollment.phone),
        faculty_id: Set(enrollment.faculty_id),
        department_id: Set(enrollment.department_id),
        semester: Set(semester.clone()),
        academic_year: Set(enrollment.academic_year.clone()),
        session: Set(enrollment.session),
        is_active: Set(true),
        enrolled_at: Set(Utc::now().date_naive()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let account = student_account::ActiveModel {
        student_id: Set(student.id),
        academic_year: Set(enrollment.academic_year),
        semester: Set(semester),
        tuition_fee: Set(department.price),
        discount: Set(Decimal::ZERO),
        paid_amount: Set(Decimal::ZERO),
        total_due: Set(department.price),
        scholarship: Set(None),
        forwarded: Set(None),
        status: Set(student_account::AccountStatus::Pending),
        paid_type: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok((student, account))
}

/// Enrolls a student directly, without an application.
#[instrument(skip(db))]
pub async fn register_student(
    db: &DatabaseConnection,
    enrollment: Enrollment,
) -> Result<(student::Model, student_account::Model)> {
    let txn = db.begin().await?;
    let (student, account) = enroll_student(&txn, enrollment).await?;
    txn.commit().await?;

    info!("Registered student {} ({})", student.id, student.student_id);
    Ok((student, account))
}

#[instrument(skip(db))]
pub async fn approve_application(
    db: &DatabaseConnection,
    application_id: i32,
    remarks: Option<String>,
) -> Result<Admission> {
    trace!("Entering approve_application");

    let txn = db.begin().await?;

    let application = application::Entity::find_by_id(application_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ComputeError::not_found("Application", application_id))?;

    if application.status != application::ApplicationStatus::Pending {
        warn!("Application {} is already {:?}", application_id, application.status);
        return Err(ComputeError::Conflict(format!(
            "Application {} is not pending",
            application_id
        )));
    }

    let (student, account) = enroll_student(&txn, Enrollment::from(&application)).await?;

    let mut active = application.into_active_model();
    active.status = Set(application::ApplicationStatus::Approved);
    active.student_id = Set(Some(student.id));
    if remarks.is_some() {
        active.remarks = Set(remarks);
    }
    let application = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Approved application {} as student {} ({})",
        application.id, student.id, student.student_id
    );
    Ok(Admission {
        application,
        student,
        account,
    })
}

#[instrument(skip(db))]
pub async fn reject_application(
    db: &DatabaseConnection,
    application_id: i32,
    remarks: Option<String>,
) -> Result<application::Model> {
    trace!("Entering reject_application");

    let application = application::Entity::find_by_id(application_id)
        .one(db)
        .await?
        .ok_or_else(|| ComputeError::not_found("Application", application_id))?;

    if application.status != application::ApplicationStatus::Pending {
        warn!("Application {} is already {:?}", application_id, application.status);
        return Err(ComputeError::Conflict(format!(
            "Application {} is not pending",
            application_id
        )));
    }

    let mut active = application.into_active_model();
    active.status = Set(application::ApplicationStatus::Rejected);
    if remarks.is_some() {
        active.remarks = Set(remarks);
    }
    let application = active.update(db).await?;

    info!("Rejected application {}", application.id);
    Ok(application)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use sea_orm::{ModelTrait, PaginatorTrait};

    async fn create_application(
        db: &DatabaseConnection,
        department: &department::Model,
        email: &str,
    ) -> Result<application::Model> {
        Ok(application::ActiveModel {
            first_name: Set("Nadia".to_string()),
            last_name: Set("Karim".to_string()),
            email: Set(email.to_string()),
            phone: Set(Some("+8801700000000".to_string())),
            faculty_id: Set(department.faculty_id),
            department_id: Set(department.id),
            academic_year: Set("2024-2025".to_string()),
            session: Set("Fall".to_string()),
            status: Set(application::ApplicationStatus::Pending),
            remarks: Set(None),
            student_id: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }

    #[tokio::test]
    async fn test_approval_enrolls_student_with_first_account() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "cse", Decimal::new(750, 0), 8).await?;
        let application = create_application(&db, &cse, "nadia@example.edu").await?;

        let admission =
            approve_application(&db, application.id, Some("Welcome".to_string())).await?;

        assert_eq!(admission.student.student_id, "CSE-2024-0001");
        assert_eq!(admission.student.semester, "1");
        assert!(admission.student.is_active);
        assert_eq!(admission.account.semester, "1");
        assert_eq!(admission.account.academic_year, "2024-2025");
        assert_eq!(admission.account.tuition_fee, Decimal::new(750, 0));
        assert_eq!(admission.account.total_due, Decimal::new(750, 0));
        assert_eq!(admission.application.status, application::ApplicationStatus::Approved);
        assert_eq!(admission.application.student_id, Some(admission.student.id));
        assert_eq!(admission.application.remarks.as_deref(), Some("Welcome"));

        let accounts = admission.student.find_related(student_account::Entity).count(&db).await?;
        assert_eq!(accounts, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_student_numbers_continue_the_sequence() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::new(750, 0), 8).await?;
        create_student(&db, &cse, "CSE-2024-0007", "2", true).await?;

        let application = create_application(&db, &cse, "next@example.edu").await?;
        let admission = approve_application(&db, application.id, None).await?;
        assert_eq!(admission.student.student_id, "CSE-2024-0008");

        assert_eq!(next_student_number(&db, "EEE", "2024").await?, "EEE-2024-0001");

        Ok(())
    }

    #[tokio::test]
    async fn test_decided_application_cannot_be_decided_again() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::new(750, 0), 8).await?;
        let approved = create_application(&db, &cse, "a@example.edu").await?;
        let rejected = create_application(&db, &cse, "b@example.edu").await?;

        approve_application(&db, approved.id, None).await?;
        let rejected = reject_application(&db, rejected.id, Some("Incomplete".to_string())).await?;
        assert_eq!(rejected.status, application::ApplicationStatus::Rejected);

        assert!(matches!(
            approve_application(&db, approved.id, None).await,
            Err(ComputeError::Conflict(_))
        ));
        assert!(matches!(
            approve_application(&db, rejected.id, None).await,
            Err(ComputeError::Conflict(_))
        ));
        assert!(matches!(
            reject_application(&db, approved.id, None).await,
            Err(ComputeError::Conflict(_))
        ));
        assert!(matches!(
            approve_application(&db, 999, None).await,
            Err(ComputeError::NotFound { .. })
        ));

        assert_eq!(student::Entity::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_direct_registration_starts_in_given_semester() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let other_faculty = create_faculty(&db, "BUS").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::new(600, 0), 8).await?;

        let enrollment = Enrollment {
            student_id: Some("TRANSFER-01".to_string()),
            first_name: "Omar".to_string(),
            last_name: "Faruk".to_string(),
            email: "omar@example.edu".to_string(),
            phone: None,
            faculty_id: faculty.id,
            department_id: cse.id,
            semester: Some("3".to_string()),
            academic_year: "2024".to_string(),
            session: "2024-2025".to_string(),
        };

        let (student, account) = register_student(&db, enrollment.clone()).await?;
        assert_eq!(student.student_id, "TRANSFER-01");
        assert_eq!(student.semester, "3");
        assert_eq!(account.semester, "3");
        assert_eq!(account.tuition_fee, Decimal::new(600, 0));

        let wrong_faculty = Enrollment {
            email: "other@example.edu".to_string(),
            student_id: None,
            faculty_id: other_faculty.id,
            ..enrollment.clone()
        };
        assert!(matches!(
            register_student(&db, wrong_faculty).await,
            Err(ComputeError::Validation(_))
        ));

        let past_program = Enrollment {
            email: "late@example.edu".to_string(),
            student_id: None,
            semester: Some("9".to_string()),
            ..enrollment
        };
        assert!(matches!(
            register_student(&db, past_program).await,
            Err(ComputeError::InvalidSemester(_))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_application_pending() -> Result<()> {
        let db = setup_db().await?;
        let faculty = create_faculty(&db, "ENG").await?;
        let cse = create_department(&db, &faculty, "CSE", Decimal::new(750, 0), 8).await?;
        let existing = create_student(&db, &cse, "CSE-2023-0001", "3", true).await?;
        let application = create_application(&db, &cse, &existing.email).await?;

        let result = approve_application(&db, application.id, None).await;
        assert!(matches!(result, Err(ComputeError::Conflict(_))));

        let reloaded = application::Entity::find_by_id(application.id).one(&db).await?.unwrap();
        assert_eq!(reloaded.status, application::ApplicationStatus::Pending);
        assert_eq!(student_account::Entity::find().count(&db).await?, 0);

        Ok(())
    }
}

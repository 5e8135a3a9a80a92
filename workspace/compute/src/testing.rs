//! Fixtures shared by the compute tests.

use chrono::{NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{department, faculty, student, student_account};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};

pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    // Connect to the SQLite database
    let db = Database::connect("sqlite::memory:").await?;

    // Enable foreign keys
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

    Migrator::up(&db, None).await.expect("Migrations failed.");
    Ok(db)
}

pub async fn create_faculty(db: &DatabaseConnection, code: &str) -> Result<faculty::Model, DbErr> {
    faculty::ActiveModel {
        name: Set(format!("Faculty {code}")),
        code: Set(code.to_string()),
        dean: Set(None),
        description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_department(
    db: &DatabaseConnection,
    faculty: &faculty::Model,
    code: &str,
    price: Decimal,
    total_semesters: i32,
) -> Result<department::Model, DbErr> {
    department::ActiveModel {
        faculty_id: Set(faculty.id),
        name: Set(format!("Department {code}")),
        code: Set(code.to_string()),
        price: Set(price),
        batch: Set(None),
        total_semesters: Set(total_semesters),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_student(
    db: &DatabaseConnection,
    department: &department::Model,
    code: &str,
    semester: &str,
    is_active: bool,
) -> Result<student::Model, DbErr> {
    student::ActiveModel {
        student_id: Set(code.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set(code.to_string()),
        email: Set(format!("{}@example.edu", code.to_lowercase())),
        phone: Set(None),
        faculty_id: Set(department.faculty_id),
        department_id: Set(department.id),
        semester: Set(semester.to_string()),
        academic_year: Set("2024".to_string()),
        session: Set("2024-2025".to_string()),
        is_active: Set(is_active),
        enrolled_at: Set(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_account(
    db: &DatabaseConnection,
    student: &student::Model,
    academic_year: &str,
    semester: &str,
    tuition_fee: Decimal,
) -> Result<student_account::Model, DbErr> {
    student_account::ActiveModel {
        student_id: Set(student.id),
        academic_year: Set(academic_year.to_string()),
        semester: Set(semester.to_string()),
        tuition_fee: Set(tuition_fee),
        discount: Set(Decimal::ZERO),
        paid_amount: Set(Decimal::ZERO),
        total_due: Set(tuition_fee),
        scholarship: Set(None),
        forwarded: Set(None),
        status: Set(student_account::AccountStatus::Pending),
        paid_type: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

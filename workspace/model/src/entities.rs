//! This file serves as the root for all SeaORM entity modules.
//! The data model of the university administration: academic structure,
//! students with their semester ledgers, payments, admissions and the
//! academic calendar.

pub mod academic_calendar_event;
pub mod academic_calendar_event_department;
pub mod application;
pub mod course;
pub mod department;
pub mod faculty;
pub mod payment;
pub mod setting;
pub mod student;
pub mod student_account;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::academic_calendar_event::Entity as AcademicCalendarEvent;
    pub use super::academic_calendar_event_department::Entity as AcademicCalendarEventDepartment;
    pub use super::application::Entity as Application;
    pub use super::course::Entity as Course;
    pub use super::department::Entity as Department;
    pub use super::faculty::Entity as Faculty;
    pub use super::payment::Entity as Payment;
    pub use super::setting::Entity as Setting;
    pub use super::student::Entity as Student;
    pub use super::student_account::Entity as StudentAccount;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn new_department(db: &DatabaseConnection) -> Result<department::Model, DbErr> {
        let faculty = faculty::ActiveModel {
            name: Set("Faculty of Engineering".to_string()),
            code: Set("ENG".to_string()),
            dean: Set(Some("Dr. Rahman".to_string())),
            description: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        department::ActiveModel {
            faculty_id: Set(faculty.id),
            name: Set("Computer Science".to_string()),
            code: Set("CSE".to_string()),
            price: Set(Decimal::new(50000, 2)),
            batch: Set(Some("Fall 2024".to_string())),
            total_semesters: Set(8),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    fn new_student(department: &department::Model, code: &str, semester: &str) -> student::ActiveModel {
        student::ActiveModel {
            student_id: Set(code.to_string()),
            first_name: Set("Ayesha".to_string()),
            last_name: Set(code.to_string()),
            email: Set(format!("{}@example.edu", code.to_lowercase())),
            phone: Set(None),
            faculty_id: Set(department.faculty_id),
            department_id: Set(department.id),
            semester: Set(semester.to_string()),
            academic_year: Set("2024".to_string()),
            session: Set("2024-2025".to_string()),
            is_active: Set(true),
            enrolled_at: Set(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let department = new_department(&db).await?;

        let student = new_student(&department, "CSE-2024-0001", "3").insert(&db).await?;
        assert_eq!(student.semester_number(), Some(3));
        assert_eq!(student.full_name(), "Ayesha CSE-2024-0001");

        let account = student_account::ActiveModel {
            student_id: Set(student.id),
            academic_year: Set("2024".to_string()),
            semester: Set("3".to_string()),
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
        .insert(&db)
        .await?;

        payment::ActiveModel {
            student_id: Set(student.id),
            student_account_id: Set(Some(account.id)),
            amount: Set(Decimal::new(20000, 2)),
            payment_date: Set(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            payment_type: Set(payment::PaymentType::Tuition),
            method: Set(payment::PaymentMethod::BankTransfer),
            reference: Set(Some("TRX-1".to_string())),
            note: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Relations resolve in both directions
        let accounts = student.find_related(StudentAccount).all(&db).await?;
        assert_eq!(accounts.len(), 1);
        let payments = account.find_related(Payment).all(&db).await?;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].method, payment::PaymentMethod::BankTransfer);

        let owning_department = student.find_related(Department).one(&db).await?.unwrap();
        assert_eq!(owning_department.code, "CSE");
        assert_eq!(owning_department.price, Decimal::new(500, 0));

        Ok(())
    }

    #[tokio::test]
    async fn test_calendar_event_departments() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let department = new_department(&db).await?;

        let event = academic_calendar_event::ActiveModel {
            title: Set("End of Spring semester".to_string()),
            description: Set(None),
            event_type: Set(academic_calendar_event::EventType::SemesterEnd),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            end_date: Set(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            semester: Set(Some("3".to_string())),
            academic_year: Set(Some("2024".to_string())),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        assert!(event.triggers_rollover());

        let link = academic_calendar_event_department::ActiveModel {
            event_id: Set(event.id),
            department_id: Set(department.id),
        }
        .insert(&db)
        .await?;

        let departments = event.find_related(Department).all(&db).await?;
        assert_eq!(departments.len(), 1);
        assert_eq!(departments[0].id, department.id);

        let links = event.find_related(AcademicCalendarEventDepartment).all(&db).await?;
        assert_eq!(links, vec![link.clone()]);
        let linked_event = link.find_related(AcademicCalendarEvent).one(&db).await?.unwrap();
        assert_eq!(linked_event.id, event.id);
        let linked_department = link.find_related(Department).one(&db).await?.unwrap();
        assert_eq!(linked_department.id, department.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_student_account_is_unique_per_semester() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let department = new_department(&db).await?;
        let student = new_student(&department, "CSE-2024-0002", "1").insert(&db).await?;

        let ledger_row = || student_account::ActiveModel {
            student_id: Set(student.id),
            academic_year: Set("2024".to_string()),
            semester: Set("1".to_string()),
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
        };

        ledger_row().insert(&db).await?;
        assert!(ledger_row().insert(&db).await.is_err());

        let rows = StudentAccount::find()
            .filter(student_account::Column::StudentId.eq(student.id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);

        Ok(())
    }
}

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Name))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string_len(Users::Role, 20))
                    .col(boolean(Users::IsActive).default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create faculties table
        manager
            .create_table(
                Table::create()
                    .table(Faculties::Table)
                    .if_not_exists()
                    .col(pk_auto(Faculties::Id))
                    .col(string(Faculties::Name).unique_key())
                    .col(string(Faculties::Code).unique_key())
                    .col(string_null(Faculties::Dean))
                    .col(string_null(Faculties::Description))
                    .to_owned(),
            )
            .await?;

        // Create departments table
        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(pk_auto(Departments::Id))
                    .col(integer(Departments::FacultyId))
                    .col(string(Departments::Name))
                    .col(string(Departments::Code).unique_key())
                    .col(decimal(Departments::Price).decimal_len(16, 4))
                    .col(string_null(Departments::Batch))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_departments_faculty")
                            .from(Departments::Table, Departments::FacultyId)
                            .to(Faculties::Table, Faculties::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create courses table
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(pk_auto(Courses::Id))
                    .col(integer(Courses::DepartmentId))
                    .col(string(Courses::Code).unique_key())
                    .col(string(Courses::Title))
                    .col(integer(Courses::Credits))
                    .col(integer(Courses::Semester))
                    .col(string_null(Courses::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_department")
                            .from(Courses::Table, Courses::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create students table
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_auto(Students::Id))
                    .col(string(Students::StudentId).unique_key())
                    .col(string(Students::FirstName))
                    .col(string(Students::LastName))
                    .col(string(Students::Email).unique_key())
                    .col(string_null(Students::Phone))
                    .col(integer(Students::FacultyId))
                    .col(integer(Students::DepartmentId))
                    .col(string_len(Students::Semester, 20))
                    .col(string(Students::AcademicYear))
                    .col(string(Students::Session))
                    .col(boolean(Students::IsActive).default(true))
                    .col(date(Students::EnrolledAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_faculty")
                            .from(Students::Table, Students::FacultyId)
                            .to(Faculties::Table, Faculties::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_department")
                            .from(Students::Table, Students::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create student_accounts table
        manager
            .create_table(
                Table::create()
                    .table(StudentAccounts::Table)
                    .if_not_exists()
                    .col(pk_auto(StudentAccounts::Id))
                    .col(integer(StudentAccounts::StudentId))
                    .col(string(StudentAccounts::AcademicYear))
                    .col(string_len(StudentAccounts::Semester, 20))
                    .col(decimal(StudentAccounts::TuitionFee).decimal_len(16, 4))
                    .col(decimal(StudentAccounts::Discount).decimal_len(16, 4))
                    .col(decimal(StudentAccounts::PaidAmount).decimal_len(16, 4))
                    .col(decimal(StudentAccounts::TotalDue).decimal_len(16, 4))
                    .col(decimal_null(StudentAccounts::Scholarship).decimal_len(8, 4))
                    .col(decimal_null(StudentAccounts::Forwarded).decimal_len(16, 4))
                    .col(string_len(StudentAccounts::Status, 15))
                    .col(string_null(StudentAccounts::PaidType))
                    .col(timestamp_with_time_zone(StudentAccounts::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_accounts_student")
                            .from(StudentAccounts::Table, StudentAccounts::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::StudentId))
                    .col(integer_null(Payments::StudentAccountId))
                    .col(decimal(Payments::Amount).decimal_len(16, 4))
                    .col(date(Payments::PaymentDate))
                    .col(string_len(Payments::PaymentType, 20))
                    .col(string_len(Payments::Method, 20))
                    .col(string_null(Payments::Reference))
                    .col(string_null(Payments::Note))
                    .col(timestamp_with_time_zone(Payments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_student")
                            .from(Payments::Table, Payments::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_student_account")
                            .from(Payments::Table, Payments::StudentAccountId)
                            .to(StudentAccounts::Table, StudentAccounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create applications table
        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(pk_auto(Applications::Id))
                    .col(string(Applications::FirstName))
                    .col(string(Applications::LastName))
                    .col(string(Applications::Email))
                    .col(string_null(Applications::Phone))
                    .col(integer(Applications::FacultyId))
                    .col(integer(Applications::DepartmentId))
                    .col(string(Applications::AcademicYear))
                    .col(string(Applications::Session))
                    .col(string_len(Applications::Status, 15))
                    .col(string_null(Applications::Remarks))
                    .col(integer_null(Applications::StudentId))
                    .col(timestamp_with_time_zone(Applications::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_applications_faculty")
                            .from(Applications::Table, Applications::FacultyId)
                            .to(Faculties::Table, Faculties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_applications_department")
                            .from(Applications::Table, Applications::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_applications_student")
                            .from(Applications::Table, Applications::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create academic_calendar_events table
        manager
            .create_table(
                Table::create()
                    .table(AcademicCalendarEvents::Table)
                    .if_not_exists()
                    .col(pk_auto(AcademicCalendarEvents::Id))
                    .col(string(AcademicCalendarEvents::Title))
                    .col(string_null(AcademicCalendarEvents::Description))
                    .col(string_len(AcademicCalendarEvents::EventType, 20))
                    .col(date(AcademicCalendarEvents::StartDate))
                    .col(date(AcademicCalendarEvents::EndDate))
                    .col(string_null(AcademicCalendarEvents::Semester))
                    .col(string_null(AcademicCalendarEvents::AcademicYear))
                    .col(boolean(AcademicCalendarEvents::IsActive).default(true))
                    .to_owned(),
            )
            .await?;

        // Create academic_calendar_event_departments table (join table)
        manager
            .create_table(
                Table::create()
                    .table(AcademicCalendarEventDepartments::Table)
                    .if_not_exists()
                    .col(integer(AcademicCalendarEventDepartments::EventId))
                    .col(integer(AcademicCalendarEventDepartments::DepartmentId))
                    .primary_key(
                        Index::create()
                            .name("pk_academic_calendar_event_departments")
                            .col(AcademicCalendarEventDepartments::EventId)
                            .col(AcademicCalendarEventDepartments::DepartmentId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_departments_event")
                            .from(
                                AcademicCalendarEventDepartments::Table,
                                AcademicCalendarEventDepartments::EventId,
                            )
                            .to(AcademicCalendarEvents::Table, AcademicCalendarEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_departments_department")
                            .from(
                                AcademicCalendarEventDepartments::Table,
                                AcademicCalendarEventDepartments::DepartmentId,
                            )
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create settings table
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(pk_auto(Settings::Id))
                    .col(string(Settings::Key).unique_key())
                    .col(string(Settings::Value))
                    .col(string_null(Settings::Description))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AcademicCalendarEventDepartments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AcademicCalendarEvents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(StudentAccounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Faculties::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Faculties {
    Table,
    Id,
    Name,
    Code,
    Dean,
    Description,
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    FacultyId,
    Name,
    Code,
    Price,
    Batch,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    DepartmentId,
    Code,
    Title,
    Credits,
    Semester,
    Description,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    StudentId,
    FirstName,
    LastName,
    Email,
    Phone,
    FacultyId,
    DepartmentId,
    Semester,
    AcademicYear,
    Session,
    IsActive,
    EnrolledAt,
}

#[derive(DeriveIden)]
enum StudentAccounts {
    Table,
    Id,
    StudentId,
    AcademicYear,
    Semester,
    TuitionFee,
    Discount,
    PaidAmount,
    TotalDue,
    Scholarship,
    Forwarded,
    Status,
    PaidType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    StudentId,
    StudentAccountId,
    Amount,
    PaymentDate,
    PaymentType,
    Method,
    Reference,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Applications {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    FacultyId,
    DepartmentId,
    AcademicYear,
    Session,
    Status,
    Remarks,
    StudentId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AcademicCalendarEvents {
    Table,
    Id,
    Title,
    Description,
    EventType,
    StartDate,
    EndDate,
    Semester,
    AcademicYear,
    IsActive,
}

#[derive(DeriveIden)]
enum AcademicCalendarEventDepartments {
    Table,
    EventId,
    DepartmentId,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    Key,
    Value,
    Description,
}

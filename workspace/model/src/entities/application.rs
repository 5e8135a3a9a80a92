use sea_orm::entity::prelude::*;

use super::{department, faculty, student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<ApplicationStatus> for common::ApplicationStatus {
    fn from(value: ApplicationStatus) -> Self {
        match value {
            ApplicationStatus::Pending => common::ApplicationStatus::Pending,
            ApplicationStatus::Approved => common::ApplicationStatus::Approved,
            ApplicationStatus::Rejected => common::ApplicationStatus::Rejected,
        }
    }
}

impl From<common::ApplicationStatus> for ApplicationStatus {
    fn from(value: common::ApplicationStatus) -> Self {
        match value {
            common::ApplicationStatus::Pending => ApplicationStatus::Pending,
            common::ApplicationStatus::Approved => ApplicationStatus::Approved,
            common::ApplicationStatus::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// An admission request. Approval turns it into a student record.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub faculty_id: i32,
    pub department_id: i32,
    pub academic_year: String,
    pub session: String,
    pub status: ApplicationStatus,
    pub remarks: Option<String>,
    /// Student created when the application was approved.
    pub student_id: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "faculty::Entity",
        from = "Column::FacultyId",
        to = "faculty::Column::Id",
        on_delete = "Cascade"
    )]
    Faculty,
    #[sea_orm(
        belongs_to = "department::Entity",
        from = "Column::DepartmentId",
        to = "department::Column::Id",
        on_delete = "Cascade"
    )]
    Department,
    #[sea_orm(
        belongs_to = "student::Entity",
        from = "Column::StudentId",
        to = "student::Column::Id",
        on_delete = "SetNull"
    )]
    Student,
}

impl Related<department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

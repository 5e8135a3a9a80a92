use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

use super::{department, faculty};

/// A student record with its current academic placement.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Public student number, e.g. "CSE-2024-0007".
    #[sea_orm(unique)]
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub faculty_id: i32,
    pub department_id: i32,
    /// Current semester number as text, or `common::GRADUATED_SEMESTER`.
    pub semester: String,
    pub academic_year: String,
    /// Admission session, e.g. "2024-2025".
    pub session: String,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub enrolled_at: NaiveDate,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Current semester as a number; `None` once graduated.
    pub fn semester_number(&self) -> Option<i32> {
        self.semester.trim().parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "faculty::Entity",
        from = "Column::FacultyId",
        to = "faculty::Column::Id",
        on_delete = "Restrict"
    )]
    Faculty,
    #[sea_orm(
        belongs_to = "department::Entity",
        from = "Column::DepartmentId",
        to = "department::Column::Id",
        on_delete = "Restrict"
    )]
    Department,
    #[sea_orm(has_many = "super::student_account::Entity")]
    StudentAccount,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<faculty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::student_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentAccount.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

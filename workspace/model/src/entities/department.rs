use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::faculty;

/// Academic unit students are admitted into. Owns the per-semester tuition price.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub faculty_id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    /// Tuition fee charged for one semester.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub price: Decimal,
    /// Intake label, e.g. "Fall 2024".
    pub batch: Option<String>,
    /// Length of the program. A student finishing this semester graduates.
    #[sea_orm(default_value = 8)]
    pub total_semesters: i32,
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
    #[sea_orm(has_many = "super::course::Entity")]
    Course,
    #[sea_orm(has_many = "super::student::Entity")]
    Student,
}

impl Related<faculty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

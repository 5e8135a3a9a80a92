use sea_orm::entity::prelude::*;

use super::department;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub department_id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub title: String,
    pub credits: i32,
    /// Semester of the program in which the course is taught.
    pub semester: i32,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "department::Entity",
        from = "Column::DepartmentId",
        to = "department::Column::Id",
        on_delete = "Cascade"
    )]
    Department,
}

impl Related<department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_table;
mod m20240301_000001_add_department_total_semesters;
mod m20240415_000001_add_student_account_semester_index;
mod m20240520_000001_add_user_reset_token;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_table::Migration),
            Box::new(m20240301_000001_add_department_total_semesters::Migration),
            Box::new(m20240415_000001_add_student_account_semester_index::Migration),
            Box::new(m20240520_000001_add_user_reset_token::Migration),
        ]
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEX_NAME: &str = "idx_student_accounts_student_year_semester";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One ledger row per student per semester
        manager
            .create_index(
                Index::create()
                    .name(INDEX_NAME)
                    .table(Alias::new("student_accounts"))
                    .col(Alias::new("student_id"))
                    .col(Alias::new("academic_year"))
                    .col(Alias::new("semester"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(INDEX_NAME)
                    .table(Alias::new("student_accounts"))
                    .to_owned(),
            )
            .await
    }
}

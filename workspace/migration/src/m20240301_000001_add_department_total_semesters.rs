use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Alias::new("departments"))
                    .add_column(
                        ColumnDef::new(Alias::new("total_semesters"))
                            .integer()
                            .not_null()
                            .default(8),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Alias::new("departments"))
                    .drop_column(Alias::new("total_semesters"))
                    .to_owned(),
            )
            .await
    }
}

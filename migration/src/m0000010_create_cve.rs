use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cve::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cve::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cve::Score).integer().not_null())
                    .col(ColumnDef::new(Cve::Severity).string().not_null())
                    .col(
                        ColumnDef::new(Cve::Published)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cve::Description).text().not_null())
                    .col(ColumnDef::new(Cve::Metrics).json_binary().not_null())
                    .to_owned(),
            )
            .await?;

        // the feed is always read newest-first
        manager
            .create_index(
                Index::create()
                    .table(Cve::Table)
                    .name("cve_published_idx")
                    .col(Cve::Published)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cve::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Cve {
    Table,
    Id,
    // --
    Score,
    Severity,
    Published,
    Description,
    Metrics,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExternalReferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExternalReferences::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExternalReferences::SourceName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExternalReferences::Description).text().null())
                    .col(ColumnDef::new(ExternalReferences::Url).string().null())
                    .col(ColumnDef::new(ExternalReferences::ExternalId).string().null())
                    .col(
                        ColumnDef::new(ExternalReferences::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalReferences::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_external_references_source")
                    .table(ExternalReferences::Table)
                    .col(ExternalReferences::SourceName)
                    .col(ExternalReferences::ExternalId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExternalReferences::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ExternalReferences {
    Table,
    Id,
    SourceName,
    Description,
    Url,
    ExternalId,
    CreatedAt,
    UpdatedAt,
}

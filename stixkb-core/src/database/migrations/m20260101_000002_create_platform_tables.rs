use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Connectors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Connectors::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Connectors::Name).string().not_null())
                    .col(ColumnDef::new(Connectors::ConnectorType).string().not_null())
                    .col(
                        ColumnDef::new(Connectors::Scope)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Connectors::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Connectors::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Works::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Works::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Works::Name).string().not_null())
                    .col(ColumnDef::new(Works::WorkType).string().not_null())
                    .col(ColumnDef::new(Works::ConnectorId).string().not_null())
                    .col(ColumnDef::new(Works::EntityId).string().null())
                    .col(ColumnDef::new(Works::Context).string().null())
                    .col(
                        ColumnDef::new(Works::Status)
                            .string()
                            .not_null()
                            .default("wait"),
                    )
                    .col(ColumnDef::new(Works::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Works::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_works_connector")
                            .from(Works::Table, Works::ConnectorId)
                            .to(Connectors::Table, Connectors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_works_entity")
                    .table(Works::Table)
                    .col(Works::EntityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Files::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Files::Name).string().not_null())
                    .col(ColumnDef::new(Files::Purpose).string().not_null())
                    .col(ColumnDef::new(Files::EntityType).string().not_null())
                    .col(ColumnDef::new(Files::EntityId).string().null())
                    .col(ColumnDef::new(Files::Context).string().null())
                    .col(ColumnDef::new(Files::MimeType).string().not_null())
                    .col(
                        ColumnDef::new(Files::Size)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Files::Content).binary().not_null())
                    .col(ColumnDef::new(Files::ListFilters).text().null())
                    .col(ColumnDef::new(Files::UploadStatus).string().not_null())
                    .col(ColumnDef::new(Files::WorkId).string().null())
                    .col(ColumnDef::new(Files::LastModified).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_files_listing")
                    .table(Files::Table)
                    .col(Files::Purpose)
                    .col(Files::EntityType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Files::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Works::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Connectors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Connectors {
    Table,
    Id,
    Name,
    ConnectorType,
    Scope,
    Active,
    UpdatedAt,
}

#[derive(Iden)]
enum Works {
    Table,
    Id,
    Name,
    WorkType,
    ConnectorId,
    EntityId,
    Context,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Files {
    Table,
    Id,
    Name,
    Purpose,
    EntityType,
    EntityId,
    Context,
    MimeType,
    Size,
    Content,
    ListFilters,
    UploadStatus,
    WorkId,
    LastModified,
}

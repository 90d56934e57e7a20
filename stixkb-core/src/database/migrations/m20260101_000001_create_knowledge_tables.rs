use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StixDomainObjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StixDomainObjects::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StixDomainObjects::EntityType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StixDomainObjects::Name).string().not_null())
                    .col(ColumnDef::new(StixDomainObjects::Description).text().null())
                    .col(
                        ColumnDef::new(StixDomainObjects::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixDomainObjects::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StixCyberObservables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StixCyberObservables::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StixCyberObservables::EntityType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixCyberObservables::ObservableValue)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixCyberObservables::Description)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StixCyberObservables::XOpenctiScore)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StixCyberObservables::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixCyberObservables::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StixCoreRelationships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StixCoreRelationships::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::RelationshipType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::FromId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::FromType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StixCoreRelationships::ToId).string().not_null())
                    .col(
                        ColumnDef::new(StixCoreRelationships::ToType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::StartTime)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::StopTime)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::Confidence)
                            .integer()
                            .not_null()
                            .default(15),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::Description)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::Inferred)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StixCoreRelationships::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relationships_from")
                    .table(StixCoreRelationships::Table)
                    .col(StixCoreRelationships::FromId)
                    .col(StixCoreRelationships::RelationshipType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relationships_to")
                    .table(StixCoreRelationships::Table)
                    .col(StixCoreRelationships::ToId)
                    .col(StixCoreRelationships::RelationshipType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_observables_type")
                    .table(StixCyberObservables::Table)
                    .col(StixCyberObservables::EntityType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StixCoreRelationships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StixCyberObservables::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StixDomainObjects::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum StixDomainObjects {
    Table,
    Id,
    EntityType,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum StixCyberObservables {
    Table,
    Id,
    EntityType,
    ObservableValue,
    Description,
    XOpenctiScore,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum StixCoreRelationships {
    Table,
    Id,
    RelationshipType,
    FromId,
    FromType,
    ToId,
    ToType,
    StartTime,
    StopTime,
    Confidence,
    Description,
    Inferred,
    CreatedAt,
    UpdatedAt,
}

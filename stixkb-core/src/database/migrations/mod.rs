pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_knowledge_tables;
mod m20260101_000002_create_platform_tables;
mod m20260101_000003_create_external_references;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_knowledge_tables::Migration),
            Box::new(m20260101_000002_create_platform_tables::Migration),
            Box::new(m20260101_000003_create_external_references::Migration),
        ]
    }
}

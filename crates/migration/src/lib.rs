//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20220101_000001_create_token;
mod m20220101_000002_create_storage;
mod m20220101_000003_create_backup_storage;
mod m20220101_000009_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220101_000001_create_token::Migration),
            Box::new(m20220101_000002_create_storage::Migration),
            Box::new(m20220101_000003_create_backup_storage::Migration),
            // Indexes should always be applied last
            Box::new(m20220101_000009_add_indexes::Migration),
        ]
    }
}

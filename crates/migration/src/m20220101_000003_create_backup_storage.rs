//! Create `backup_storage` table.
//!
//! Dated immutable snapshots; `date` is Unix milliseconds.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BackupStorage::Table)
                    .if_not_exists()
                    .col(uuid(BackupStorage::Id).primary_key())
                    .col(string_len(BackupStorage::Connect, 64).not_null())
                    .col(json_binary(BackupStorage::Data).not_null())
                    .col(big_integer(BackupStorage::Date).not_null())
                    .col(boolean(BackupStorage::Important).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(BackupStorage::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum BackupStorage { Table, Id, Connect, Data, Date, Important }

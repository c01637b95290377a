//! Create `storage` table.
//!
//! One JSON document per identity; `connect` is unique.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Storage::Table)
                    .if_not_exists()
                    .col(uuid(Storage::Id).primary_key())
                    .col(string_len(Storage::Connect, 64).unique_key().not_null())
                    .col(json_binary(Storage::Data).not_null())
                    .col(timestamp_with_time_zone(Storage::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Storage::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Storage { Table, Id, Connect, Data, UpdatedAt }

//! Lookup indexes for hot paths: token resolution, backup-enabled batch
//! enumeration, and snapshot lookup by `(connect, date)`.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_token_backup")
                    .table(Token::Table)
                    .col(Token::Backup)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_backup_storage_connect_date")
                    .table(BackupStorage::Table)
                    .col(BackupStorage::Connect)
                    .col(BackupStorage::Date)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_backup_storage_date")
                    .table(BackupStorage::Table)
                    .col(BackupStorage::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_backup_storage_date").table(BackupStorage::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_backup_storage_connect_date").table(BackupStorage::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_token_backup").table(Token::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Token { Table, Backup }

#[derive(DeriveIden)]
enum BackupStorage { Table, Connect, Date }

//! Create `token` table.
//!
//! Bearer credential plus access policy; `token` and `connect` are unique.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Token::Table)
                    .if_not_exists()
                    .col(uuid(Token::Id).primary_key())
                    .col(string_len(Token::Token, 64).unique_key().not_null())
                    .col(string_len(Token::Connect, 64).unique_key().not_null())
                    .col(string_len(Token::RefreshToken, 64).not_null())
                    .col(json_binary(Token::Domains).not_null())
                    .col(boolean(Token::Backup).not_null())
                    .col(
                        ColumnDef::new(Token::PasswordHash)
                            .string_len(255)
                            .null(),
                    )
                    .col(timestamp_with_time_zone(Token::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Token::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Token { Table, Id, Token, Connect, RefreshToken, Domains, Backup, PasswordHash, CreatedAt }

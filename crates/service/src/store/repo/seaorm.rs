use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::errors::ServiceError;
use crate::store::domain::{BackupRecord, Document, TokenRecord};
use crate::store::repository::StorageRepository;

/// Production repository over a SeaORM connection.
pub struct SeaOrmStorageRepository {
    pub db: DatabaseConnection,
}

fn doc_from_value(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn domains_from_value(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

fn token_from_model(m: models::token::Model) -> TokenRecord {
    TokenRecord {
        token: m.token,
        connect: m.connect,
        refresh_token: m.refresh_token,
        domains: domains_from_value(m.domains),
        backup: m.backup,
        password_hash: m.password_hash,
    }
}

fn backup_from_model(m: models::backup_storage::Model) -> BackupRecord {
    BackupRecord {
        connect: m.connect,
        data: doc_from_value(m.data),
        date: m.date,
        important: m.important,
    }
}

#[async_trait]
impl StorageRepository for SeaOrmStorageRepository {
    async fn insert_token(&self, record: TokenRecord) -> Result<(), ServiceError> {
        models::token::create(
            &self.db,
            &record.token,
            &record.connect,
            &record.refresh_token,
            record.domains,
            record.backup,
            record.password_hash,
        )
        .await?;
        Ok(())
    }

    async fn find_token(&self, token: &str) -> Result<Option<TokenRecord>, ServiceError> {
        let res = models::token::Entity::find()
            .filter(models::token::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;
        Ok(res.map(token_from_model))
    }

    async fn update_token_value(&self, connect: &str, new_token: &str) -> Result<(), ServiceError> {
        models::token::update_token(&self.db, connect, new_token).await?;
        Ok(())
    }

    async fn list_backup_enabled(&self) -> Result<Vec<TokenRecord>, ServiceError> {
        let res = models::token::Entity::find()
            .filter(models::token::Column::Backup.eq(true))
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;
        Ok(res.into_iter().map(token_from_model).collect())
    }

    async fn find_document(&self, connect: &str) -> Result<Option<Document>, ServiceError> {
        let res = models::storage::Entity::find()
            .filter(models::storage::Column::Connect.eq(connect))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;
        Ok(res.map(|m| doc_from_value(m.data)))
    }

    async fn insert_document(&self, connect: &str, data: Document) -> Result<(), ServiceError> {
        models::storage::create(&self.db, connect, serde_json::Value::Object(data)).await?;
        Ok(())
    }

    async fn update_document(&self, connect: &str, data: Document) -> Result<(), ServiceError> {
        models::storage::update_data(&self.db, connect, serde_json::Value::Object(data)).await?;
        Ok(())
    }

    async fn delete_document(&self, connect: &str) -> Result<(), ServiceError> {
        models::storage::delete_by_connect(&self.db, connect).await?;
        Ok(())
    }

    async fn insert_backup(&self, record: BackupRecord) -> Result<(), ServiceError> {
        models::backup_storage::create(
            &self.db,
            &record.connect,
            serde_json::Value::Object(record.data),
            record.date,
        )
        .await?;
        Ok(())
    }

    async fn find_backup(&self, connect: &str, date: i64) -> Result<Option<BackupRecord>, ServiceError> {
        let res = models::backup_storage::Entity::find()
            .filter(models::backup_storage::Column::Connect.eq(connect))
            .filter(models::backup_storage::Column::Date.eq(date))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;
        Ok(res.map(backup_from_model))
    }

    async fn list_backups(&self, connect: &str) -> Result<Vec<BackupRecord>, ServiceError> {
        let res = models::backup_storage::Entity::find()
            .filter(models::backup_storage::Column::Connect.eq(connect))
            .order_by_asc(models::backup_storage::Column::Date)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;
        Ok(res.into_iter().map(backup_from_model).collect())
    }

    async fn delete_backup(&self, connect: &str, date: i64) -> Result<(), ServiceError> {
        models::backup_storage::Entity::delete_many()
            .filter(models::backup_storage::Column::Connect.eq(connect))
            .filter(models::backup_storage::Column::Date.eq(date))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;
        Ok(())
    }

    async fn delete_expired_backups(&self, cutoff: i64) -> Result<u64, ServiceError> {
        let res = models::backup_storage::Entity::delete_many()
            .filter(models::backup_storage::Column::Date.lt(cutoff))
            .filter(models::backup_storage::Column::Important.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;
        Ok(res.rows_affected)
    }
}

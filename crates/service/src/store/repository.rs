use async_trait::async_trait;

use super::domain::{BackupRecord, Document, TokenRecord};
use crate::errors::ServiceError;

/// Repository abstraction over the document store. Per record kind the core
/// needs find-one/find-many, insert, update-with-set and delete-by-filter;
/// nothing here assumes multi-record transactions; single-record update
/// atomicity is the only guarantee the engine relies on.
#[async_trait]
pub trait StorageRepository: Send + Sync {
    // Token records
    async fn insert_token(&self, record: TokenRecord) -> Result<(), ServiceError>;
    async fn find_token(&self, token: &str) -> Result<Option<TokenRecord>, ServiceError>;
    /// Set a new bearer token for the identity named by `connect`.
    async fn update_token_value(&self, connect: &str, new_token: &str) -> Result<(), ServiceError>;
    async fn list_backup_enabled(&self) -> Result<Vec<TokenRecord>, ServiceError>;

    // Storage documents
    async fn find_document(&self, connect: &str) -> Result<Option<Document>, ServiceError>;
    async fn insert_document(&self, connect: &str, data: Document) -> Result<(), ServiceError>;
    async fn update_document(&self, connect: &str, data: Document) -> Result<(), ServiceError>;
    /// Remove the document; succeeds even when none exists.
    async fn delete_document(&self, connect: &str) -> Result<(), ServiceError>;

    // Snapshots
    async fn insert_backup(&self, record: BackupRecord) -> Result<(), ServiceError>;
    async fn find_backup(&self, connect: &str, date: i64) -> Result<Option<BackupRecord>, ServiceError>;
    /// Snapshots for one identity, ascending by date.
    async fn list_backups(&self, connect: &str) -> Result<Vec<BackupRecord>, ServiceError>;
    async fn delete_backup(&self, connect: &str, date: i64) -> Result<(), ServiceError>;
    /// Delete every non-pinned snapshot with `date < cutoff`; returns how many.
    async fn delete_expired_backups(&self, cutoff: i64) -> Result<u64, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockStorageRepository {
        tokens: Mutex<Vec<TokenRecord>>,
        documents: Mutex<HashMap<String, Document>>, // key: connect
        backups: Mutex<Vec<BackupRecord>>,
    }

    #[async_trait]
    impl StorageRepository for MockStorageRepository {
        async fn insert_token(&self, record: TokenRecord) -> Result<(), ServiceError> {
            let mut tokens = self.tokens.lock().unwrap();
            if tokens.iter().any(|t| t.token == record.token || t.connect == record.connect) {
                return Err(ServiceError::Repository("duplicate token or connect".into()));
            }
            tokens.push(record);
            Ok(())
        }

        async fn find_token(&self, token: &str) -> Result<Option<TokenRecord>, ServiceError> {
            let tokens = self.tokens.lock().unwrap();
            Ok(tokens.iter().find(|t| t.token == token).cloned())
        }

        async fn update_token_value(&self, connect: &str, new_token: &str) -> Result<(), ServiceError> {
            let mut tokens = self.tokens.lock().unwrap();
            match tokens.iter_mut().find(|t| t.connect == connect) {
                Some(t) => {
                    t.token = new_token.to_string();
                    Ok(())
                }
                None => Err(ServiceError::not_found("token")),
            }
        }

        async fn list_backup_enabled(&self) -> Result<Vec<TokenRecord>, ServiceError> {
            let tokens = self.tokens.lock().unwrap();
            Ok(tokens.iter().filter(|t| t.backup).cloned().collect())
        }

        async fn find_document(&self, connect: &str) -> Result<Option<Document>, ServiceError> {
            let docs = self.documents.lock().unwrap();
            Ok(docs.get(connect).cloned())
        }

        async fn insert_document(&self, connect: &str, data: Document) -> Result<(), ServiceError> {
            let mut docs = self.documents.lock().unwrap();
            docs.insert(connect.to_string(), data);
            Ok(())
        }

        async fn update_document(&self, connect: &str, data: Document) -> Result<(), ServiceError> {
            let mut docs = self.documents.lock().unwrap();
            match docs.get_mut(connect) {
                Some(existing) => {
                    *existing = data;
                    Ok(())
                }
                None => Err(ServiceError::not_found("storage")),
            }
        }

        async fn delete_document(&self, connect: &str) -> Result<(), ServiceError> {
            let mut docs = self.documents.lock().unwrap();
            docs.remove(connect);
            Ok(())
        }

        async fn insert_backup(&self, record: BackupRecord) -> Result<(), ServiceError> {
            let mut backups = self.backups.lock().unwrap();
            backups.push(record);
            Ok(())
        }

        async fn find_backup(&self, connect: &str, date: i64) -> Result<Option<BackupRecord>, ServiceError> {
            let backups = self.backups.lock().unwrap();
            Ok(backups.iter().find(|b| b.connect == connect && b.date == date).cloned())
        }

        async fn list_backups(&self, connect: &str) -> Result<Vec<BackupRecord>, ServiceError> {
            let backups = self.backups.lock().unwrap();
            let mut found: Vec<BackupRecord> =
                backups.iter().filter(|b| b.connect == connect).cloned().collect();
            found.sort_by_key(|b| b.date);
            Ok(found)
        }

        async fn delete_backup(&self, connect: &str, date: i64) -> Result<(), ServiceError> {
            let mut backups = self.backups.lock().unwrap();
            backups.retain(|b| !(b.connect == connect && b.date == date));
            Ok(())
        }

        async fn delete_expired_backups(&self, cutoff: i64) -> Result<u64, ServiceError> {
            let mut backups = self.backups.lock().unwrap();
            let before = backups.len();
            backups.retain(|b| b.important || b.date >= cutoff);
            Ok((before - backups.len()) as u64)
        }
    }

    impl MockStorageRepository {
        /// Pin or unpin a snapshot; test helper mirroring a manual DB edit.
        pub fn set_important(&self, connect: &str, date: i64, important: bool) {
            let mut backups = self.backups.lock().unwrap();
            if let Some(b) = backups.iter_mut().find(|b| b.connect == connect && b.date == date) {
                b.important = important;
            }
        }
    }
}

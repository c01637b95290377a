use std::sync::Arc;

use tracing::{info, instrument};

use crate::access;
use crate::errors::ServiceError;
use crate::store::domain::TokenRecord;
use crate::store::repository::StorageRepository;

/// Point-in-time restore: list snapshot handles and overwrite the live
/// document from one of them. Snapshots are read-only here; restoring never
/// consumes them.
pub struct RestoreEngine<R: StorageRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: StorageRepository + ?Sized> RestoreEngine<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Snapshot dates for this identity, ascending. The dates are the opaque
    /// handles callers later pass to `restore`.
    pub async fn list_backups(&self, record: &TokenRecord) -> Result<Vec<i64>, ServiceError> {
        access::verify_backup_enabled(record)?;
        let backups = self.repo.list_backups(&record.connect).await?;
        Ok(backups.into_iter().map(|b| b.date).collect())
    }

    /// Overwrite the live document with the snapshot content: full
    /// replacement, no merge. Creates the document when none exists.
    #[instrument(skip(self, record))]
    pub async fn restore(&self, record: &TokenRecord, date: i64) -> Result<(), ServiceError> {
        access::verify_backup_enabled(record)?;
        let snapshot = self
            .repo
            .find_backup(&record.connect, date)
            .await?
            .ok_or_else(|| ServiceError::not_found("backup"))?;

        if self.repo.find_document(&record.connect).await?.is_some() {
            self.repo.update_document(&record.connect, snapshot.data).await?;
        } else {
            self.repo.insert_document(&record.connect, snapshot.data).await?;
        }
        info!(connect = %record.connect, date, "storage_restored");
        Ok(())
    }
}

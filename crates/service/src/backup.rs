use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use configs::BackupConfig;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::errors::ServiceError;
use crate::store::domain::{BackupRecord, TokenRecord};
use crate::store::repository::StorageRepository;

/// Periodic snapshot producer and retention reaper. Both passes are
/// best-effort batches: a failure on one token or snapshot is logged and
/// skipped, and a persistence failure aborts only the current run; the next
/// tick retries independently.
pub struct BackupService<R: StorageRepository + ?Sized> {
    repo: Arc<R>,
    cfg: BackupConfig,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl<R: StorageRepository + ?Sized> BackupService<R> {
    pub fn new(repo: Arc<R>, cfg: BackupConfig) -> Self { Self { repo, cfg } }

    /// Snapshot every backup-enabled identity that has a live document.
    /// Returns how many snapshots were created.
    #[instrument(skip(self))]
    pub async fn run_snapshot_pass(&self) -> Result<u64, ServiceError> {
        let tokens = self.repo.list_backup_enabled().await?;
        let mut created = 0u64;
        for token in &tokens {
            match self.snapshot_one(token).await {
                Ok(true) => created += 1,
                // No document yet: nothing to snapshot.
                Ok(false) => {}
                Err(e) => {
                    warn!(connect = %token.connect, error = %e, code = e.code(), "snapshot_skipped");
                }
            }
        }
        info!(candidates = tokens.len(), created, "snapshot_pass_done");
        Ok(created)
    }

    async fn snapshot_one(&self, token: &TokenRecord) -> Result<bool, ServiceError> {
        let Some(data) = self.repo.find_document(&token.connect).await? else {
            return Ok(false);
        };
        self.repo
            .insert_backup(BackupRecord {
                connect: token.connect.clone(),
                data,
                date: now_ms(),
                important: false,
            })
            .await?;
        Ok(true)
    }

    /// Delete expired non-pinned snapshots, then enforce the per-identity
    /// cap on whatever survived. Pinned snapshots are never touched.
    #[instrument(skip(self))]
    pub async fn run_retention_pass(&self) -> Result<u64, ServiceError> {
        let cutoff = now_ms() - self.cfg.lifetime_ms;
        let mut removed = self.repo.delete_expired_backups(cutoff).await?;

        let tokens = self.repo.list_backup_enabled().await?;
        for token in &tokens {
            match self.cap_one(&token.connect).await {
                Ok(n) => removed += n,
                Err(e) => {
                    warn!(connect = %token.connect, error = %e, code = e.code(), "cap_skipped");
                }
            }
        }
        info!(cutoff, removed, "retention_pass_done");
        Ok(removed)
    }

    async fn cap_one(&self, connect: &str) -> Result<u64, ServiceError> {
        let backups = self.repo.list_backups(connect).await?;
        let unpinned: Vec<_> = backups.iter().filter(|b| !b.important).collect();
        if unpinned.len() <= self.cfg.max_backups {
            return Ok(0);
        }
        let overflow = unpinned.len() - self.cfg.max_backups;
        let mut removed = 0u64;
        // `list_backups` is ascending by date, so the overflow prefix is oldest.
        for backup in unpinned.into_iter().take(overflow) {
            self.repo.delete_backup(connect, backup.date).await?;
            removed += 1;
        }
        debug!(connect = %connect, removed, "backup_cap_enforced");
        Ok(removed)
    }
}

impl<R: StorageRepository + ?Sized + 'static> BackupService<R> {
    /// Spawn the two periodic passes on independent timers. They run apart
    /// from request handling; errors end the current run only.
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let snapshotter = Arc::clone(&self);
        let snapshot_task = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(snapshotter.cfg.snapshot_interval_secs));
            // The first tick fires immediately; consume it so the first pass
            // happens one full interval after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = snapshotter.run_snapshot_pass().await {
                    warn!(error = %e, code = e.code(), "snapshot_pass_failed");
                }
            }
        });

        let reaper = self;
        let retention_task = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(reaper.cfg.retention_interval_secs));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = reaper.run_retention_pass().await {
                    warn!(error = %e, code = e.code(), "retention_pass_failed");
                }
            }
        });

        (snapshot_task, retention_task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageEngine;
    use crate::store::domain::{CreateTokenInput, Document};
    use crate::store::repository::mock::MockStorageRepository;
    use crate::tokens::TokenRegistry;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    async fn identity(repo: &Arc<MockStorageRepository>, backup: bool) -> String {
        let registry = TokenRegistry::new(Arc::clone(repo));
        let issued = registry
            .issue(CreateTokenInput { backup: Some(backup), ..Default::default() }, None)
            .await
            .unwrap();
        registry.resolve(&issued.token).await.unwrap().connect
    }

    #[tokio::test]
    async fn snapshot_pass_copies_current_document() {
        let repo = Arc::new(MockStorageRepository::default());
        let connect = identity(&repo, true).await;
        let engine = StorageEngine::new(Arc::clone(&repo));
        engine.write(&connect, doc(json!({"a": 1}))).await.unwrap();

        let service = BackupService::new(Arc::clone(&repo), BackupConfig::default());
        assert_eq!(service.run_snapshot_pass().await.unwrap(), 1);

        let backups = repo.list_backups(&connect).await.unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(serde_json::Value::Object(backups[0].data.clone()), json!({"a": 1}));
        assert!(!backups[0].important);
    }

    #[tokio::test]
    async fn snapshot_pass_skips_identities_without_document_or_backup() {
        let repo = Arc::new(MockStorageRepository::default());
        // backup enabled but never written to
        let empty_connect = identity(&repo, true).await;
        // document present but backup disabled
        let disabled_connect = identity(&repo, false).await;
        let engine = StorageEngine::new(Arc::clone(&repo));
        engine.write(&disabled_connect, doc(json!({"x": 1}))).await.unwrap();

        let service = BackupService::new(Arc::clone(&repo), BackupConfig::default());
        assert_eq!(service.run_snapshot_pass().await.unwrap(), 0);
        assert!(repo.list_backups(&empty_connect).await.unwrap().is_empty());
        assert!(repo.list_backups(&disabled_connect).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retention_deletes_expired_but_keeps_pinned() {
        let repo = Arc::new(MockStorageRepository::default());
        let connect = identity(&repo, true).await;

        let old = now_ms() - 10 * 86_400_000;
        for (date, important) in [(old, false), (old + 1, true), (now_ms(), false)] {
            repo.insert_backup(BackupRecord {
                connect: connect.clone(),
                data: doc(json!({"v": date})),
                date,
                important,
            })
            .await
            .unwrap();
        }

        let service = BackupService::new(Arc::clone(&repo), BackupConfig::default());
        assert_eq!(service.run_retention_pass().await.unwrap(), 1);

        let remaining = repo.list_backups(&connect).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().any(|b| b.important));
        assert!(remaining.iter().all(|b| b.date != old));
    }

    #[tokio::test]
    async fn retention_caps_unpinned_snapshots_per_identity() {
        let repo = Arc::new(MockStorageRepository::default());
        let connect = identity(&repo, true).await;

        let base = now_ms();
        for i in 0..5 {
            repo.insert_backup(BackupRecord {
                connect: connect.clone(),
                data: Document::new(),
                date: base + i,
                important: false,
            })
            .await
            .unwrap();
        }
        repo.set_important(&connect, base, true);

        let cfg = BackupConfig { max_backups: 2, ..BackupConfig::default() };
        let service = BackupService::new(Arc::clone(&repo), cfg);
        assert_eq!(service.run_retention_pass().await.unwrap(), 2);

        let remaining = repo.list_backups(&connect).await.unwrap();
        // The pinned snapshot survives alongside the two newest unpinned ones.
        assert_eq!(remaining.len(), 3);
        assert!(remaining.iter().any(|b| b.date == base && b.important));
        assert!(remaining.iter().any(|b| b.date == base + 3));
        assert!(remaining.iter().any(|b| b.date == base + 4));
    }
}

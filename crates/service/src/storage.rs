use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::store::domain::Document;
use crate::store::repository::StorageRepository;

/// Scoped document operations for one `connect`. Merge-write is a
/// read-modify-write sequence with no locking: concurrent writers to the same
/// identity race and the later persisted write wins. Accepted trade-off for a
/// low-contention store; tests assert last-writer-wins, not serializability.
pub struct StorageEngine<R: StorageRepository + ?Sized> {
    repo: Arc<R>,
}

/// Membership test used by key read/delete: a key is treated as absent when
/// it is missing *or* holds a JS-falsy value (null, false, 0, ""). Kept for
/// behavioral compatibility even though it conflates "not set" with "set to a
/// falsy value".
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl<R: StorageRepository + ?Sized> StorageEngine<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Merge-write: shallow union with the existing document, incoming values
    /// winning on key collision (whole-value replacement, no deep merge).
    /// Creates the document on first write.
    #[instrument(skip(self, incoming))]
    pub async fn write(&self, connect: &str, incoming: Document) -> Result<(), ServiceError> {
        if incoming.is_empty() {
            return Err(ServiceError::InvalidInput("empty write payload".into()));
        }
        match self.repo.find_document(connect).await? {
            Some(mut existing) => {
                for (key, value) in incoming {
                    existing.insert(key, value);
                }
                self.repo.update_document(connect, existing).await?;
            }
            None => {
                self.repo.insert_document(connect, incoming).await?;
            }
        }
        debug!(connect = %connect, "storage_written");
        Ok(())
    }

    /// Full document; absence of the record is `NotFound`.
    pub async fn read_all(&self, connect: &str) -> Result<Document, ServiceError> {
        self.repo
            .find_document(connect)
            .await?
            .ok_or_else(|| ServiceError::not_found("storage"))
    }

    /// Single value lookup, subject to the falsy-absence test.
    pub async fn read_key(&self, connect: &str, key: &str) -> Result<Value, ServiceError> {
        let data = self.read_all(connect).await?;
        match data.get(key) {
            Some(value) if !is_absent(value) => Ok(value.clone()),
            _ => Err(ServiceError::not_found("key")),
        }
    }

    /// Remove one key and persist; same absence test as `read_key`.
    #[instrument(skip(self))]
    pub async fn delete_key(&self, connect: &str, key: &str) -> Result<(), ServiceError> {
        let mut data = self.read_all(connect).await?;
        match data.get(key) {
            Some(value) if !is_absent(value) => {}
            _ => return Err(ServiceError::not_found("key")),
        }
        data.remove(key);
        self.repo.update_document(connect, data).await?;
        debug!(connect = %connect, key = %key, "storage_key_deleted");
        Ok(())
    }

    /// Drop the whole document. Unlike the key paths this is no-op-safe: a
    /// missing record is not an error.
    #[instrument(skip(self))]
    pub async fn delete_all(&self, connect: &str) -> Result<(), ServiceError> {
        self.repo.delete_document(connect).await?;
        debug!(connect = %connect, "storage_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::repository::mock::MockStorageRepository;
    use serde_json::json;

    fn engine() -> StorageEngine<MockStorageRepository> {
        StorageEngine::new(Arc::new(MockStorageRepository::default()))
    }

    fn doc(value: serde_json::Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trip_merges_last_writer_wins() {
        let engine = engine();
        engine.write("c1", doc(json!({"a": 1}))).await.unwrap();
        engine.write("c1", doc(json!({"b": 2}))).await.unwrap();
        assert_eq!(Value::Object(engine.read_all("c1").await.unwrap()), json!({"a": 1, "b": 2}));

        engine.write("c1", doc(json!({"a": 3}))).await.unwrap();
        assert_eq!(Value::Object(engine.read_all("c1").await.unwrap()), json!({"a": 3, "b": 2}));
    }

    #[tokio::test]
    async fn merge_replaces_nested_values_wholesale() {
        let engine = engine();
        engine.write("c1", doc(json!({"nested": {"x": 1, "y": 2}}))).await.unwrap();
        engine.write("c1", doc(json!({"nested": {"z": 3}}))).await.unwrap();
        // No deep merge: the whole value is replaced.
        assert_eq!(
            Value::Object(engine.read_all("c1").await.unwrap()),
            json!({"nested": {"z": 3}})
        );
    }

    #[tokio::test]
    async fn empty_write_is_invalid_input() {
        let engine = engine();
        let err = engine.write("c1", Document::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn read_all_without_record_is_not_found() {
        let engine = engine();
        assert!(matches!(engine.read_all("nope").await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn read_key_returns_value_and_misses_absent_keys() {
        let engine = engine();
        engine.write("c1", doc(json!({"name": "alice"}))).await.unwrap();
        assert_eq!(engine.read_key("c1", "name").await.unwrap(), json!("alice"));
        assert!(matches!(
            engine.read_key("c1", "missing").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn falsy_values_count_as_absent() {
        let engine = engine();
        engine
            .write("c1", doc(json!({"empty": "", "zero": 0, "no": false, "nil": null, "ok": 1})))
            .await
            .unwrap();
        for key in ["empty", "zero", "no", "nil"] {
            assert!(
                matches!(engine.read_key("c1", key).await, Err(ServiceError::NotFound(_))),
                "{key} should read as absent"
            );
            assert!(
                matches!(engine.delete_key("c1", key).await, Err(ServiceError::NotFound(_))),
                "{key} should delete as absent"
            );
        }
        assert_eq!(engine.read_key("c1", "ok").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn delete_key_removes_exactly_that_key() {
        let engine = engine();
        engine.write("c1", doc(json!({"a": 1, "b": 2}))).await.unwrap();
        engine.delete_key("c1", "a").await.unwrap();
        assert_eq!(Value::Object(engine.read_all("c1").await.unwrap()), json!({"b": 2}));
    }

    #[tokio::test]
    async fn delete_all_removes_record_and_is_noop_safe() {
        let engine = engine();
        engine.write("c1", doc(json!({"a": 1}))).await.unwrap();
        engine.delete_all("c1").await.unwrap();
        assert!(matches!(engine.read_all("c1").await, Err(ServiceError::NotFound(_))));
        // Second delete of an already-absent record succeeds.
        engine.delete_all("c1").await.unwrap();
    }

    #[test]
    fn absence_test_matches_js_falsiness() {
        assert!(is_absent(&json!(null)));
        assert!(is_absent(&json!(false)));
        assert!(is_absent(&json!(0)));
        assert!(is_absent(&json!(0.0)));
        assert!(is_absent(&json!("")));
        assert!(!is_absent(&json!(true)));
        assert!(!is_absent(&json!(1)));
        assert!(!is_absent(&json!("x")));
        assert!(!is_absent(&json!([])));
        assert!(!is_absent(&json!({})));
    }
}

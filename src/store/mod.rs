//! Per-entity translation records with per-field upserts.
//!
//! Reads fail open: a backend error is logged and reported as "not found",
//! so page rendering falls back to source-language content. Writes report
//! their errors to the caller and are not retried here.

pub mod memory;
pub mod record;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use record::{FieldMap, FieldTranslation, RecordKey, TranslationRecord};
pub use sqlite::SqliteBackend;

use crate::entity::SourceType;
use crate::error::Result;
use crate::language::Language;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw record storage.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn load(&self, key: RecordKey) -> Result<Option<TranslationRecord>>;

    /// Insert or replace one field, creating the record if needed.
    async fn upsert_field(&self, key: RecordKey, name: &str, field: FieldTranslation) -> Result<()>;

    /// Returns whether a record was removed.
    async fn remove(&self, key: RecordKey) -> Result<bool>;

    fn name(&self) -> &'static str;
}

#[derive(Clone)]
pub struct TranslationStore {
    backend: Arc<dyn StoreBackend>,
}

impl TranslationStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// SQLite store at `path`, or an in-memory one when `path` is `None`.
    pub async fn open(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::new(Arc::new(SqliteBackend::open(path).await?))),
            None => Ok(Self::in_memory()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Upsert one field of the record for (`source_type`, `source_id`).
    ///
    /// Any entry for the source language in `translations` is dropped.
    pub async fn put_field(
        &self,
        source_type: SourceType,
        source_id: i64,
        field_name: &str,
        original: Value,
        translations: BTreeMap<Language, Value>,
    ) -> Result<()> {
        let key = RecordKey::new(source_type, source_id);
        let field = FieldTranslation::new(original, translations, Utc::now());
        debug!(
            "Storing {} translations for {}.{}",
            field.translations.len(),
            key,
            field_name
        );
        self.backend.upsert_field(key, field_name, field).await
    }

    /// The cached value of a field in `lang`, falling back to the stored
    /// original. `None` when nothing is stored or the backend is unreachable.
    pub async fn get_field(
        &self,
        source_type: SourceType,
        source_id: i64,
        field_name: &str,
        lang: Language,
    ) -> Option<Value> {
        let record = self.load(RecordKey::new(source_type, source_id)).await?;
        record
            .fields
            .get(field_name)
            .map(|field| field.value_for(lang).clone())
    }

    /// Every stored field of a record, or `None` when nothing is stored or
    /// the backend is unreachable.
    pub async fn get_all_fields(&self, source_type: SourceType, source_id: i64) -> Option<FieldMap> {
        self.load(RecordKey::new(source_type, source_id))
            .await
            .map(|record| record.fields)
    }

    /// Remove the whole record. Removing a missing record is not an error.
    pub async fn delete(&self, source_type: SourceType, source_id: i64) -> Result<()> {
        let key = RecordKey::new(source_type, source_id);
        if self.backend.remove(key).await? {
            debug!("Deleted translations for {}", key);
        }
        Ok(())
    }

    /// The full record, failing open.
    pub async fn record(&self, source_type: SourceType, source_id: i64) -> Option<TranslationRecord> {
        self.load(RecordKey::new(source_type, source_id)).await
    }

    async fn load(&self, key: RecordKey) -> Option<TranslationRecord> {
        match self.backend.load(key).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Translation store read for {} failed, using originals: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscacheError;
    use serde_json::json;

    struct UnreachableBackend;

    #[async_trait]
    impl StoreBackend for UnreachableBackend {
        async fn load(&self, _: RecordKey) -> Result<Option<TranslationRecord>> {
            Err(TranscacheError::Store("connection refused".to_string()))
        }

        async fn upsert_field(&self, _: RecordKey, _: &str, _: FieldTranslation) -> Result<()> {
            Err(TranscacheError::Store("connection refused".to_string()))
        }

        async fn remove(&self, _: RecordKey) -> Result<bool> {
            Err(TranscacheError::Store("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn english(text: &str) -> BTreeMap<Language, Value> {
        BTreeMap::from([(Language::En, json!(text))])
    }

    #[tokio::test]
    async fn test_get_field_fallbacks() {
        let store = TranslationStore::in_memory();
        store
            .put_field(SourceType::Service, 1, "name", json!("헤어 스타일링"), english("Hair styling"))
            .await
            .unwrap();

        for (lang, expected) in [
            (Language::En, "Hair styling"),
            (Language::Ko, "헤어 스타일링"),
            (Language::Ja, "헤어 스타일링"),
        ] {
            assert_eq!(
                store.get_field(SourceType::Service, 1, "name", lang).await,
                Some(json!(expected))
            );
        }

        assert_eq!(
            store.get_field(SourceType::Service, 1, "description", Language::En).await,
            None
        );
        assert_eq!(
            store.get_field(SourceType::Service, 2, "name", Language::En).await,
            None
        );
    }

    #[tokio::test]
    async fn test_put_field_is_per_field_upsert() {
        let store = TranslationStore::in_memory();
        store
            .put_field(SourceType::ServiceOption, 5, "name", json!("메이크업"), english("Makeup"))
            .await
            .unwrap();
        store
            .put_field(SourceType::ServiceOption, 5, "description", json!("설명"), english("Desc v1"))
            .await
            .unwrap();
        store
            .put_field(SourceType::ServiceOption, 5, "description", json!("설명"), english("Desc v2"))
            .await
            .unwrap();

        let fields = store.get_all_fields(SourceType::ServiceOption, 5).await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["description"].translations[&Language::En], json!("Desc v2"));
        assert_eq!(fields["name"].translations[&Language::En], json!("Makeup"));
    }

    #[tokio::test]
    async fn test_put_field_drops_source_language() {
        let store = TranslationStore::in_memory();
        let translations = BTreeMap::from([
            (Language::Ko, json!("stale")),
            (Language::Ja, json!("カット")),
        ]);
        store
            .put_field(SourceType::Service, 3, "name", json!("커트"), translations)
            .await
            .unwrap();

        let fields = store.get_all_fields(SourceType::Service, 3).await.unwrap();
        assert!(!fields["name"].translations.contains_key(&Language::Ko));
        assert_eq!(
            store.get_field(SourceType::Service, 3, "name", Language::Ko).await,
            Some(json!("커트"))
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = TranslationStore::in_memory();
        store
            .put_field(SourceType::GalleryGroup, 8, "title", json!("바디프로필"), english("Body profile"))
            .await
            .unwrap();

        store.delete(SourceType::GalleryGroup, 8).await.unwrap();
        store.delete(SourceType::GalleryGroup, 8).await.unwrap();
        assert!(store.get_all_fields(SourceType::GalleryGroup, 8).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_open_on_read() {
        let store = TranslationStore::new(Arc::new(UnreachableBackend));

        assert!(store.get_all_fields(SourceType::Service, 1).await.is_none());
        assert!(store
            .get_field(SourceType::Service, 1, "name", Language::En)
            .await
            .is_none());

        let write = store
            .put_field(SourceType::Service, 1, "name", json!("x"), BTreeMap::new())
            .await;
        assert!(matches!(write, Err(TranscacheError::Store(_))));
        assert!(store.delete(SourceType::Service, 1).await.is_err());
    }
}

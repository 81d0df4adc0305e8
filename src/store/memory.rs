use super::record::{FieldTranslation, RecordKey, TranslationRecord};
use super::StoreBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Records held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<RecordKey, TranslationRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self, key: RecordKey) -> Result<Option<TranslationRecord>> {
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn upsert_field(&self, key: RecordKey, name: &str, field: FieldTranslation) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .entry(key)
            .or_insert_with(|| TranslationRecord::new(key, field.updated_at))
            .upsert_field(name, field);
        Ok(())
    }

    async fn remove(&self, key: RecordKey) -> Result<bool> {
        Ok(self.records.write().await.remove(&key).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

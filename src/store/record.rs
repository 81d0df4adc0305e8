use crate::entity::SourceType;
use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifies the record of one source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub source_type: SourceType,
    pub source_id: i64,
}

impl RecordKey {
    pub fn new(source_type: SourceType, source_id: i64) -> Self {
        Self {
            source_type,
            source_id,
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source_type, self.source_id)
    }
}

/// Cached translations of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTranslation {
    /// Source-language value the translations were made from.
    pub original: Value,
    /// Same-shaped values keyed by target language. Never holds the source language.
    pub translations: BTreeMap<Language, Value>,
    pub updated_at: DateTime<Utc>,
}

impl FieldTranslation {
    pub fn new(
        original: Value,
        mut translations: BTreeMap<Language, Value>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        translations.remove(&Language::SOURCE);
        Self {
            original,
            translations,
            updated_at,
        }
    }

    /// Value for `lang`, falling back to the original.
    pub fn value_for(&self, lang: Language) -> &Value {
        if lang.is_source() {
            return &self.original;
        }
        self.translations.get(&lang).unwrap_or(&self.original)
    }
}

pub type FieldMap = BTreeMap<String, FieldTranslation>;

/// All cached translations of one source entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    #[serde(flatten)]
    pub key: RecordKey,
    pub fields: FieldMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranslationRecord {
    pub fn new(key: RecordKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            fields: FieldMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace one field, leaving the others alone.
    pub fn upsert_field(&mut self, name: &str, field: FieldTranslation) {
        self.updated_at = self.updated_at.max(field.updated_at);
        self.fields.insert(name.to_string(), field);
    }
}

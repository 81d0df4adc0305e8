use crate::config::Config;
use crate::entity::{FieldSpec, SourceType, Translatable};
use crate::error::Result;
use crate::language::Language;
use crate::shape::is_blank;
use crate::store::TranslationStore;
use crate::translate::{create_translator, BatchTranslator};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A field that could not be translated, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub error: String,
    /// Whether translating again later could succeed.
    pub retryable: bool,
}

/// Outcome of translating one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationReport {
    pub source_type: SourceType,
    pub source_id: i64,
    /// Fields stored with a translation for every target language.
    pub written: Vec<String>,
    /// Fields left alone because their source value is empty.
    pub skipped: Vec<String>,
    /// Fields not stored, or stored with some strings still in the source
    /// language because the provider failed on them.
    pub failed: Vec<FieldFailure>,
    pub elapsed_ms: u64,
}

impl TranslationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum FieldOutcome {
    Written,
    Skipped,
    /// Stored, but `untranslated` of `total` strings kept the source text.
    Partial { untranslated: usize, total: usize },
}

/// Translates whole entities into every target language and caches the result.
#[derive(Clone)]
pub struct EntityTranslator {
    translator: BatchTranslator,
    store: TranslationStore,
}

impl EntityTranslator {
    pub fn new(translator: BatchTranslator, store: TranslationStore) -> Self {
        Self { translator, store }
    }

    /// Build from configuration. Fails with `CredentialsMissing` when no API
    /// key is configured, before anything is written.
    pub fn from_config(config: &Config, store: TranslationStore) -> Result<Self> {
        let translator = BatchTranslator::new(Arc::from(create_translator(config)?))
            .with_max_batch_size(config.max_batch_size);
        Ok(Self::new(translator, store))
    }

    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    /// Translate every schema field of `entity`.
    ///
    /// Each field is handled on its own: an empty field is skipped, and a
    /// field that fails is reported without stopping its siblings.
    pub async fn translate_entity(&self, entity: &dyn Translatable) -> TranslationReport {
        let start = Instant::now();
        let source_type = entity.source_type();
        let source_id = entity.id();

        let mut report = TranslationReport {
            source_type,
            source_id,
            written: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            elapsed_ms: 0,
        };

        for spec in entity.schema() {
            let value = entity.field_value(spec.name);
            match self.translate_field(source_type, source_id, spec, value).await {
                Ok(FieldOutcome::Written) => report.written.push(spec.name.to_string()),
                Ok(FieldOutcome::Skipped) => report.skipped.push(spec.name.to_string()),
                Ok(FieldOutcome::Partial { untranslated, total }) => {
                    warn!(
                        "{}:{}.{} stored with {} of {} strings untranslated",
                        source_type, source_id, spec.name, untranslated, total
                    );
                    report.failed.push(FieldFailure {
                        field: spec.name.to_string(),
                        error: format!(
                            "{} of {} strings kept in the source language",
                            untranslated, total
                        ),
                        retryable: true,
                    });
                }
                Err(e) => {
                    warn!("Translation of {}:{}.{} failed: {}", source_type, source_id, spec.name, e);
                    report.failed.push(FieldFailure {
                        field: spec.name.to_string(),
                        error: e.to_string(),
                        retryable: e.is_transient(),
                    });
                }
            }
        }

        report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            "Translated {}:{} with {}: {} written, {} empty, {} failed in {}ms",
            source_type,
            source_id,
            self.translator.name(),
            report.written.len(),
            report.skipped.len(),
            report.failed.len(),
            report.elapsed_ms
        );

        report
    }

    async fn translate_field(
        &self,
        source_type: SourceType,
        source_id: i64,
        spec: &FieldSpec,
        value: Value,
    ) -> Result<FieldOutcome> {
        if is_blank(&value) {
            debug!("{}:{}.{} is empty, not translating", source_type, source_id, spec.name);
            return Ok(FieldOutcome::Skipped);
        }

        let decomposed = spec.shape.decompose(&value)?;
        let atoms = decomposed.atoms();

        let per_language = join_all(Language::targets().map(|lang| {
            let decomposed = &decomposed;
            async move {
                let outcome = self
                    .translator
                    .translate_batch(atoms, lang, Language::SOURCE)
                    .await;
                decomposed
                    .reassemble(&outcome.texts)
                    .map(|v| (lang, v, outcome.failed))
            }
        }))
        .await;

        let mut translations = BTreeMap::new();
        let mut untranslated = 0;
        for result in per_language {
            let (lang, translated, failed) = result?;
            untranslated += failed;
            translations.insert(lang, translated);
        }

        self.store
            .put_field(source_type, source_id, spec.name, value, translations)
            .await?;

        if untranslated > 0 {
            return Ok(FieldOutcome::Partial {
                untranslated,
                total: atoms.len() * Language::targets().count(),
            });
        }
        Ok(FieldOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CollageText, Service};
    use crate::error::TranscacheError;
    use crate::translate::Translator;
    use async_trait::async_trait;
    use serde_json::json;

    /// Prefixes each string with its target language code.
    struct TaggingTranslator;

    #[async_trait]
    impl Translator for TaggingTranslator {
        async fn translate(&self, text: &str, target: Language, _: Language) -> Result<String> {
            Ok(format!("{}:{}", target, text))
        }

        async fn translate_batch(
            &self,
            texts: &[&str],
            target: Language,
            _: Language,
        ) -> Result<Vec<String>> {
            Ok(texts.iter().map(|t| format!("{}:{}", target, t)).collect())
        }

        fn name(&self) -> &'static str {
            "tagging"
        }
    }

    /// A provider that is down.
    struct DeadTranslator;

    #[async_trait]
    impl Translator for DeadTranslator {
        async fn translate(&self, _: &str, _: Language, _: Language) -> Result<String> {
            Err(TranscacheError::Provider("connection refused".to_string()))
        }

        async fn translate_batch(&self, _: &[&str], _: Language, _: Language) -> Result<Vec<String>> {
            Err(TranscacheError::Provider("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "dead"
        }
    }

    /// An entity whose `packages` field holds the wrong JSON kind.
    struct BrokenService;

    impl Translatable for BrokenService {
        fn source_type(&self) -> SourceType {
            SourceType::Service
        }

        fn id(&self) -> i64 {
            99
        }

        fn field_value(&self, name: &str) -> Value {
            match name {
                "name" => json!("헤어"),
                "packages" => json!("not a table"),
                _ => Value::Null,
            }
        }
    }

    fn translator() -> EntityTranslator {
        EntityTranslator::new(
            BatchTranslator::new(Arc::new(TaggingTranslator)),
            TranslationStore::in_memory(),
        )
    }

    #[tokio::test]
    async fn test_translates_every_target_language() {
        let pipeline = translator();
        let caption = CollageText {
            id: 1,
            caption: "봄 웨딩".to_string(),
        };

        let report = pipeline.translate_entity(&caption).await;
        assert_eq!(report.written, vec!["caption"]);
        assert!(report.is_complete());

        let fields = pipeline
            .store()
            .get_all_fields(SourceType::CollageText, 1)
            .await
            .unwrap();
        let field = &fields["caption"];
        assert_eq!(field.original, json!("봄 웨딩"));
        assert_eq!(field.translations.len(), 3);
        assert_eq!(field.translations[&Language::Ja], json!("ja:봄 웨딩"));
    }

    #[tokio::test]
    async fn test_empty_fields_are_not_written() {
        let pipeline = translator();
        let service = Service {
            id: 2,
            name: "메이크업".to_string(),
            description: Some("   ".to_string()),
            ..Default::default()
        };

        let report = pipeline.translate_entity(&service).await;
        assert_eq!(report.written, vec!["name"]);
        assert_eq!(report.skipped.len(), 6);

        let fields = pipeline
            .store()
            .get_all_fields(SourceType::Service, 2)
            .await
            .unwrap();
        assert!(fields.contains_key("name"));
        assert!(!fields.contains_key("description"));
    }

    #[tokio::test]
    async fn test_shape_error_does_not_stop_siblings() {
        let pipeline = translator();
        let report = pipeline.translate_entity(&BrokenService).await;

        assert_eq!(report.written, vec!["name"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].field, "packages");
        assert!(!report.failed[0].retryable);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_provider_outage_is_not_reported_as_done() {
        let store = TranslationStore::in_memory();
        let pipeline = EntityTranslator::new(BatchTranslator::new(Arc::new(DeadTranslator)), store.clone());
        let caption = CollageText {
            id: 7,
            caption: "웨딩".to_string(),
        };

        let report = pipeline.translate_entity(&caption).await;
        assert!(report.written.is_empty());
        assert!(!report.is_complete());
        assert_eq!(report.failed[0].field, "caption");
        assert_eq!(report.failed[0].error, "3 of 3 strings kept in the source language");
        assert!(report.failed[0].retryable);

        // The shape-preserving fallback is still stored.
        assert_eq!(
            store.get_field(SourceType::CollageText, 7, "caption", Language::En).await,
            Some(json!("웨딩"))
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_fast() {
        let result = EntityTranslator::from_config(&Config::default(), TranslationStore::in_memory());
        assert!(matches!(result, Err(TranscacheError::CredentialsMissing(_))));
    }
}

pub mod adapter;
pub mod openai;

pub use adapter::{BatchOutcome, BatchTranslator};
pub use openai::OpenAiTranslator;

use crate::config::Config;
use crate::error::{Result, TranscacheError};
use crate::language::Language;
use async_trait::async_trait;

/// A text-completion backend that can translate strings.
///
/// Implementations report every failure as an error; the degrade-to-original
/// policy lives in [`BatchTranslator`].
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: Language, source: Language) -> Result<String>;

    /// Translate `texts` in a single call. The result may have the wrong
    /// length if the backend misbehaves; callers must check.
    async fn translate_batch(
        &self,
        texts: &[&str],
        target: Language,
        source: Language,
    ) -> Result<Vec<String>>;

    fn name(&self) -> &'static str;
}

/// Build the configured translator, or `CredentialsMissing` when no API key is set.
pub fn create_translator(config: &Config) -> Result<Box<dyn Translator>> {
    if !config.translation_available() {
        return Err(TranscacheError::CredentialsMissing(
            "OPENAI_API_KEY not set; serving source-language content only".to_string(),
        ));
    }
    Ok(Box::new(OpenAiTranslator::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_translator_missing_key() {
        let config = Config::default();
        let result = create_translator(&config);
        assert!(matches!(result, Err(TranscacheError::CredentialsMissing(_))));
    }

    #[test]
    fn test_create_translator_with_key() {
        let mut config = Config::default();
        config.openai_api_key = Some("sk-test".to_string());
        let translator = create_translator(&config).unwrap();
        assert_eq!(translator.name(), "openai");
    }
}

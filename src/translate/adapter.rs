//! Degrading front-end over a [`Translator`].
//!
//! Callers never see provider errors here: a failed single translation is
//! `None`, and a batch always comes back with one entry per input, keeping
//! the original text wherever translation failed and counting those entries.

use crate::error::TranscacheError;
use crate::language::Language;
use crate::translate::Translator;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 40;

/// Result of a batch: one text per input, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub texts: Vec<String>,
    /// Non-blank inputs left in the source language because translation failed.
    pub failed: usize,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Clone)]
pub struct BatchTranslator {
    inner: Arc<dyn Translator>,
    max_batch_size: usize,
}

impl BatchTranslator {
    pub fn new(inner: Arc<dyn Translator>) -> Self {
        Self {
            inner,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Split larger batches into several provider calls.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Translate one string.
    ///
    /// Blank input and same-language requests return the input unchanged.
    /// `None` means the translation is unavailable (provider failure or no
    /// credentials).
    pub async fn translate_one(
        &self,
        text: &str,
        target: Language,
        source: Language,
    ) -> Option<String> {
        if text.trim().is_empty() || target == source {
            return Some(text.to_string());
        }

        match self.inner.translate(text, target, source).await {
            Ok(translated) => {
                let translated = translated.trim();
                if translated.is_empty() {
                    warn!("{} returned an empty translation for {}", self.name(), target);
                    None
                } else {
                    Some(translated.to_string())
                }
            }
            Err(e) => {
                warn!("Translation to {} failed: {}", target, e);
                None
            }
        }
    }

    /// Translate many strings, preserving order and length.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target: Language,
        source: Language,
    ) -> BatchOutcome {
        let mut output = texts.to_vec();
        let mut failed = 0;
        if target == source {
            return BatchOutcome {
                texts: output,
                failed,
            };
        }

        let pending: Vec<usize> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, _)| i)
            .collect();

        for chunk in pending.chunks(self.max_batch_size) {
            let batch: Vec<&str> = chunk.iter().map(|&i| texts[i].as_str()).collect();

            let translated = if batch.len() == 1 {
                None
            } else {
                match self.inner.translate_batch(&batch, target, source).await {
                    Ok(items) if items.len() == batch.len() => Some(items),
                    Ok(items) => {
                        warn!(
                            "Batch to {} returned {} items for {} inputs, retrying per item",
                            target,
                            items.len(),
                            batch.len()
                        );
                        None
                    }
                    Err(e @ TranscacheError::CredentialsMissing(_))
                    | Err(e @ TranscacheError::Unsupported(_)) => {
                        warn!("Batch translation to {} unavailable: {}", target, e);
                        // Per-item calls would fail the same way.
                        failed += chunk.len();
                        continue;
                    }
                    Err(e) => {
                        warn!("Batch translation to {} failed, retrying per item: {}", target, e);
                        None
                    }
                }
            };

            match translated {
                Some(items) => {
                    for (&i, item) in chunk.iter().zip(items) {
                        let item = item.trim();
                        if item.is_empty() {
                            failed += 1;
                        } else {
                            output[i] = item.to_string();
                        }
                    }
                }
                None => {
                    let singles = join_all(
                        batch
                            .iter()
                            .map(|text| self.translate_one(text, target, source)),
                    )
                    .await;
                    for (&i, single) in chunk.iter().zip(singles) {
                        match single {
                            Some(single) => output[i] = single,
                            None => failed += 1,
                        }
                    }
                }
            }
        }

        debug!(
            "Translated {} of {} strings to {} ({} kept in source language)",
            pending.len() - failed,
            texts.len(),
            target,
            failed
        );
        BatchOutcome {
            texts: output,
            failed,
        }
    }
}

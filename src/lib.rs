pub mod config;
pub mod entity;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod queue;
pub mod resolve;
pub mod shape;
pub mod store;
pub mod translate;

pub use config::Config;
pub use entity::{AnyEntity, SourceType, Translatable};
pub use error::{Result, TranscacheError};
pub use language::Language;
pub use pipeline::{EntityTranslator, TranslationReport};
pub use queue::{JobId, JobStatus, TranslationQueue};
pub use resolve::resolve;
pub use store::TranslationStore;

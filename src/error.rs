use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscacheError {
    #[error("Translation credentials missing: {0}")]
    CredentialsMissing(String),

    #[error("Translation provider error: {0}")]
    Provider(String),

    #[error("Unsupported language: {0}")]
    Unsupported(String),

    #[error("Translation store error: {0}")]
    Store(String),

    #[error("Field shape mismatch: {0}")]
    Shape(String),

    #[error("Unknown source type: {0}")]
    UnknownSourceType(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl TranscacheError {
    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TranscacheError::Provider(_)
                | TranscacheError::Store(_)
                | TranscacheError::Database(_)
                | TranscacheError::Http(_)
                | TranscacheError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TranscacheError>;

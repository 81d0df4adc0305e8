//! Durable store backed by SQLite.
//!
//! One row per (source type, source id, field), so every write touches a
//! single field and several handles on the same database never clobber each
//! other's records. `original` and `translations` are stored as JSON text.

use super::record::{FieldTranslation, RecordKey, TranslationRecord};
use super::StoreBackend;
use crate::error::{Result, TranscacheError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits on another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS field_translations (
        source_type TEXT NOT NULL,
        source_id INTEGER NOT NULL,
        field TEXT NOT NULL,
        original TEXT NOT NULL,
        translations TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (source_type, source_id, field)
    );
";

#[derive(Debug, Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (creating if needed) the database at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db_path = path.clone();

        let conn = tokio::task::spawn_blocking(move || open_connection(&db_path))
            .await
            .map_err(|e| TranscacheError::Store(format!("Store open task failed: {}", e)))??;

        info!("Opened translation store {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| TranscacheError::Store("store connection lock poisoned".to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| TranscacheError::Store(format!("Store task failed: {}", e)))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // Readers don't block the writer and vice versa.
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TranscacheError::Store(format!("bad timestamp {:?}: {}", raw, e)))
}

fn load_record(conn: &Connection, key: RecordKey) -> Result<Option<TranslationRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT field, original, translations, created_at, updated_at
         FROM field_translations
         WHERE source_type = ?1 AND source_id = ?2",
    )?;
    let rows = stmt.query_map(params![key.source_type.as_str(), key.source_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut record: Option<TranslationRecord> = None;
    for row in rows {
        let (name, original, translations, created_at, updated_at) = row?;
        let created_at = parse_timestamp(&created_at)?;
        let field = FieldTranslation::new(
            serde_json::from_str(&original)?,
            serde_json::from_str(&translations)?,
            parse_timestamp(&updated_at)?,
        );

        let record = record.get_or_insert_with(|| TranslationRecord::new(key, created_at));
        record.created_at = record.created_at.min(created_at);
        record.upsert_field(&name, field);
    }

    Ok(record)
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    async fn load(&self, key: RecordKey) -> Result<Option<TranslationRecord>> {
        self.with_conn(move |conn| load_record(conn, key)).await
    }

    async fn upsert_field(&self, key: RecordKey, name: &str, field: FieldTranslation) -> Result<()> {
        let name = name.to_string();
        let original = serde_json::to_string(&field.original)?;
        let translations = serde_json::to_string(&field.translations)?;
        let updated_at = field.updated_at.to_rfc3339();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO field_translations
                    (source_type, source_id, field, original, translations, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(source_type, source_id, field) DO UPDATE SET
                    original = excluded.original,
                    translations = excluded.translations,
                    updated_at = excluded.updated_at",
                params![
                    key.source_type.as_str(),
                    key.source_id,
                    name,
                    original,
                    translations,
                    updated_at
                ],
            )?;
            debug!("Upserted {}.{}", key, name);
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: RecordKey) -> Result<bool> {
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM field_translations WHERE source_type = ?1 AND source_id = ?2",
                params![key.source_type.as_str(), key.source_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SourceType;
    use crate::language::Language;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn field(original: &str, english: &str) -> FieldTranslation {
        FieldTranslation::new(
            json!(original),
            BTreeMap::from([(Language::En, json!(english))]),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_empty_database_has_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::open(dir.path().join("store.db")).await.unwrap();
        let key = RecordKey::new(SourceType::Service, 1);
        assert!(backend.load(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        let key = RecordKey::new(SourceType::CollageText, 9);

        {
            let backend = SqliteBackend::open(&path).await.unwrap();
            backend.upsert_field(key, "caption", field("봄", "Spring")).await.unwrap();
        }

        let reopened = SqliteBackend::open(&path).await.unwrap();
        let record = reopened.load(key).await.unwrap().unwrap();
        assert_eq!(
            record.fields["caption"].translations[&Language::En],
            json!("Spring")
        );
    }

    #[tokio::test]
    async fn test_two_handles_do_not_clobber_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let service = RecordKey::new(SourceType::Service, 1);
        let group = RecordKey::new(SourceType::GalleryGroup, 2);

        let first = SqliteBackend::open(&path).await.unwrap();
        let second = SqliteBackend::open(&path).await.unwrap();

        first.upsert_field(service, "name", field("커트", "Cut")).await.unwrap();
        second.upsert_field(group, "title", field("웨딩", "Wedding")).await.unwrap();
        // Different fields of one record from different handles.
        second
            .upsert_field(service, "description", field("설명", "Description"))
            .await
            .unwrap();

        let reopened = SqliteBackend::open(&path).await.unwrap();
        let record = reopened.load(service).await.unwrap().unwrap();
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields["name"].translations[&Language::En], json!("Cut"));
        assert!(reopened.load(group).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_only_that_field() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::open(dir.path().join("store.db")).await.unwrap();
        let key = RecordKey::new(SourceType::ServiceOption, 4);

        backend.upsert_field(key, "name", field("펌", "Perm")).await.unwrap();
        backend.upsert_field(key, "description", field("설명", "v1")).await.unwrap();
        backend.upsert_field(key, "description", field("설명", "v2")).await.unwrap();

        let record = backend.load(key).await.unwrap().unwrap();
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields["description"].translations[&Language::En], json!("v2"));
        assert_eq!(record.fields["name"].translations[&Language::En], json!("Perm"));
        assert!(record.created_at <= record.updated_at);
    }

    #[tokio::test]
    async fn test_remove_deletes_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let key = RecordKey::new(SourceType::GalleryGroup, 2);
        let other = RecordKey::new(SourceType::GalleryGroup, 3);

        let backend = SqliteBackend::open(&path).await.unwrap();
        backend.upsert_field(key, "title", field("웨딩", "Wedding")).await.unwrap();
        backend.upsert_field(other, "title", field("가족", "Family")).await.unwrap();
        assert!(backend.remove(key).await.unwrap());
        assert!(!backend.remove(key).await.unwrap());

        let reopened = SqliteBackend::open(&path).await.unwrap();
        assert!(reopened.load(key).await.unwrap().is_none());
        assert!(reopened.load(other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_non_database_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        std::fs::write(&path, "not a database ".repeat(512)).unwrap();

        assert!(SqliteBackend::open(&path).await.is_err());
    }
}

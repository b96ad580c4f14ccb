//! SQLite-backed queue store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::store::{QueueError, QueueStore};
use super::types::{MediaPayload, PostOptions, QueueItem};

/// Queue store on a single SQLite connection.
///
/// Items are read back in rowid order, which is insertion order.
pub struct SqliteQueueStore {
    conn: Mutex<Connection>,
}

impl SqliteQueueStore {
    /// Opens (and creates if needed) the database file.
    pub fn new(path: &Path) -> Result<Self, QueueError> {
        let conn = Connection::open(path).map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, QueueError> {
        let conn =
            Connection::open_in_memory().map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queue_items (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                media TEXT NOT NULL,
                options TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                last_attempt_at TEXT
            );

            CREATE TABLE IF NOT EXISTS queue_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(())
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<QueueItem> {
        let id: String = row.get(0)?;
        let created_at_str: String = row.get(1)?;
        let media_json: String = row.get(2)?;
        let options_json: String = row.get(3)?;
        let retry_count: u32 = row.get(4)?;
        let last_attempt_str: Option<String> = row.get(5)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let last_attempt_at = last_attempt_str
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let media: MediaPayload = serde_json::from_str(&media_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let options: PostOptions = serde_json::from_str(&options_json).unwrap_or_default();

        Ok(QueueItem {
            id,
            created_at,
            media,
            options,
            retry_count,
            last_attempt_at,
        })
    }
}

impl QueueStore for SqliteQueueStore {
    fn insert(&self, item: &QueueItem) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();
        let media_json =
            serde_json::to_string(&item.media).map_err(|e| QueueError::Database(e.to_string()))?;
        let options_json = serde_json::to_string(&item.options)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO queue_items (id, created_at, media, options, retry_count, last_attempt_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.id,
                item.created_at.to_rfc3339(),
                media_json,
                options_json,
                item.retry_count,
                item.last_attempt_at.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<QueueItem>, QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, created_at, media, options, retry_count, last_attempt_at
             FROM queue_items WHERE id = ?1",
            params![id],
            Self::row_to_item,
        )
        .optional()
        .map_err(|e| QueueError::Database(e.to_string()))
    }

    fn list_pending(&self) -> Result<Vec<QueueItem>, QueueError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, created_at, media, options, retry_count, last_attempt_at
                 FROM queue_items ORDER BY rowid",
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;
        let items = stmt
            .query_map([], Self::row_to_item)
            .map_err(|e| QueueError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(items)
    }

    fn count(&self) -> Result<usize, QueueError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM queue_items", [], |row| row.get(0))
            .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    fn update_media_path(&self, id: &str, path: &Path) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();
        let item = conn
            .query_row(
                "SELECT media FROM queue_items WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| QueueError::Database(e.to_string()))?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;

        let mut media: MediaPayload =
            serde_json::from_str(&item).map_err(|e| QueueError::Database(e.to_string()))?;
        media.file_path = path.to_path_buf();
        let media_json =
            serde_json::to_string(&media).map_err(|e| QueueError::Database(e.to_string()))?;

        conn.execute(
            "UPDATE queue_items SET media = ?1 WHERE id = ?2",
            params![media_json, id],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(())
    }

    fn record_attempt(&self, id: &str, at: DateTime<Utc>) -> Result<u32, QueueError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn
            .execute(
                "UPDATE queue_items
                 SET retry_count = retry_count + 1, last_attempt_at = ?1
                 WHERE id = ?2",
                params![at.to_rfc3339(), id],
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;
        if updated == 0 {
            return Err(QueueError::NotFound(id.to_string()));
        }
        conn.query_row(
            "SELECT retry_count FROM queue_items WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .map_err(|e| QueueError::Database(e.to_string()))
    }

    fn remove(&self, id: &str) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM queue_items WHERE id = ?1", params![id])
            .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(())
    }

    fn meta_get(&self, key: &str) -> Result<Option<String>, QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM queue_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| QueueError::Database(e.to_string()))
    }

    fn meta_set(&self, key: &str, value: &str) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO queue_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcoder::MediaKind;
    use std::path::PathBuf;

    fn item(id: &str) -> QueueItem {
        QueueItem {
            id: id.to_string(),
            created_at: Utc::now(),
            media: MediaPayload {
                file_path: PathBuf::from(format!("/tmp/queue/{id}.jpg")),
                kind: MediaKind::Image,
                content_type: "image/jpeg".to_string(),
            },
            options: PostOptions::default(),
            retry_count: 0,
            last_attempt_at: None,
        }
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let store = SqliteQueueStore::in_memory().unwrap();
        store.insert(&item("a")).unwrap();

        let loaded = store.get("a").unwrap().unwrap();
        assert_eq!(loaded.id, "a");
        assert_eq!(loaded.media.kind, MediaKind::Image);
        assert_eq!(loaded.retry_count, 0);
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_pending_preserves_insertion_order() {
        let store = SqliteQueueStore::in_memory().unwrap();
        for id in ["first", "second", "third"] {
            store.insert(&item(id)).unwrap();
        }

        let ids: Vec<String> = store
            .list_pending()
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_record_attempt_increments_counter() {
        let store = SqliteQueueStore::in_memory().unwrap();
        store.insert(&item("a")).unwrap();

        let now = Utc::now();
        assert_eq!(store.record_attempt("a", now).unwrap(), 1);
        assert_eq!(store.record_attempt("a", now).unwrap(), 2);

        let loaded = store.get("a").unwrap().unwrap();
        assert_eq!(loaded.retry_count, 2);
        assert!(loaded.last_attempt_at.is_some());

        assert!(matches!(
            store.record_attempt("missing", now),
            Err(QueueError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_media_path() {
        let store = SqliteQueueStore::in_memory().unwrap();
        store.insert(&item("a")).unwrap();

        store
            .update_media_path("a", Path::new("/tmp/queue/a.prepared.jpg"))
            .unwrap();
        let loaded = store.get("a").unwrap().unwrap();
        assert_eq!(
            loaded.media.file_path,
            PathBuf::from("/tmp/queue/a.prepared.jpg")
        );
    }

    #[test]
    fn test_remove_and_count() {
        let store = SqliteQueueStore::in_memory().unwrap();
        store.insert(&item("a")).unwrap();
        store.insert(&item("b")).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store.remove("a").unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_meta_upsert() {
        let store = SqliteQueueStore::in_memory().unwrap();
        assert!(store.meta_get("streak_day").unwrap().is_none());

        store.meta_set("streak_day", "20260822").unwrap();
        assert_eq!(
            store.meta_get("streak_day").unwrap().as_deref(),
            Some("20260822")
        );

        store.meta_set("streak_day", "20260823").unwrap();
        assert_eq!(
            store.meta_get("streak_day").unwrap().as_deref(),
            Some("20260823")
        );
    }
}

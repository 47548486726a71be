use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Filter, ID_FIELD, Record, RecordStore, StoreError, Update};

/// Embedded document store: one SQLite file, records kept as JSON bodies.
///
/// A collection exists only once registered; unregistered collections belong to
/// extensions the project does not use.
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
    trace: bool,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P, trace: bool) -> Result<Self, StoreError> {
        let db = Connection::open(path.as_ref())?;
        Self::with_connection(db, trace)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, false)
    }

    fn with_connection(db: Connection, trace: bool) -> Result<Self, StoreError> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            trace,
        })
    }

    pub async fn register_collection(&self, name: &str) -> Result<(), StoreError> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT OR IGNORE INTO collections (name) VALUES (?1)",
            params![name],
        )?;
        Ok(())
    }

    fn ensure_collection(db: &Connection, collection: &str) -> Result<(), StoreError> {
        let known: Option<String> = db
            .query_row(
                "SELECT name FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()?;
        match known {
            Some(_) => Ok(()),
            None => Err(StoreError::UnknownCollection(collection.to_string())),
        }
    }

    fn load(
        db: &Connection,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Record>, StoreError> {
        Self::ensure_collection(db, collection)?;

        let mut stmt =
            db.prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let Value::Object(mut record) = serde_json::from_str::<Value>(&body)? else {
                return Err(StoreError::NotAnObject {
                    collection: collection.to_string(),
                });
            };
            record.insert(ID_FIELD.to_string(), Value::String(id));
            if filter.matches(&record) {
                results.push(record);
            }
        }
        Ok(results)
    }

    fn record_id(record: &Record) -> Option<String> {
        record
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn collections(&self) -> Result<Vec<String>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare("SELECT name FROM collections ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let db = self.db.lock().await;
        let records = Self::load(&db, collection, filter)?;
        if self.trace {
            debug!(collection, found = records.len(), "find");
        }
        Ok(records)
    }

    async fn insert(&self, collection: &str, mut record: Record) -> Result<String, StoreError> {
        let db = self.db.lock().await;
        Self::ensure_collection(&db, collection)?;

        let id = Self::record_id(&record).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        record.shift_remove(ID_FIELD);
        db.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id, serde_json::to_string(&record)?],
        )?;
        if self.trace {
            debug!(collection, id = %id, "insert");
        }
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<usize, StoreError> {
        let db = self.db.lock().await;
        let matched = Self::load(&db, collection, filter)?;

        for mut record in matched.iter().cloned() {
            let Some(id) = Self::record_id(&record) else {
                continue;
            };
            update.apply(&mut record);
            record.shift_remove(ID_FIELD);
            db.execute(
                "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3",
                params![serde_json::to_string(&record)?, collection, id],
            )?;
        }
        if self.trace {
            debug!(collection, updated = matched.len(), "update");
        }
        Ok(matched.len())
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> Result<usize, StoreError> {
        let db = self.db.lock().await;
        let matched = Self::load(&db, collection, filter)?;

        let mut removed = 0;
        for id in matched.iter().filter_map(Self::record_id) {
            removed += db.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )?;
        }
        if self.trace {
            debug!(collection, removed, "remove");
        }
        Ok(removed)
    }
}

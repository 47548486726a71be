mod sqlite;
pub mod types;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use sqlite::SqliteStore;

/// Identifier field of every record.
pub const ID_FIELD: &str = "_id";

pub type Record = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection \"{0}\" is not available in the document store")]
    UnknownCollection(String),
    #[error("document store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored document in \"{collection}\" is not an object")]
    NotAnObject { collection: String },
}

/// Partial field equality. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Record);

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::default().and(field, value)
    }

    pub fn by_id(id: &str) -> Self {
        Self::eq(ID_FIELD, id)
    }

    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

/// A `$set` patch: listed fields are overwritten, the rest is untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Record,
}

impl Update {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        let mut set = Record::new();
        set.insert(field.to_string(), value.into());
        Self { set }
    }

    pub fn apply(&self, record: &mut Record) {
        for (field, value) in &self.set {
            if field != ID_FIELD {
                record.insert(field.clone(), value.clone());
            }
        }
    }
}

/// Named collections of JSON records.
///
/// Implementations must be safe for concurrent calls; steps fan out
/// per-record writes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Names of the collections this store serves.
    async fn collections(&self) -> Result<Vec<String>, StoreError>;
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, StoreError>;
    /// Inserts `record`, assigning an `_id` when missing. Returns the id.
    async fn insert(&self, collection: &str, record: Record) -> Result<String, StoreError>;
    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<usize, StoreError>;
    async fn remove(&self, collection: &str, filter: &Filter) -> Result<usize, StoreError>;
}

/// Borrowed handle on one collection.
#[derive(Clone, Copy)]
pub struct Collection<'a> {
    store: &'a dyn RecordStore,
    name: &'a str,
}

impl<'a> Collection<'a> {
    pub fn new(store: &'a dyn RecordStore, name: &'a str) -> Self {
        Self { store, name }
    }

    pub async fn find(&self, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        self.store.find(self.name, filter).await
    }

    /// Finds records and decodes them into a typed view.
    pub async fn find_as<T: DeserializeOwned>(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.find(filter)
            .await?
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)).map_err(StoreError::from))
            .collect()
    }

    pub async fn insert(&self, record: Record) -> Result<String, StoreError> {
        self.store.insert(self.name, record).await
    }

    pub async fn update(&self, filter: &Filter, update: &Update) -> Result<usize, StoreError> {
        self.store.update(self.name, filter, update).await
    }

    pub async fn remove(&self, filter: &Filter) -> Result<usize, StoreError> {
        self.store.remove(self.name, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&record(json!({ "a": 1 }))));
        assert!(Filter::all().matches(&Record::new()));
    }

    #[test]
    fn filter_requires_every_field_to_be_equal() {
        let rec = record(json!({ "recipe": "phantom-pdf", "name": "invoice" }));
        assert!(Filter::eq("recipe", "phantom-pdf").matches(&rec));
        assert!(!Filter::eq("recipe", "chrome-pdf").matches(&rec));
        assert!(!Filter::eq("recipe", "phantom-pdf").and("name", "other").matches(&rec));
        assert!(!Filter::eq("missing", Value::Null).matches(&rec));
    }

    #[test]
    fn update_never_touches_id() {
        let mut rec = record(json!({ "_id": "1", "cron": "0 0 1 0 *" }));
        let mut patch = Update::set("cron", "0 0 1 1 *");
        patch.set.insert(ID_FIELD.to_string(), json!("2"));
        patch.apply(&mut rec);
        assert_eq!(rec["_id"], json!("1"));
        assert_eq!(rec["cron"], json!("0 0 1 1 *"));
    }
}

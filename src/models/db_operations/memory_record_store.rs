use crate::models::db_operations::record_store::{
    AuthContext, DbError, RecordQuery, RecordStore, Row, SortOrder,
};
use crate::models::Collection;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Process-local `RecordStore`. Assigns ids and timestamps the way the hosted
/// store does. Used by tests and by `BACKEND_MODE=memory`.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<Collection, Vec<Row>>>,
    failure: Mutex<Option<String>>,
}

/// Timestamps are compared as instants; RFC 3339 strings with different
/// fractional precision do not sort lexically.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (a.parse::<DateTime<Utc>>(), b.parse::<DateTime<Utc>>()) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None, Some(_)) | (Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None) | (Some(_), Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `message`, as a backend that
    /// rejects requests would. `None` restores normal behaviour.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            message.map(str::to_string);
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.tables().get(&collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// The stored row as the backend holds it, for inspecting column names.
    pub fn raw_row(&self, collection: Collection, id: &str) -> Option<Row> {
        self.tables()
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| row_id(row) == Some(id)).cloned())
    }

    fn tables(&self) -> MutexGuard<'_, HashMap<Collection, Vec<Row>>> {
        self.tables.lock().unwrap_or_else(|poisoned| {
            log::error!("Mutex for the memory record store was poisoned! Recovering lock.");
            poisoned.into_inner()
        })
    }

    fn check_failure(&self) -> Result<(), DbError> {
        let failure = self.failure.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match failure.as_ref() {
            Some(message) => Err(DbError::Backend { status: 500, message: message.clone() }),
            None => Ok(()),
        }
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(
        &self,
        collection: Collection,
        mut row: Row,
        _auth: &AuthContext,
    ) -> Result<Row, DbError> {
        self.check_failure()?;
        let now = Value::String(Utc::now().to_rfc3339());
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at").or_insert_with(|| now.clone());
        row.insert("updated_at".to_string(), now);

        self.tables().entry(collection).or_default().push(row.clone());
        Ok(row)
    }

    async fn select(
        &self,
        collection: Collection,
        query: &RecordQuery,
        _auth: &AuthContext,
    ) -> Result<Vec<Row>, DbError> {
        self.check_failure()?;
        let mut rows: Vec<Row> = self
            .tables()
            .get(&collection)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, order)) = &query.order_by {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        Ok(rows)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Row,
        _auth: &AuthContext,
    ) -> Result<(), DbError> {
        self.check_failure()?;
        let mut tables = self.tables();
        let row = tables
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or_else(|| DbError::NotFound(format!("{}/{}", collection, id)))?;

        for (column, value) in patch {
            if column != "id" {
                row.insert(column, value);
            }
        }
        row.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        Ok(())
    }

    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        _auth: &AuthContext,
    ) -> Result<(), DbError> {
        self.check_failure()?;
        if let Some(rows) = self.tables().get_mut(&collection) {
            rows.retain(|row| row_id(row) != Some(id));
        }
        Ok(())
    }
}

use crate::models::Collection;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A record in its storage shape: snake_case column names to JSON values.
pub type Row = Map<String, Value>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Record store rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Item not found in database: {0}")]
    NotFound(String),
    #[error("Malformed row in '{collection}': {reason}")]
    MalformedRow { collection: Collection, reason: String },
}

/// Credentials forwarded to the backend with every call.
/// Anonymous calls fall back to the public API key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    access_token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { access_token: None }
    }

    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self { access_token: Some(access_token.into()) }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Equality filters plus one optional sort key; all the backend query
/// language this service needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortOrder)>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn newest_first(mut self, column: &str) -> Self {
        self.order_by = Some((column.to_string(), SortOrder::Descending));
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }
}

/// Create/read/update/delete over the three collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a row and returns it as stored, including the assigned `id`.
    async fn insert(
        &self,
        collection: Collection,
        row: Row,
        auth: &AuthContext,
    ) -> Result<Row, DbError>;

    async fn select(
        &self,
        collection: Collection,
        query: &RecordQuery,
        auth: &AuthContext,
    ) -> Result<Vec<Row>, DbError>;

    /// Applies a partial update. `NotFound` when no row has this id.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Row,
        auth: &AuthContext,
    ) -> Result<(), DbError>;

    /// Hard delete. Deleting a missing id is not an error.
    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        auth: &AuthContext,
    ) -> Result<(), DbError>;
}

use crate::models::db_operations::record_store::{AuthContext, DbError, RecordQuery, RecordStore};
use crate::models::rows;
use crate::models::{Collection, Resource, ResourceDraft, ResourcePatch};
use chrono::Utc;

pub async fn create_resource(
    store: &dyn RecordStore,
    draft: &ResourceDraft,
    auth: &AuthContext,
) -> Result<String, DbError> {
    let row = rows::resource_to_row(draft, Utc::now())?;
    let stored = store.insert(Collection::Resources, row, auth).await?;
    rows::row_id(Collection::Resources, &stored)
}

/// Newest first, optionally restricted to one category label.
pub async fn read_resources(
    store: &dyn RecordStore,
    category: Option<&str>,
    auth: &AuthContext,
) -> Result<Vec<Resource>, DbError> {
    let mut query = RecordQuery::new();
    if let Some(category) = category {
        query = query.eq("category", category);
    }
    let query = query.newest_first(Collection::Resources.sort_column());

    store
        .select(Collection::Resources, &query, auth)
        .await?
        .into_iter()
        .map(rows::resource_from_row)
        .collect()
}

pub async fn read_resource(
    store: &dyn RecordStore,
    id: &str,
    auth: &AuthContext,
) -> Result<Option<Resource>, DbError> {
    let query = RecordQuery::new().eq("id", id);
    match store.select(Collection::Resources, &query, auth).await?.into_iter().next() {
        Some(row) => Ok(Some(rows::resource_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn update_resource(
    store: &dyn RecordStore,
    id: &str,
    patch: &ResourcePatch,
    auth: &AuthContext,
) -> Result<(), DbError> {
    let row = rows::resource_patch_to_row(patch);
    if row.is_empty() {
        return Ok(());
    }
    store.update(Collection::Resources, id, row, auth).await
}

pub async fn delete_resource(
    store: &dyn RecordStore,
    id: &str,
    auth: &AuthContext,
) -> Result<(), DbError> {
    store.delete(Collection::Resources, id, auth).await
}

use crate::models::db_operations::record_store::{AuthContext, DbError, RecordQuery, RecordStore};
use crate::models::rows;
use crate::models::{Collaborator, CollaboratorDraft, CollaboratorPatch, Collection};

pub async fn create_collaborator(
    store: &dyn RecordStore,
    draft: &CollaboratorDraft,
    auth: &AuthContext,
) -> Result<String, DbError> {
    let row = rows::collaborator_to_row(draft)?;
    let stored = store.insert(Collection::Collaborators, row, auth).await?;
    rows::row_id(Collection::Collaborators, &stored)
}

/// Newest first by creation time.
pub async fn read_collaborators(
    store: &dyn RecordStore,
    auth: &AuthContext,
) -> Result<Vec<Collaborator>, DbError> {
    let query = RecordQuery::new().newest_first(Collection::Collaborators.sort_column());
    store
        .select(Collection::Collaborators, &query, auth)
        .await?
        .into_iter()
        .map(rows::collaborator_from_row)
        .collect()
}

pub async fn read_collaborator(
    store: &dyn RecordStore,
    id: &str,
    auth: &AuthContext,
) -> Result<Option<Collaborator>, DbError> {
    let query = RecordQuery::new().eq("id", id);
    match store.select(Collection::Collaborators, &query, auth).await?.into_iter().next() {
        Some(row) => Ok(Some(rows::collaborator_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn update_collaborator(
    store: &dyn RecordStore,
    id: &str,
    patch: &CollaboratorPatch,
    auth: &AuthContext,
) -> Result<(), DbError> {
    let row = rows::collaborator_patch_to_row(patch);
    if row.is_empty() {
        return Ok(());
    }
    store.update(Collection::Collaborators, id, row, auth).await
}

pub async fn delete_collaborator(
    store: &dyn RecordStore,
    id: &str,
    auth: &AuthContext,
) -> Result<(), DbError> {
    store.delete(Collection::Collaborators, id, auth).await
}

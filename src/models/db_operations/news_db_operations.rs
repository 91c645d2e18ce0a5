use crate::models::db_operations::record_store::{AuthContext, DbError, RecordQuery, RecordStore};
use crate::models::rows;
use crate::models::{Collection, NewsDraft, NewsItem, NewsPatch};
use chrono::Utc;

/// Creates a news item and returns its id. `date` defaults to now.
pub async fn create_news(
    store: &dyn RecordStore,
    draft: &NewsDraft,
    auth: &AuthContext,
) -> Result<String, DbError> {
    let row = rows::news_to_row(draft, Utc::now())?;
    let stored = store.insert(Collection::News, row, auth).await?;
    rows::row_id(Collection::News, &stored)
}

/// Newest first. `published_only` restricts the list to published items;
/// otherwise drafts are included (the manager view).
pub async fn read_news(
    store: &dyn RecordStore,
    published_only: bool,
    auth: &AuthContext,
) -> Result<Vec<NewsItem>, DbError> {
    let mut query = RecordQuery::new();
    if published_only {
        query = query.eq("published", true);
    }
    let query = query.newest_first(Collection::News.sort_column());

    store
        .select(Collection::News, &query, auth)
        .await?
        .into_iter()
        .map(rows::news_from_row)
        .collect()
}

pub async fn read_news_item(
    store: &dyn RecordStore,
    id: &str,
    published_only: bool,
    auth: &AuthContext,
) -> Result<Option<NewsItem>, DbError> {
    let mut query = RecordQuery::new().eq("id", id);
    if published_only {
        query = query.eq("published", true);
    }
    match store.select(Collection::News, &query, auth).await?.into_iter().next() {
        Some(row) => Ok(Some(rows::news_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn update_news(
    store: &dyn RecordStore,
    id: &str,
    patch: &NewsPatch,
    auth: &AuthContext,
) -> Result<(), DbError> {
    let row = rows::news_patch_to_row(patch);
    if row.is_empty() {
        return Ok(());
    }
    store.update(Collection::News, id, row, auth).await
}

pub async fn set_news_published(
    store: &dyn RecordStore,
    id: &str,
    published: bool,
    auth: &AuthContext,
) -> Result<(), DbError> {
    let patch = NewsPatch { published: Some(published), ..Default::default() };
    update_news(store, id, &patch, auth).await
}

/// Deletes the record only; the featured image is the caller's to clean up.
pub async fn delete_news(
    store: &dyn RecordStore,
    id: &str,
    auth: &AuthContext,
) -> Result<(), DbError> {
    store.delete(Collection::News, id, auth).await
}

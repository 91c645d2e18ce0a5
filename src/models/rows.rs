//! Storage shapes of the three record kinds and the only place where
//! application field names (`featuredImage`) become column names
//! (`featured_image`) and back. Every read and write goes through one of the
//! conversion pairs below.

use crate::models::db_operations::record_store::{DbError, Row};
use crate::models::{
    Collaborator, CollaboratorDraft, CollaboratorPatch, Collection, NewsDraft, NewsItem, NewsPatch,
    Resource, ResourceDraft, ResourcePatch,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollaboratorRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn to_row<T: Serialize>(collection: Collection, value: &T) -> Result<Row, DbError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        _ => Err(DbError::MalformedRow {
            collection,
            reason: "record did not serialize to an object".to_string(),
        }),
    }
}

fn from_row<T: DeserializeOwned>(collection: Collection, row: Row) -> Result<T, DbError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DbError::MalformedRow {
        collection,
        reason: e.to_string(),
    })
}

fn require_id(collection: Collection, id: Option<String>) -> Result<String, DbError> {
    id.ok_or_else(|| DbError::MalformedRow {
        collection,
        reason: "row has no id".to_string(),
    })
}

/// The identifier the store assigned to a freshly inserted row.
pub fn row_id(collection: Collection, row: &Row) -> Result<String, DbError> {
    match row.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(DbError::MalformedRow {
            collection,
            reason: "row has no id".to_string(),
        }),
    }
}

fn optional(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::String)
}

/// Same text form chrono's serde impl writes for full rows.
fn timestamp(date: DateTime<Utc>) -> Value {
    Value::String(date.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

// --- News ---

pub fn news_to_row(draft: &NewsDraft, now: DateTime<Utc>) -> Result<Row, DbError> {
    to_row(Collection::News, &NewsRow {
        id: None,
        title: draft.title.clone(),
        content: draft.content.clone(),
        published: draft.published,
        author: draft.author.clone(),
        featured_image: draft.featured_image.clone(),
        date: draft.date.unwrap_or(now),
        created_by: draft.created_by.clone(),
        created_at: None,
        updated_at: None,
    })
}

pub fn news_from_row(row: Row) -> Result<NewsItem, DbError> {
    let row: NewsRow = from_row(Collection::News, row)?;
    Ok(NewsItem {
        id: require_id(Collection::News, row.id)?,
        title: row.title,
        content: row.content,
        published: row.published,
        author: row.author,
        featured_image: row.featured_image,
        date: row.date,
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn news_patch_to_row(patch: &NewsPatch) -> Row {
    let mut row = Row::new();
    if let Some(title) = &patch.title {
        row.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(content) = &patch.content {
        row.insert("content".into(), Value::String(content.clone()));
    }
    if let Some(published) = patch.published {
        row.insert("published".into(), Value::Bool(published));
    }
    if let Some(author) = &patch.author {
        row.insert("author".into(), Value::String(author.clone()));
    }
    if let Some(featured_image) = &patch.featured_image {
        row.insert("featured_image".into(), optional(featured_image));
    }
    if let Some(date) = patch.date {
        row.insert("date".into(), timestamp(date));
    }
    row
}

// --- Resources ---

pub fn resource_to_row(draft: &ResourceDraft, now: DateTime<Utc>) -> Result<Row, DbError> {
    to_row(Collection::Resources, &ResourceRow {
        id: None,
        title: draft.title.clone(),
        description: draft.description.clone(),
        category: draft.category.clone(),
        file_url: draft.file_url.clone(),
        external_url: draft.external_url.clone(),
        date: draft.date.unwrap_or(now),
        created_at: None,
        updated_at: None,
    })
}

pub fn resource_from_row(row: Row) -> Result<Resource, DbError> {
    let row: ResourceRow = from_row(Collection::Resources, row)?;
    Ok(Resource {
        id: require_id(Collection::Resources, row.id)?,
        title: row.title,
        description: row.description,
        category: row.category,
        file_url: row.file_url,
        external_url: row.external_url,
        date: row.date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn resource_patch_to_row(patch: &ResourcePatch) -> Row {
    let mut row = Row::new();
    if let Some(title) = &patch.title {
        row.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(description) = &patch.description {
        row.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(category) = &patch.category {
        row.insert("category".into(), Value::String(category.clone()));
    }
    if let Some(file_url) = &patch.file_url {
        row.insert("file_url".into(), optional(file_url));
    }
    if let Some(external_url) = &patch.external_url {
        row.insert("external_url".into(), optional(external_url));
    }
    if let Some(date) = patch.date {
        row.insert("date".into(), timestamp(date));
    }
    row
}

// --- Collaborators ---

pub fn collaborator_to_row(draft: &CollaboratorDraft) -> Result<Row, DbError> {
    to_row(Collection::Collaborators, &CollaboratorRow {
        id: None,
        name: draft.name.clone(),
        description: draft.description.clone(),
        logo_url: draft.logo_url.clone(),
        website_url: draft.website_url.clone(),
        featured: draft.featured,
        created_at: None,
        updated_at: None,
    })
}

pub fn collaborator_from_row(row: Row) -> Result<Collaborator, DbError> {
    let row: CollaboratorRow = from_row(Collection::Collaborators, row)?;
    Ok(Collaborator {
        id: require_id(Collection::Collaborators, row.id)?,
        name: row.name,
        description: row.description,
        logo_url: row.logo_url,
        website_url: row.website_url,
        featured: row.featured,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn collaborator_patch_to_row(patch: &CollaboratorPatch) -> Row {
    let mut row = Row::new();
    if let Some(name) = &patch.name {
        row.insert("name".into(), Value::String(name.clone()));
    }
    if let Some(description) = &patch.description {
        row.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(logo_url) = &patch.logo_url {
        row.insert("logo_url".into(), optional(logo_url));
    }
    if let Some(website_url) = &patch.website_url {
        row.insert("website_url".into(), optional(website_url));
    }
    if let Some(featured) = patch.featured {
        row.insert("featured".into(), Value::Bool(featured));
    }
    row
}

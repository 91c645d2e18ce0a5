use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three logical record kinds held by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    News,
    Resources,
    Collaborators,
}

impl Collection {
    pub const ALL: [Collection; 3] =
        [Collection::News, Collection::Resources, Collection::Collaborators];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::News => "news",
            Collection::Resources => "resources",
            Collection::Collaborators => "collaborators",
        }
    }

    /// Column the collection is listed by, newest first.
    pub fn sort_column(&self) -> &'static str {
        match self {
            Collection::News | Collection::Resources => "date",
            Collection::Collaborators => "created_at",
        }
    }

    pub fn from_path(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.table_name() == segment)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// --- Application shapes (camelCase on the wire) ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    /// Paragraphs are separated by a newline.
    pub content: String,
    pub published: bool,
    pub author: String,
    pub featured_image: Option<String>,
    pub date: DateTime<Utc>,
    pub created_by: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Free-form label; known labels only pick a display accent.
    pub category: String,
    pub file_url: Option<String>,
    pub external_url: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: String,
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub featured: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// --- Inputs for new records ---

#[derive(Debug, Clone, Default)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub published: bool,
    pub author: String,
    pub featured_image: Option<String>,
    /// Stamped with the current time when absent.
    pub date: Option<DateTime<Utc>>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub file_url: Option<String>,
    pub external_url: Option<String>,
    /// Stamped with the current time when absent.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct CollaboratorDraft {
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub featured: bool,
}

// --- Partial updates ---
// `None` leaves a field untouched; `Some(None)` clears an optional one.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub author: Option<String>,
    pub featured_image: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub file_url: Option<Option<String>>,
    pub external_url: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollaboratorPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<Option<String>>,
    pub website_url: Option<Option<String>>,
    pub featured: Option<bool>,
}

pub mod db_operations;
pub mod manager_panel;
pub mod rows;

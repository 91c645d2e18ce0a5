use crate::models::db_operations::record_store::{AuthContext, DbError, RecordStore};
use crate::models::db_operations::{
    collaborators_db_operations, news_db_operations, resources_db_operations,
};
use crate::models::{Collaborator, NewsItem, Resource};
use serde::Serialize;

const EXCERPT_CHARS: usize = 160;
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsSummaryView {
    #[serde(flatten)]
    pub item: NewsItem,
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsDetailView {
    #[serde(flatten)]
    pub item: NewsItem,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCardView {
    #[serde(flatten)]
    pub resource: Resource,
    pub accent: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceActionKind {
    Download,
    Visit,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceAction {
    pub kind: ResourceActionKind,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetailView {
    #[serde(flatten)]
    pub resource: Resource,
    pub accent: &'static str,
    pub paragraphs: Vec<String>,
    pub actions: Vec<ResourceAction>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct CollaboratorsView {
    pub featured: Vec<Collaborator>,
    pub all: Vec<Collaborator>,
}

/// Body text split on newlines, blank lines dropped.
pub fn paragraphs(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The first paragraph, cut on a word boundary when it runs long.
pub fn excerpt(content: &str) -> String {
    let first = paragraphs(content).into_iter().next().unwrap_or_default();
    if first.chars().count() <= EXCERPT_CHARS {
        return first;
    }
    let cut: String = first.chars().take(EXCERPT_CHARS).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(space) => &cut[..space],
        None => cut.as_str(),
    };
    format!("{}...", cut.trim_end())
}

/// Display colour token for a category. Unknown labels fall back to gray.
pub fn category_accent(category: &str) -> &'static str {
    match category {
        "Agricultural" => "green",
        "Community" => "sky",
        "Framework" => "orange",
        "Construction" => "amber",
        "Training" => "purple",
        "Investment" => "emerald",
        _ => "gray",
    }
}

/// `All` first, then each distinct category in the order it first appears.
pub fn category_summary(resources: &[Resource]) -> Vec<CategorySummary> {
    let mut summary =
        vec![CategorySummary { name: ALL_CATEGORIES.to_string(), count: resources.len() }];
    for resource in resources {
        match summary[1..].iter_mut().find(|entry| entry.name == resource.category) {
            Some(entry) => entry.count += 1,
            None => summary.push(CategorySummary { name: resource.category.clone(), count: 1 }),
        }
    }
    summary
}

/// Download only when a file is attached, visit only when a link is set.
pub fn resource_actions(resource: &Resource) -> Vec<ResourceAction> {
    let mut actions = Vec::new();
    if let Some(url) = &resource.file_url {
        actions.push(ResourceAction { kind: ResourceActionKind::Download, url: url.clone() });
    }
    if let Some(url) = &resource.external_url {
        actions.push(ResourceAction { kind: ResourceActionKind::Visit, url: url.clone() });
    }
    actions
}

pub fn collaborators_view(all: Vec<Collaborator>) -> CollaboratorsView {
    let featured = all.iter().filter(|c| c.featured).cloned().collect();
    CollaboratorsView { featured, all }
}

pub async fn fetch_published_news(
    records: &dyn RecordStore,
) -> Result<Vec<NewsSummaryView>, DbError> {
    let items = news_db_operations::read_news(records, true, &AuthContext::anonymous()).await?;
    Ok(items
        .into_iter()
        .map(|item| NewsSummaryView { excerpt: excerpt(&item.content), item })
        .collect())
}

/// Drafts are indistinguishable from missing items here.
pub async fn fetch_news_detail(
    records: &dyn RecordStore,
    id: &str,
) -> Result<Option<NewsDetailView>, DbError> {
    let anonymous = AuthContext::anonymous();
    let item = news_db_operations::read_news_item(records, id, true, &anonymous).await?;
    Ok(item.map(|item| NewsDetailView { paragraphs: paragraphs(&item.content), item }))
}

pub async fn fetch_resources(
    records: &dyn RecordStore,
    category: Option<&str>,
) -> Result<Vec<ResourceCardView>, DbError> {
    let category = category.map(str::trim).filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);
    let anonymous = AuthContext::anonymous();
    let resources = resources_db_operations::read_resources(records, category, &anonymous).await?;
    Ok(resources
        .into_iter()
        .map(|resource| ResourceCardView { accent: category_accent(&resource.category), resource })
        .collect())
}

pub async fn fetch_resource_categories(
    records: &dyn RecordStore,
) -> Result<Vec<CategorySummary>, DbError> {
    let anonymous = AuthContext::anonymous();
    let resources = resources_db_operations::read_resources(records, None, &anonymous).await?;
    Ok(category_summary(&resources))
}

pub async fn fetch_resource_detail(
    records: &dyn RecordStore,
    id: &str,
) -> Result<Option<ResourceDetailView>, DbError> {
    let anonymous = AuthContext::anonymous();
    let resource = resources_db_operations::read_resource(records, id, &anonymous).await?;
    Ok(resource.map(|resource| ResourceDetailView {
        accent: category_accent(&resource.category),
        paragraphs: paragraphs(&resource.description),
        actions: resource_actions(&resource),
        resource,
    }))
}

pub async fn fetch_collaborators(records: &dyn RecordStore) -> Result<CollaboratorsView, DbError> {
    let anonymous = AuthContext::anonymous();
    let all = collaborators_db_operations::read_collaborators(records, &anonymous).await?;
    Ok(collaborators_view(all))
}

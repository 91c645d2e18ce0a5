use crate::helper::form_helpers::{CollaboratorForm, FormError, NewsForm, ResourceForm};
use crate::helper::storage_helpers::{self, UploadNamespace, UploadedFile};
use crate::middleware::AuthenticatedAdmin;
use crate::models::db_operations::blob_store::StorageError;
use crate::models::db_operations::record_store::{AuthContext, DbError};
use crate::models::db_operations::{
    collaborators_db_operations, news_db_operations, resources_db_operations,
};
use crate::models::manager_panel::{PanelError, PanelState, SubmitTarget};
use crate::models::{
    Collaborator, CollaboratorDraft, CollaboratorPatch, Collection, NewsDraft, NewsItem, NewsPatch,
    Resource, ResourceDraft, ResourcePatch,
};
use crate::AppState;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminHelperError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Validation(#[from] FormError),
    #[error("{0}")]
    Panel(#[from] PanelError),
    #[error("No {collection} record with id '{id}'")]
    NotFound { collection: Collection, id: String },
}

/// Every record of one collection, newest first. News includes drafts.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ManagerRecords {
    News(Vec<NewsItem>),
    Resources(Vec<Resource>),
    Collaborators(Vec<Collaborator>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ManagerRecord {
    News(NewsItem),
    Resource(Resource),
    Collaborator(Collaborator),
}

/// What a manager panel shows after any call: its state and a fresh list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ManagerView {
    pub panel: PanelState,
    pub records: ManagerRecords,
}

/// An admin-submitted form, already validated.
#[derive(Debug, Clone)]
pub enum ManagerForm {
    News(NewsForm),
    Resource(ResourceForm),
    Collaborator(CollaboratorForm),
}

impl ManagerForm {
    pub fn collection(&self) -> Collection {
        match self {
            ManagerForm::News(_) => Collection::News,
            ManagerForm::Resource(_) => Collection::Resources,
            ManagerForm::Collaborator(_) => Collection::Collaborators,
        }
    }
}

fn not_found(collection: Collection, id: &str) -> AdminHelperError {
    AdminHelperError::NotFound { collection, id: id.to_string() }
}

pub async fn list_records(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    collection: Collection,
) -> Result<ManagerRecords, AdminHelperError> {
    let records = state.records.as_ref();
    let auth = admin.auth_context();
    Ok(match collection {
        Collection::News => {
            ManagerRecords::News(news_db_operations::read_news(records, false, &auth).await?)
        }
        Collection::Resources => ManagerRecords::Resources(
            resources_db_operations::read_resources(records, None, &auth).await?,
        ),
        Collection::Collaborators => ManagerRecords::Collaborators(
            collaborators_db_operations::read_collaborators(records, &auth).await?,
        ),
    })
}

pub async fn manager_view(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    collection: Collection,
) -> Result<ManagerView, AdminHelperError> {
    let records = list_records(state, admin, collection).await?;
    Ok(ManagerView { panel: state.panels.state(&admin.user_id, collection), records })
}

async fn read_record(
    state: &AppState,
    auth: &AuthContext,
    collection: Collection,
    id: &str,
) -> Result<Option<ManagerRecord>, DbError> {
    let records = state.records.as_ref();
    Ok(match collection {
        Collection::News => news_db_operations::read_news_item(records, id, false, auth)
            .await?
            .map(ManagerRecord::News),
        Collection::Resources => resources_db_operations::read_resource(records, id, auth)
            .await?
            .map(ManagerRecord::Resource),
        Collection::Collaborators => {
            collaborators_db_operations::read_collaborator(records, id, auth)
                .await?
                .map(ManagerRecord::Collaborator)
        }
    })
}

/// Loads the record into the form and switches the panel to editing.
pub async fn begin_edit(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    collection: Collection,
    id: &str,
) -> Result<ManagerRecord, AdminHelperError> {
    let record = read_record(state, &admin.auth_context(), collection, id)
        .await?
        .ok_or_else(|| not_found(collection, id))?;
    state.panels.begin_edit(&admin.user_id, collection, id)?;
    Ok(record)
}

/// Discards the open form. Nothing is written.
pub async fn cancel_edit(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    collection: Collection,
) -> Result<ManagerView, AdminHelperError> {
    state.panels.cancel(&admin.user_id, collection)?;
    manager_view(state, admin, collection).await
}

/// Uploads `file` when one was sent. The returned URL is the value the
/// record should point at after the write.
async fn upload_if_present(
    state: &AppState,
    file: Option<UploadedFile>,
    namespace: UploadNamespace,
    auth: &AuthContext,
) -> Result<Option<String>, StorageError> {
    match file {
        Some(file) => {
            let blobs = state.blobs.as_ref();
            Ok(Some(storage_helpers::upload_file(blobs, file, namespace, auth).await?))
        }
        None => Ok(None),
    }
}

/// A write failed after a fresh upload: the new object is orphaned.
async fn rollback_upload(
    state: &AppState,
    uploaded: &Option<String>,
    namespace: UploadNamespace,
    auth: &AuthContext,
) {
    let blobs = state.blobs.as_ref();
    storage_helpers::discard_file(blobs, uploaded.as_deref(), Some(namespace), auth).await;
}

/// A fresh upload wins over whatever the URL field said.
fn uploaded_or(uploaded: &Option<String>, field: Option<Option<String>>) -> Option<Option<String>> {
    match uploaded {
        Some(url) => Some(Some(url.clone())),
        None => field,
    }
}

/// The stored URL that a patch supersedes, if any.
fn superseded(old: &Option<String>, replacement: &Option<Option<String>>) -> Option<String> {
    match (old, replacement) {
        (Some(old), Some(new)) if new.as_deref() != Some(old.as_str()) => Some(old.clone()),
        _ => None,
    }
}

// --- Create ---

pub async fn create_record(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    form: ManagerForm,
) -> Result<ManagerView, AdminHelperError> {
    let collection = form.collection();
    let guard = state.panels.begin_submit(&admin.user_id, collection, SubmitTarget::Create)?;
    let auth = admin.auth_context();

    match form {
        ManagerForm::News(form) => create_news_item(state, admin, &auth, form).await?,
        ManagerForm::Resource(form) => create_resource_item(state, &auth, form).await?,
        ManagerForm::Collaborator(form) => create_collaborator_item(state, &auth, form).await?,
    }

    guard.complete();
    manager_view(state, admin, collection).await
}

async fn create_news_item(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    auth: &AuthContext,
    form: NewsForm,
) -> Result<(), AdminHelperError> {
    let uploaded = upload_if_present(state, form.image, UploadNamespace::News, auth).await?;
    let draft = NewsDraft {
        title: form.title,
        content: form.content,
        published: form.published.unwrap_or(false),
        author: form.author.unwrap_or_else(|| admin.email.clone()),
        featured_image: uploaded.clone().or(form.featured_image.flatten()),
        date: form.date,
        created_by: admin.user_id.clone(),
    };

    match news_db_operations::create_news(state.records.as_ref(), &draft, auth).await {
        Ok(id) => {
            log::info!("News item '{}' created by {}", id, admin.email);
            Ok(())
        }
        Err(e) => {
            rollback_upload(state, &uploaded, UploadNamespace::News, auth).await;
            Err(e.into())
        }
    }
}

async fn create_resource_item(
    state: &AppState,
    auth: &AuthContext,
    form: ResourceForm,
) -> Result<(), AdminHelperError> {
    let uploaded = upload_if_present(state, form.file, UploadNamespace::Resources, auth).await?;
    let draft = ResourceDraft {
        title: form.title,
        description: form.description,
        category: form.category,
        file_url: uploaded.clone().or(form.file_url.flatten()),
        external_url: form.external_url.flatten(),
        date: form.date,
    };

    let records = state.records.as_ref();
    if let Err(e) = resources_db_operations::create_resource(records, &draft, auth).await {
        rollback_upload(state, &uploaded, UploadNamespace::Resources, auth).await;
        return Err(e.into());
    }
    Ok(())
}

async fn create_collaborator_item(
    state: &AppState,
    auth: &AuthContext,
    form: CollaboratorForm,
) -> Result<(), AdminHelperError> {
    let uploaded = upload_if_present(state, form.logo, UploadNamespace::Collaborators, auth).await?;
    let draft = CollaboratorDraft {
        name: form.name,
        description: form.description,
        logo_url: uploaded.clone().or(form.logo_url.flatten()),
        website_url: form.website_url.flatten(),
        featured: form.featured.unwrap_or(false),
    };

    let records = state.records.as_ref();
    if let Err(e) = collaborators_db_operations::create_collaborator(records, &draft, auth).await {
        rollback_upload(state, &uploaded, UploadNamespace::Collaborators, auth).await;
        return Err(e.into());
    }
    Ok(())
}

// --- Update ---
// The whole form is submitted, so an unticked (absent) checkbox means false.

/// Writes the form over record `id`. A newly uploaded file replaces the
/// stored one: upload first, write the record, then remove the old file
/// (best-effort).
pub async fn update_record(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    id: &str,
    form: ManagerForm,
) -> Result<ManagerView, AdminHelperError> {
    let collection = form.collection();
    let guard = state
        .panels
        .begin_submit(&admin.user_id, collection, SubmitTarget::Update(id.to_string()))?;
    let auth = admin.auth_context();

    match form {
        ManagerForm::News(form) => update_news_item(state, &auth, id, form).await?,
        ManagerForm::Resource(form) => update_resource_item(state, &auth, id, form).await?,
        ManagerForm::Collaborator(form) => {
            update_collaborator_item(state, &auth, id, form).await?
        }
    }

    guard.complete();
    manager_view(state, admin, collection).await
}

async fn update_news_item(
    state: &AppState,
    auth: &AuthContext,
    id: &str,
    form: NewsForm,
) -> Result<(), AdminHelperError> {
    let records = state.records.as_ref();
    let existing = news_db_operations::read_news_item(records, id, false, auth)
        .await?
        .ok_or_else(|| not_found(Collection::News, id))?;

    let uploaded = upload_if_present(state, form.image, UploadNamespace::News, auth).await?;
    let patch = NewsPatch {
        title: Some(form.title),
        content: Some(form.content),
        published: Some(form.published.unwrap_or(false)),
        author: form.author,
        featured_image: uploaded_or(&uploaded, form.featured_image),
        date: form.date,
    };

    if let Err(e) = news_db_operations::update_news(records, id, &patch, auth).await {
        rollback_upload(state, &uploaded, UploadNamespace::News, auth).await;
        return Err(e.into());
    }

    let old = superseded(&existing.featured_image, &patch.featured_image);
    storage_helpers::discard_file(state.blobs.as_ref(), old.as_deref(), None, auth).await;
    Ok(())
}

async fn update_resource_item(
    state: &AppState,
    auth: &AuthContext,
    id: &str,
    form: ResourceForm,
) -> Result<(), AdminHelperError> {
    let records = state.records.as_ref();
    let existing = resources_db_operations::read_resource(records, id, auth)
        .await?
        .ok_or_else(|| not_found(Collection::Resources, id))?;

    let uploaded = upload_if_present(state, form.file, UploadNamespace::Resources, auth).await?;
    let patch = ResourcePatch {
        title: Some(form.title),
        description: Some(form.description),
        category: Some(form.category),
        file_url: uploaded_or(&uploaded, form.file_url),
        external_url: form.external_url,
        date: form.date,
    };

    if let Err(e) = resources_db_operations::update_resource(records, id, &patch, auth).await {
        rollback_upload(state, &uploaded, UploadNamespace::Resources, auth).await;
        return Err(e.into());
    }

    let old = superseded(&existing.file_url, &patch.file_url);
    let namespace = Some(UploadNamespace::Resources);
    storage_helpers::discard_file(state.blobs.as_ref(), old.as_deref(), namespace, auth).await;
    Ok(())
}

async fn update_collaborator_item(
    state: &AppState,
    auth: &AuthContext,
    id: &str,
    form: CollaboratorForm,
) -> Result<(), AdminHelperError> {
    let records = state.records.as_ref();
    let existing = collaborators_db_operations::read_collaborator(records, id, auth)
        .await?
        .ok_or_else(|| not_found(Collection::Collaborators, id))?;

    let uploaded =
        upload_if_present(state, form.logo, UploadNamespace::Collaborators, auth).await?;
    let patch = CollaboratorPatch {
        name: Some(form.name),
        description: Some(form.description),
        logo_url: uploaded_or(&uploaded, form.logo_url),
        website_url: form.website_url,
        featured: Some(form.featured.unwrap_or(false)),
    };

    let written = collaborators_db_operations::update_collaborator(records, id, &patch, auth).await;
    if let Err(e) = written {
        rollback_upload(state, &uploaded, UploadNamespace::Collaborators, auth).await;
        return Err(e.into());
    }

    let old = superseded(&existing.logo_url, &patch.logo_url);
    storage_helpers::discard_file(state.blobs.as_ref(), old.as_deref(), None, auth).await;
    Ok(())
}

// --- Publish toggle ---

/// Flips a news item between draft and published.
pub async fn toggle_news_published(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    id: &str,
) -> Result<ManagerView, AdminHelperError> {
    let guard = state
        .panels
        .begin_submit(&admin.user_id, Collection::News, SubmitTarget::Publish(id.to_string()))?;
    let auth = admin.auth_context();
    let records = state.records.as_ref();

    let existing = news_db_operations::read_news_item(records, id, false, &auth)
        .await?
        .ok_or_else(|| not_found(Collection::News, id))?;
    news_db_operations::set_news_published(records, id, !existing.published, &auth).await?;
    log::info!(
        "News item '{}' {} by {}",
        id,
        if existing.published { "unpublished" } else { "published" },
        admin.email
    );

    guard.complete();
    manager_view(state, admin, Collection::News).await
}

// --- Delete ---

/// Deletes the record, then best-effort removes the file it pointed at.
/// External links are never touched.
pub async fn delete_record(
    state: &AppState,
    admin: &AuthenticatedAdmin,
    collection: Collection,
    id: &str,
) -> Result<ManagerView, AdminHelperError> {
    let guard = state
        .panels
        .begin_submit(&admin.user_id, collection, SubmitTarget::Delete(id.to_string()))?;
    let auth = admin.auth_context();
    let records = state.records.as_ref();

    let (file, namespace) = match read_record(state, &auth, collection, id).await? {
        Some(ManagerRecord::News(item)) => (item.featured_image, None),
        Some(ManagerRecord::Resource(resource)) => {
            (resource.file_url, Some(UploadNamespace::Resources))
        }
        Some(ManagerRecord::Collaborator(collaborator)) => (collaborator.logo_url, None),
        None => (None, None),
    };

    match collection {
        Collection::News => news_db_operations::delete_news(records, id, &auth).await?,
        Collection::Resources => {
            resources_db_operations::delete_resource(records, id, &auth).await?
        }
        Collection::Collaborators => {
            collaborators_db_operations::delete_collaborator(records, id, &auth).await?
        }
    }
    guard.complete();
    log::info!("Deleted {} record '{}' ({})", collection, id, admin.email);

    storage_helpers::discard_file(state.blobs.as_ref(), file.as_deref(), namespace, &auth).await;
    manager_view(state, admin, collection).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_only_when_the_url_changes() {
        let old = Some("https://a/x.png".to_string());
        assert_eq!(superseded(&old, &None), None);
        assert_eq!(superseded(&old, &Some(Some("https://a/x.png".into()))), None);
        assert_eq!(superseded(&old, &Some(Some("https://a/y.png".into()))), old);
        assert_eq!(superseded(&old, &Some(None)), old);
        assert_eq!(superseded(&None, &Some(None)), None);
    }

    #[test]
    fn uploads_override_the_url_field() {
        let uploaded = Some("https://a/new.png".to_string());
        assert_eq!(uploaded_or(&uploaded, Some(None)), Some(uploaded.clone()));
        assert_eq!(uploaded_or(&None, Some(None)), Some(None));
        assert_eq!(uploaded_or(&None, None), None);
    }
}

use crate::models::db_operations::blob_store::{BlobStore, StorageError};
use crate::models::db_operations::record_store::AuthContext;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use url::Url;

/// Path prefixes inside the shared bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadNamespace {
    News,
    Resources,
    Collaborators,
}

impl UploadNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadNamespace::News => "news",
            UploadNamespace::Resources => "resources",
            UploadNamespace::Collaborators => "collaborators",
        }
    }
}

/// A file taken off a multipart form, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

static LAST_UPLOAD_STAMP: AtomicI64 = AtomicI64::new(0);

/// Milliseconds since the epoch, strictly increasing across the process.
/// Two uploads in the same clock tick get consecutive stamps.
pub fn next_upload_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_UPLOAD_STAMP.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_UPLOAD_STAMP.compare_exchange_weak(
            last,
            next,
            Ordering::SeqCst,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

pub fn object_path(namespace: UploadNamespace, stamp: i64, file_name: &str) -> String {
    format!("{}/{}-{}", namespace.as_str(), stamp, sanitize_file_name(file_name))
}

/// Stores `file` under `namespace` and returns its public URL. Never
/// overwrites an existing object.
pub async fn upload_file(
    blobs: &dyn BlobStore,
    file: UploadedFile,
    namespace: UploadNamespace,
    auth: &AuthContext,
) -> Result<String, StorageError> {
    let path = object_path(namespace, next_upload_stamp(), &file.file_name);
    blobs
        .put_object(&path, file.bytes, &file.content_type, auth)
        .await
        .map_err(|e| match e {
            StorageError::Upload(_) => e,
            other => StorageError::Upload(other.to_string()),
        })?;
    Ok(blobs.public_url(&path))
}

/// The object path inside the bucket: whatever follows the store's own
/// public prefix. `Ok(None)` means the URL points elsewhere and is not ours.
pub fn path_from_public_url(
    blobs: &dyn BlobStore,
    url: &str,
) -> Result<Option<String>, StorageError> {
    let unparseable = || StorageError::UnparseableUrl(url.to_string());
    let parsed = Url::parse(url).map_err(|_| unparseable())?;
    if !blobs.owns_url(&parsed) {
        return Ok(None);
    }

    let prefix = Url::parse(&blobs.public_url("")).map_err(|_| unparseable())?;
    let path = parsed
        .path()
        .strip_prefix(prefix.path().trim_end_matches('/'))
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .ok_or_else(unparseable)?;
    Ok(Some(path.to_string()))
}

/// Removes the object behind `url`. External URLs are left alone and the
/// backend is not contacted.
pub async fn delete_file(
    blobs: &dyn BlobStore,
    url: &str,
    auth: &AuthContext,
) -> Result<(), StorageError> {
    match path_from_public_url(blobs, url)? {
        Some(path) => blobs.remove_object(&path, auth).await,
        None => Ok(()),
    }
}

/// Like `delete_file`, but only ever removes objects under `resources/`.
pub async fn delete_resource_file(
    blobs: &dyn BlobStore,
    url: &str,
    auth: &AuthContext,
) -> Result<(), StorageError> {
    let Some(path) = path_from_public_url(blobs, url)? else {
        return Ok(());
    };
    let namespace = UploadNamespace::Resources.as_str();
    if !path.starts_with(&format!("{}/", namespace)) {
        return Err(StorageError::OutsideNamespace {
            path,
            namespace: namespace.to_string(),
        });
    }
    blobs.remove_object(&path, auth).await
}

/// Cleanup after a record change has already been committed. Failures are
/// logged and swallowed.
pub async fn discard_file(
    blobs: &dyn BlobStore,
    url: Option<&str>,
    namespace: Option<UploadNamespace>,
    auth: &AuthContext,
) {
    let Some(url) = url else { return };
    let result = match namespace {
        Some(UploadNamespace::Resources) => delete_resource_file(blobs, url, auth).await,
        _ => delete_file(blobs, url, auth).await,
    };
    if let Err(e) = result {
        log::warn!("Could not remove stored file '{}': {}", url, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::db_operations::memory_blob_store::MemoryBlobStore;

    fn store() -> MemoryBlobStore {
        MemoryBlobStore::new(Url::parse("https://demo.supabase.co").unwrap(), "images")
    }

    #[test]
    fn sanitizes_everything_outside_the_safe_set() {
        assert_eq!(sanitize_file_name("Annual report (final).pdf"), "Annual_report__final_.pdf");
        assert_eq!(sanitize_file_name("café-menu_v2.PNG"), "caf_-menu_v2.PNG");
        assert_eq!(object_path(UploadNamespace::News, 42, "a b.png"), "news/42-a_b.png");
    }

    #[test]
    fn stamps_never_repeat() {
        let stamps: Vec<i64> = (0..200).map(|_| next_upload_stamp()).collect();
        assert!(stamps.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn path_is_everything_after_the_bucket() {
        let blobs = store();
        let url = blobs.public_url("resources/17-guide.pdf");
        assert_eq!(
            path_from_public_url(&blobs, &url).unwrap(),
            Some("resources/17-guide.pdf".to_string())
        );
        let foreign = "https://cdn.example.org/images/x.png";
        assert_eq!(path_from_public_url(&blobs, foreign).unwrap(), None);
        assert!(matches!(
            path_from_public_url(&blobs, &blobs.public_url("")),
            Err(StorageError::UnparseableUrl(_))
        ));
        assert!(matches!(
            path_from_public_url(&blobs, "https://demo.supabase.co/other/x.png"),
            Err(StorageError::UnparseableUrl(_))
        ));
        assert!(matches!(
            path_from_public_url(&blobs, "not a url"),
            Err(StorageError::UnparseableUrl(_))
        ));
    }

    #[test]
    fn bucket_named_like_a_route_segment_still_parses() {
        let blobs = MemoryBlobStore::new(Url::parse("https://demo.supabase.co").unwrap(), "public");
        let url = blobs.public_url("news/3-public.png");
        assert_eq!(
            path_from_public_url(&blobs, &url).unwrap(),
            Some("news/3-public.png".to_string())
        );

        let blobs = MemoryBlobStore::new(Url::parse("https://demo.supabase.co").unwrap(), "v1");
        let url = blobs.public_url("collaborators/9-logo.png");
        assert_eq!(
            path_from_public_url(&blobs, &url).unwrap(),
            Some("collaborators/9-logo.png".to_string())
        );
    }

    #[actix_web::test]
    async fn upload_returns_a_resolvable_public_url() {
        let blobs = store();
        let file = UploadedFile {
            file_name: "cover photo.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![1, 2, 3],
        };
        let url = upload_file(&blobs, file, UploadNamespace::News, &AuthContext::anonymous())
            .await
            .unwrap();

        assert!(url.starts_with("https://demo.supabase.co/storage/v1/object/public/images/news/"));
        assert!(url.ends_with("-cover_photo.jpg"));
        let stored = blobs.resolve(&url).unwrap();
        assert_eq!(stored.content_type, "image/jpeg");
    }

    #[actix_web::test]
    async fn upload_failures_carry_the_backend_message() {
        let blobs = store();
        blobs.set_failure(Some("bucket quota exceeded"));
        let file = UploadedFile {
            file_name: "a.png".into(),
            content_type: "image/png".into(),
            bytes: vec![],
        };
        let err = upload_file(&blobs, file, UploadNamespace::News, &AuthContext::anonymous())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Upload(_)));
        assert!(err.to_string().starts_with("Failed to upload file:"));
        assert!(err.to_string().contains("bucket quota exceeded"));
    }
}

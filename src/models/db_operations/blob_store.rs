use crate::models::db_operations::record_store::AuthContext;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to upload file: {0}")]
    Upload(String),
    #[error("An object already exists at '{0}'")]
    AlreadyExists(String),
    #[error("Storage backend rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("Could not extract file path from storage URL '{0}'")]
    UnparseableUrl(String),
    #[error("Refusing to delete '{path}': it is outside the '{namespace}/' namespace")]
    OutsideNamespace { path: String, namespace: String },
}

/// A stored object and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// One shared bucket of publicly readable objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// The URL under which the object at `path` is publicly served.
    fn public_url(&self, path: &str) -> String;

    /// Whether `url` is served by this store's host. Anything else is an
    /// external link and is never touched.
    fn owns_url(&self, url: &Url) -> bool;

    /// Stores `bytes` at `path`. Never overwrites: an occupied path fails
    /// with `AlreadyExists`.
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        auth: &AuthContext,
    ) -> Result<(), StorageError>;

    /// `None` when nothing is stored at `path`.
    async fn get_object(
        &self,
        path: &str,
        auth: &AuthContext,
    ) -> Result<Option<StoredObject>, StorageError>;

    async fn remove_object(&self, path: &str, auth: &AuthContext) -> Result<(), StorageError>;
}

/// True when both URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

use crate::models::db_operations::blob_store::{same_origin, BlobStore, StorageError, StoredObject};
use crate::models::db_operations::record_store::AuthContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Process-local `BlobStore` that serves public URLs under `base_url`.
/// Every backend call is recorded so callers can check what was contacted.
pub struct MemoryBlobStore {
    base_url: Url,
    bucket: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    calls: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::error!("Mutex for the memory blob store was poisoned! Recovering lock.");
        poisoned.into_inner()
    })
}

impl MemoryBlobStore {
    pub fn new(base_url: Url, bucket: &str) -> Self {
        Self {
            base_url,
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = lock(&self.objects).keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Fetches an object through its public URL, as a browser would.
    pub fn resolve(&self, public_url: &str) -> Option<StoredObject> {
        let prefix = self.public_url("");
        let path = public_url.strip_prefix(&prefix)?;
        lock(&self.objects).get(path).cloned()
    }

    /// Backend calls so far, as `put:{path}` / `remove:{path}`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Makes every following write fail with `message`. `None` restores
    /// normal behaviour.
    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    fn check_failure(&self) -> Result<(), StorageError> {
        match lock(&self.failure).as_ref() {
            Some(message) => Err(StorageError::Backend { status: 500, message: message.clone() }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.bucket,
            path
        )
    }

    fn owns_url(&self, url: &Url) -> bool {
        same_origin(url, &self.base_url)
    }

    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        _auth: &AuthContext,
    ) -> Result<(), StorageError> {
        lock(&self.calls).push(format!("put:{}", path));
        self.check_failure()?;

        let mut objects = lock(&self.objects);
        if objects.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        objects.insert(
            path.to_string(),
            StoredObject { bytes, content_type: content_type.to_string() },
        );
        Ok(())
    }

    async fn get_object(
        &self,
        path: &str,
        _auth: &AuthContext,
    ) -> Result<Option<StoredObject>, StorageError> {
        Ok(lock(&self.objects).get(path).cloned())
    }

    async fn remove_object(&self, path: &str, _auth: &AuthContext) -> Result<(), StorageError> {
        lock(&self.calls).push(format!("remove:{}", path));
        self.check_failure()?;
        lock(&self.objects).remove(path);
        Ok(())
    }
}

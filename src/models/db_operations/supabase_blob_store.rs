use crate::models::db_operations::blob_store::{same_origin, BlobStore, StorageError, StoredObject};
use crate::models::db_operations::record_store::AuthContext;
use crate::models::db_operations::supabase_client::SupabaseClient;
use async_trait::async_trait;
use serde_json::json;
use url::Url;

/// `BlobStore` over the hosted object storage API.
#[derive(Clone)]
pub struct SupabaseBlobStore {
    client: SupabaseClient,
    bucket: String,
}

impl SupabaseBlobStore {
    pub fn new(client: SupabaseClient, bucket: &str) -> Self {
        Self { client, bucket: bucket.to_string() }
    }

    /// `/storage/v1/object/{bucket}/{path}`, the upload target.
    pub fn object_url(&self, path: &str) -> Url {
        let segments = ["storage", "v1", "object", self.bucket.as_str()];
        self.client.endpoint(segments.into_iter().chain(path.split('/')))
    }
}

#[async_trait]
impl BlobStore for SupabaseBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, path: &str) -> String {
        let segments = ["storage", "v1", "object", "public", self.bucket.as_str()];
        self.client
            .endpoint(segments.into_iter().chain(path.split('/')))
            .to_string()
    }

    fn owns_url(&self, url: &Url) -> bool {
        same_origin(url, self.client.base_url())
    }

    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        auth: &AuthContext,
    ) -> Result<(), StorageError> {
        let request = self
            .client
            .http()
            .post(self.object_url(path))
            .header("Content-Type", content_type)
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes);
        let response = self.client.authorize(request, auth).send().await?;

        if response.status().is_success() {
            return Ok(());
        }
        let (status, message) = SupabaseClient::error_message(response).await;
        // Duplicates come back as 409, or as 400 wrapping a 409 body.
        if status == 409 || message.to_lowercase().contains("already exists") {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        Err(StorageError::Backend { status, message })
    }

    async fn get_object(
        &self,
        path: &str,
        auth: &AuthContext,
    ) -> Result<Option<StoredObject>, StorageError> {
        let request = self.client.http().get(self.object_url(path));
        let response = self.client.authorize(request, auth).send().await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            let (status, message) = SupabaseClient::error_message(response).await;
            return Err(StorageError::Backend { status, message });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(Some(StoredObject { bytes, content_type }))
    }

    async fn remove_object(&self, path: &str, auth: &AuthContext) -> Result<(), StorageError> {
        let url = self.client.endpoint(["storage", "v1", "object", self.bucket.as_str()]);
        let request = self
            .client
            .http()
            .delete(url)
            .json(&json!({ "prefixes": [path] }));
        let response = self.client.authorize(request, auth).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let (status, message) = SupabaseClient::error_message(response).await;
            Err(StorageError::Backend { status, message })
        }
    }
}

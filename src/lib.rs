use std::sync::Arc;

use crate::config::{BackendMode, Config};
use crate::models::db_operations::auth_provider::{
    AuthProvider, MemoryAuthProvider, SupabaseAuthProvider,
};
use crate::models::db_operations::blob_store::BlobStore;
use crate::models::db_operations::memory_blob_store::MemoryBlobStore;
use crate::models::db_operations::memory_record_store::MemoryRecordStore;
use crate::models::db_operations::record_store::RecordStore;
use crate::models::db_operations::supabase_blob_store::SupabaseBlobStore;
use crate::models::db_operations::supabase_client::{ClientError, SupabaseClient};
use crate::models::db_operations::supabase_record_store::SupabaseRecordStore;
use crate::models::manager_panel::PanelRegistry;

/// Shared by every worker. The three backends are trait objects so the
/// hosted services and the in-process stand-ins are interchangeable.
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub panels: PanelRegistry,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        auth: Arc<dyn AuthProvider>,
        max_upload_bytes: u64,
    ) -> Self {
        Self { records, blobs, auth, panels: PanelRegistry::new(), max_upload_bytes }
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let max_upload_bytes = config.max_upload_bytes();
        match config.backend_mode {
            BackendMode::Supabase => {
                let client = SupabaseClient::new(&config.supabase_url, &config.supabase_anon_key)?;
                Ok(Self::new(
                    Arc::new(SupabaseRecordStore::new(client.clone())),
                    Arc::new(SupabaseBlobStore::new(client.clone(), &config.storage_bucket)),
                    Arc::new(SupabaseAuthProvider::new(client)),
                    max_upload_bytes,
                ))
            }
            BackendMode::Memory => {
                let public_base = format!("http://{}:{}", config.web.host, config.web.port);
                let base_url = url::Url::parse(&public_base).map_err(|source| {
                    ClientError::InvalidUrl { url: public_base.clone(), source }
                })?;
                Ok(Self::new(
                    Arc::new(MemoryRecordStore::new()),
                    Arc::new(MemoryBlobStore::new(base_url, &config.storage_bucket)),
                    Arc::new(MemoryAuthProvider::new(
                        &config.memory_admin_email,
                        &config.memory_admin_password,
                    )),
                    max_upload_bytes,
                ))
            }
        }
    }
}

pub mod config;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;

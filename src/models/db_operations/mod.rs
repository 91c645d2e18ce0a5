pub mod auth_provider;
pub mod blob_store;
pub mod collaborators_db_operations;
pub mod memory_blob_store;
pub mod memory_record_store;
pub mod news_db_operations;
pub mod record_store;
pub mod resources_db_operations;
pub mod supabase_blob_store;
pub mod supabase_client;
pub mod supabase_record_store;

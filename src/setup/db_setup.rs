use crate::models::db_operations::record_store::{AuthContext, DbError, RecordQuery, RecordStore};
use crate::models::Collection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Record store error: {0}")]
    Database(#[from] DbError),
}

/// DDL for the hosted database: the three tables, the shared public bucket
/// and row-level policies (anyone reads, signed-in users write).
pub fn schema_sql(bucket: &str) -> String {
    let mut sql = String::from(
        "-- news
CREATE TABLE IF NOT EXISTS news (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    published BOOLEAN NOT NULL DEFAULT FALSE,
    author TEXT NOT NULL DEFAULT '',
    featured_image TEXT,
    date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- resources
CREATE TABLE IF NOT EXISTS resources (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    file_url TEXT,
    external_url TEXT,
    date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- collaborators
CREATE TABLE IF NOT EXISTS collaborators (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    logo_url TEXT,
    website_url TEXT,
    featured BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
",
    );

    for collection in Collection::ALL {
        let table = collection.table_name();
        sql.push_str(&format!(
            "
ALTER TABLE {table} ENABLE ROW LEVEL SECURITY;
CREATE POLICY \"{table} are readable by anyone\" ON {table} FOR SELECT USING (true);
CREATE POLICY \"{table} are writable when signed in\" ON {table} FOR ALL TO authenticated USING (true) WITH CHECK (true);
"
        ));
    }

    sql.push_str(&format!(
        "
-- storage
INSERT INTO storage.buckets (id, name, public) VALUES ('{bucket}', '{bucket}', true) ON CONFLICT (id) DO NOTHING;
CREATE POLICY \"{bucket} objects are public\" ON storage.objects FOR SELECT USING (bucket_id = '{bucket}');
CREATE POLICY \"{bucket} objects are writable when signed in\" ON storage.objects FOR ALL TO authenticated USING (bucket_id = '{bucket}') WITH CHECK (bucket_id = '{bucket}');
"
    ));
    sql
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection: Collection,
    pub rows: usize,
}

/// Lists every collection once through the configured backend.
pub async fn check_collections(
    records: &dyn RecordStore,
) -> Result<Vec<CollectionReport>, SetupError> {
    let mut reports = Vec::new();
    for collection in Collection::ALL {
        let query = RecordQuery::new().newest_first(collection.sort_column());
        let rows = records.select(collection, &query, &AuthContext::anonymous()).await?;
        reports.push(CollectionReport { collection, rows: rows.len() });
    }
    Ok(reports)
}

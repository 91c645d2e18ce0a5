use crate::models::db_operations::record_store::{
    AuthContext, DbError, RecordQuery, RecordStore, Row, SortOrder,
};
use crate::models::db_operations::supabase_client::SupabaseClient;
use crate::models::Collection;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// `RecordStore` over the hosted REST data API (PostgREST dialect).
#[derive(Clone)]
pub struct SupabaseRecordStore {
    client: SupabaseClient,
}

fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, DbError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let (status, message) = SupabaseClient::error_message(response).await;
        Err(DbError::Backend { status, message })
    }
}

impl SupabaseRecordStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// `/rest/v1/{table}?select=*&{column}=eq.{value}&order={column}.desc`
    pub fn table_url(&self, collection: Collection, query: &RecordQuery) -> Url {
        let mut url = self.client.endpoint(["rest", "v1", collection.table_name()]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for (column, value) in &query.filters {
                pairs.append_pair(column, &format!("eq.{}", filter_value(value)));
            }
            if let Some((column, order)) = &query.order_by {
                let direction = match order {
                    SortOrder::Ascending => "asc",
                    SortOrder::Descending => "desc",
                };
                pairs.append_pair("order", &format!("{}.{}", column, direction));
            }
        }
        url
    }

    fn row_url(&self, collection: Collection, id: &str) -> Url {
        self.table_url(collection, &RecordQuery::new().eq("id", id))
    }
}

#[async_trait]
impl RecordStore for SupabaseRecordStore {
    async fn insert(
        &self,
        collection: Collection,
        row: Row,
        auth: &AuthContext,
    ) -> Result<Row, DbError> {
        let url = self.table_url(collection, &RecordQuery::new());
        let request = self
            .client
            .http()
            .post(url)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = check(self.client.authorize(request, auth).send().await?).await?;

        let mut inserted: Vec<Row> = response.json().await?;
        if inserted.is_empty() {
            return Err(DbError::MalformedRow {
                collection,
                reason: "insert returned no representation".to_string(),
            });
        }
        Ok(inserted.swap_remove(0))
    }

    async fn select(
        &self,
        collection: Collection,
        query: &RecordQuery,
        auth: &AuthContext,
    ) -> Result<Vec<Row>, DbError> {
        let request = self.client.http().get(self.table_url(collection, query));
        let response = check(self.client.authorize(request, auth).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Row,
        auth: &AuthContext,
    ) -> Result<(), DbError> {
        let request = self
            .client
            .http()
            .patch(self.row_url(collection, id))
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = check(self.client.authorize(request, auth).send().await?).await?;

        // Row-level security hides rows instead of failing, so an empty
        // representation is the only signal that nothing was updated.
        let updated: Vec<Row> = response.json().await?;
        if updated.is_empty() {
            return Err(DbError::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }

    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        auth: &AuthContext,
    ) -> Result<(), DbError> {
        let request = self.client.http().delete(self.row_url(collection, id));
        check(self.client.authorize(request, auth).send().await?).await?;
        Ok(())
    }
}

use crate::models::db_operations::record_store::AuthContext;
use reqwest::RequestBuilder;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid backend URL '{url}': {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("Backend URL '{0}' cannot carry path segments")]
    NotABase(String),
    #[error("The public API key is empty")]
    MissingKey,
    #[error("Failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared HTTP plumbing for the hosted data, storage and auth endpoints.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

/// The fields the backend uses for error text, depending on the service.
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|source| ClientError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::NotABase(base_url.to_string()));
        }
        if anon_key.trim().is_empty() {
            return Err(ClientError::MissingKey);
        }

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: parsed,
            anon_key: anon_key.to_string(),
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL. Each segment is percent-encoded
    /// on its own, so callers split object paths on `/` first.
    pub fn endpoint<'a, I>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Adds the API key and a bearer token: the session's access token when
    /// there is one, the public key otherwise.
    pub fn authorize(&self, request: RequestBuilder, auth: &AuthContext) -> RequestBuilder {
        let bearer = auth.access_token().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    /// Reads a failed response into `(status, message)`.
    pub async fn error_message(response: reqwest::Response) -> (u16, String) {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        (status, extract_message(&text))
    }
}

pub(crate) fn extract_message(text: &str) -> String {
    let body: ErrorBody = serde_json::from_str(text).unwrap_or_default();
    body.message
        .or(body.error_description)
        .or(body.msg)
        .or(body.error)
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                "empty response from backend".to_string()
            } else {
                text.trim().to_string()
            }
        })
}

use crate::models::db_operations::record_store::AuthContext;
use crate::models::db_operations::supabase_client::SupabaseClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Authentication provider rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },
}

/// What a successful sign-in yields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

/// The hosted password-login service. Session issuance and token refresh
/// live entirely on the provider's side.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

pub struct SupabaseAuthProvider {
    client: SupabaseClient,
}

impl SupabaseAuthProvider {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut url = self.client.endpoint(["auth", "v1", "token"]);
        url.query_pairs_mut().append_pair("grant_type", "password");

        let request = self
            .client
            .http()
            .post(url)
            .json(&json!({ "email": email, "password": password }));
        let response = self
            .client
            .authorize(request, &AuthContext::anonymous())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 400 || status.as_u16() == 401 {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let (status, message) = SupabaseClient::error_message(response).await;
            return Err(AuthError::Backend { status, message });
        }

        let token: TokenResponse = response.json().await?;
        Ok(AuthSession {
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| email.to_string()),
            access_token: token.access_token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.client.endpoint(["auth", "v1", "logout"]);
        let request = self.client.http().post(url);
        let response = self
            .client
            .authorize(request, &AuthContext::bearer(access_token))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let (status, message) = SupabaseClient::error_message(response).await;
            Err(AuthError::Backend { status, message })
        }
    }
}

/// Single-account provider for `BACKEND_MODE=memory` and tests.
pub struct MemoryAuthProvider {
    user_id: String,
    email: String,
    password: String,
    tokens: Mutex<HashSet<String>>,
}

impl MemoryAuthProvider {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password: password.to_string(),
            tokens: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_active(&self, access_token: &str) -> bool {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(access_token)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if !email.eq_ignore_ascii_case(&self.email) || password != self.password {
            return Err(AuthError::InvalidCredentials);
        }
        let access_token = Uuid::new_v4().to_string();
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(access_token.clone());

        Ok(AuthSession {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            access_token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(access_token);
        Ok(())
    }
}

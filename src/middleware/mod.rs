use crate::models::db_operations::auth_provider::AuthSession;
use crate::models::db_operations::record_store::AuthContext;
use actix_session::{Session, SessionExt, SessionInsertError};
use actix_web::{dev, FromRequest, HttpRequest};
use serde::Serialize;
use std::future::{ready, Ready};

const USER_ID_KEY: &str = "user_id";
const EMAIL_KEY: &str = "email";
const ACCESS_TOKEN_KEY: &str = "access_token";

/// The signed-in admin, read from the session cookie. Any handler that
/// takes this as an argument answers 401 to anonymous callers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthenticatedAdmin {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

impl AuthenticatedAdmin {
    /// Backend calls on behalf of this admin carry their session token.
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::bearer(self.access_token.clone())
    }

    pub fn from_session(session: &Session) -> Option<Self> {
        match (
            session.get::<String>(USER_ID_KEY),
            session.get::<String>(EMAIL_KEY),
            session.get::<String>(ACCESS_TOKEN_KEY),
        ) {
            (Ok(Some(user_id)), Ok(Some(email)), Ok(Some(access_token))) => {
                Some(AuthenticatedAdmin { user_id, email, access_token })
            }
            _ => None,
        }
    }
}

impl FromRequest for AuthenticatedAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        match AuthenticatedAdmin::from_session(&req.get_session()) {
            Some(admin) => ready(Ok(admin)),
            None => ready(Err(actix_web::error::ErrorUnauthorized("Not logged in."))),
        }
    }
}

/// Stores a fresh sign-in, replacing whatever the cookie held before.
pub fn start_session(session: &Session, signed_in: &AuthSession) -> Result<(), SessionInsertError> {
    session.renew();
    session.insert(USER_ID_KEY, &signed_in.user_id)?;
    session.insert(EMAIL_KEY, &signed_in.email)?;
    session.insert(ACCESS_TOKEN_KEY, &signed_in.access_token)?;
    Ok(())
}

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{test, web};
use sitebase_backend::models::db_operations::auth_provider::MemoryAuthProvider;
use sitebase_backend::models::db_operations::memory_blob_store::MemoryBlobStore;
use sitebase_backend::models::db_operations::memory_record_store::MemoryRecordStore;
use sitebase_backend::AppState;
use std::sync::Arc;
use url::Url;

pub const ADMIN_EMAIL: &str = "editor@example.org";
pub const ADMIN_PASSWORD: &str = "correct horse";
pub const STORAGE_BASE: &str = "https://demo.supabase.co";
pub const BOUNDARY: &str = "----sitebase-test-boundary";

pub struct Backends {
    pub records: Arc<MemoryRecordStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub state: web::Data<AppState>,
}

pub fn backends() -> Backends {
    let records = Arc::new(MemoryRecordStore::new());
    let blobs = Arc::new(MemoryBlobStore::new(Url::parse(STORAGE_BASE).unwrap(), "images"));
    let auth = Arc::new(MemoryAuthProvider::new(ADMIN_EMAIL, ADMIN_PASSWORD));
    let state = web::Data::new(AppState::new(records.clone(), blobs.clone(), auth, 1024 * 1024));
    Backends { records, blobs, state }
}

/// Public API plus the session-wrapped admin API over `$state`.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state)
                .configure(sitebase_backend::routes::public::config_api)
                .service(
                    actix_web::web::scope("")
                        .wrap(actix_session::SessionMiddleware::new(
                            actix_session::storage::CookieSessionStore::default(),
                            actix_web::cookie::Key::generate(),
                        ))
                        .configure(sitebase_backend::routes::admin::config_admin),
                ),
        )
        .await
    };
}

/// Signs in as the test admin and evaluates to the session cookie.
macro_rules! login {
    ($app:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/admin/login")
            .insert_header((
                actix_web::http::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            ))
            .set_payload($crate::common::login_body())
            .to_request();
        let resp = actix_web::test::call_service($app, req).await;
        assert!(resp.status().is_success(), "login failed: {}", resp.status());
        let cookie = resp
            .response()
            .cookies()
            .next()
            .expect("login sets a session cookie")
            .into_owned();
        cookie
    }};
}

pub fn login_body() -> String {
    format!("email={}&password=correct%20horse", ADMIN_EMAIL.replace('@', "%40"))
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File { name: &'a str, file_name: &'a str, content_type: &'a str, bytes: &'a [u8] },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                let disposition =
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name);
                body.extend_from_slice(disposition.as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File { name, file_name, content_type, bytes } => {
                let disposition = format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, file_name
                );
                body.extend_from_slice(disposition.as_bytes());
                let kind = format!("Content-Type: {}\r\n\r\n", content_type);
                body.extend_from_slice(kind.as_bytes());
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(
    uri: &str,
    cookie: &Cookie<'static>,
    parts: &[Part<'_>],
) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .cookie(cookie.clone())
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

pub fn file<'a>(
    name: &'a str,
    file_name: &'a str,
    content_type: &'a str,
    bytes: &'a [u8],
) -> Part<'a> {
    Part::File { name, file_name, content_type, bytes }
}

pub fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri)
}

pub fn delete(uri: &str, cookie: &Cookie<'static>) -> test::TestRequest {
    test::TestRequest::delete().uri(uri).cookie(cookie.clone())
}

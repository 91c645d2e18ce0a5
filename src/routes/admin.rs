use crate::helper::admin_helpers::{self, AdminHelperError, ManagerForm};
use crate::helper::form_helpers::{self, CollaboratorForm, FormError, NewsForm, ResourceForm};
use crate::middleware::{self, AuthenticatedAdmin};
use crate::models::db_operations::auth_provider::AuthError;
use crate::models::db_operations::record_store::DbError;
use crate::models::Collection;
use crate::AppState;
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse { success: true, data: Some(data), error: None })
}

fn failure(mut builder: actix_web::HttpResponseBuilder, message: String) -> HttpResponse {
    builder.json(ApiResponse { success: false, data: None::<()>, error: Some(message) })
}

fn error_response(e: AdminHelperError) -> HttpResponse {
    match &e {
        AdminHelperError::Validation(FormError::TooLarge { .. }) => {
            failure(HttpResponse::PayloadTooLarge(), e.to_string())
        }
        AdminHelperError::Validation(_) => failure(HttpResponse::BadRequest(), e.to_string()),
        AdminHelperError::Panel(_) => failure(HttpResponse::Conflict(), e.to_string()),
        AdminHelperError::NotFound { .. } | AdminHelperError::Database(DbError::NotFound(_)) => {
            failure(HttpResponse::NotFound(), e.to_string())
        }
        AdminHelperError::Database(_) | AdminHelperError::Storage(_) => {
            log::error!("Manager operation failed: {}", e);
            failure(HttpResponse::InternalServerError(), e.to_string())
        }
    }
}

fn respond<T: Serialize>(result: Result<T, AdminHelperError>) -> HttpResponse {
    match result {
        Ok(data) => success(data),
        Err(e) => error_response(e),
    }
}

fn collection_from_path(segment: &str) -> Result<Collection, HttpResponse> {
    Collection::from_path(segment)
        .ok_or_else(|| {
            failure(HttpResponse::NotFound(), format!("Unknown collection '{}'", segment))
        })
}

pub fn config_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/login", web::post().to(handle_login))
            .route("/logout", web::post().to(handle_logout))
            .route("/session", web::get().to(current_session))
            .route("/news/{id}/publish", web::post().to(toggle_publish_action))
            .route("/{collection}", web::get().to(list_action))
            .route("/{collection}", web::post().to(create_action))
            .route("/{collection}/cancel", web::post().to(cancel_action))
            .route("/{collection}/{id}/edit", web::get().to(edit_action))
            .route("/{collection}/{id}", web::post().to(update_action))
            .route("/{collection}/{id}", web::delete().to(delete_action)),
    );
}

// --- Session ---

async fn handle_login(
    session: Session,
    state: web::Data<AppState>,
    form: web::Bytes,
) -> impl Responder {
    let parsed = match form_helpers::parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let email = parsed.get("email").map(|s| s.trim()).unwrap_or("");
    let password = parsed.get("password").map(String::as_str).unwrap_or("");
    if email.is_empty() || password.is_empty() {
        return failure(HttpResponse::BadRequest(), "Email and password are required.".to_string());
    }

    match state.auth.sign_in(email, password).await {
        Ok(signed_in) => {
            if let Err(e) = middleware::start_session(&session, &signed_in) {
                log::error!("Failed to store session for {}: {}", signed_in.email, e);
                return failure(
                    HttpResponse::InternalServerError(),
                    "Could not start a session.".to_string(),
                );
            }
            log::info!("Admin {} signed in", signed_in.email);
            match AuthenticatedAdmin::from_session(&session) {
                Some(admin) => success(admin),
                None => failure(
                    HttpResponse::InternalServerError(),
                    "Could not start a session.".to_string(),
                ),
            }
        }
        Err(AuthError::InvalidCredentials) => {
            log::warn!("Rejected sign-in attempt for {}", email);
            failure(HttpResponse::Unauthorized(), AuthError::InvalidCredentials.to_string())
        }
        Err(e) => {
            log::error!("Sign-in for {} failed: {}", email, e);
            failure(
                HttpResponse::InternalServerError(),
                "Sign-in is currently unavailable.".to_string(),
            )
        }
    }
}

async fn handle_logout(session: Session, state: web::Data<AppState>) -> impl Responder {
    if let Some(admin) = AuthenticatedAdmin::from_session(&session) {
        if let Err(e) = state.auth.sign_out(&admin.access_token).await {
            log::warn!("Provider sign-out for {} failed: {}", admin.email, e);
        }
        log::info!("Admin {} signed out", admin.email);
    }
    session.purge();
    success(())
}

async fn current_session(session: Session) -> impl Responder {
    success(AuthenticatedAdmin::from_session(&session))
}

// --- Managers ---

async fn read_manager_form(
    collection: Collection,
    payload: Multipart,
    max_bytes: u64,
) -> Result<ManagerForm, AdminHelperError> {
    let form = form_helpers::read_multipart(payload, max_bytes).await?;
    Ok(match collection {
        Collection::News => ManagerForm::News(NewsForm::from_multipart(form)?),
        Collection::Resources => ManagerForm::Resource(ResourceForm::from_multipart(form)?),
        Collection::Collaborators => {
            ManagerForm::Collaborator(CollaboratorForm::from_multipart(form)?)
        }
    })
}

async fn list_action(
    admin: AuthenticatedAdmin,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let collection = match collection_from_path(&path) {
        Ok(c) => c,
        Err(response) => return response,
    };
    respond(admin_helpers::manager_view(&state, &admin, collection).await)
}

async fn edit_action(
    admin: AuthenticatedAdmin,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (segment, id) = path.into_inner();
    let collection = match collection_from_path(&segment) {
        Ok(c) => c,
        Err(response) => return response,
    };
    respond(admin_helpers::begin_edit(&state, &admin, collection, &id).await)
}

async fn cancel_action(
    admin: AuthenticatedAdmin,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let collection = match collection_from_path(&path) {
        Ok(c) => c,
        Err(response) => return response,
    };
    respond(admin_helpers::cancel_edit(&state, &admin, collection).await)
}

async fn create_action(
    admin: AuthenticatedAdmin,
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Multipart,
) -> impl Responder {
    let collection = match collection_from_path(&path) {
        Ok(c) => c,
        Err(response) => return response,
    };
    let form = match read_manager_form(collection, payload, state.max_upload_bytes).await {
        Ok(form) => form,
        Err(e) => return error_response(e),
    };
    respond(admin_helpers::create_record(&state, &admin, form).await)
}

async fn update_action(
    admin: AuthenticatedAdmin,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    payload: Multipart,
) -> impl Responder {
    let (segment, id) = path.into_inner();
    let collection = match collection_from_path(&segment) {
        Ok(c) => c,
        Err(response) => return response,
    };
    let form = match read_manager_form(collection, payload, state.max_upload_bytes).await {
        Ok(form) => form,
        Err(e) => return error_response(e),
    };
    respond(admin_helpers::update_record(&state, &admin, &id, form).await)
}

async fn toggle_publish_action(
    admin: AuthenticatedAdmin,
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> impl Responder {
    respond(admin_helpers::toggle_news_published(&state, &admin, &id).await)
}

async fn delete_action(
    admin: AuthenticatedAdmin,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (segment, id) = path.into_inner();
    let collection = match collection_from_path(&segment) {
        Ok(c) => c,
        Err(response) => return response,
    };
    respond(admin_helpers::delete_record(&state, &admin, collection, &id).await)
}

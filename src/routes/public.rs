use crate::helper::public_helpers::{self, CollaboratorsView};
use crate::models::db_operations::record_store::AuthContext;
use crate::AppState;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ResourceQuery {
    category: Option<String>,
}

/// Public read side. Listings degrade to an empty result when the backend
/// fails; detail views answer 404.
pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/is_server_active", web::get().to(is_server_active))
            .route("/news", web::get().to(get_news))
            .route("/news/{id}", web::get().to(get_news_by_id))
            .route("/resources", web::get().to(get_resources))
            .route("/resources/categories", web::get().to(get_resource_categories))
            .route("/resources/{id}", web::get().to(get_resource_by_id))
            .route("/collaborators", web::get().to(get_collaborators)),
    );
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn get_news(state: web::Data<AppState>) -> impl Responder {
    match public_helpers::fetch_published_news(state.records.as_ref()).await {
        Ok(news) => HttpResponse::Ok().json(news),
        Err(e) => {
            log::error!("Failed to fetch published news: {}", e);
            HttpResponse::Ok().json(Vec::<public_helpers::NewsSummaryView>::new())
        }
    }
}

async fn get_news_by_id(id: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    match public_helpers::fetch_news_detail(state.records.as_ref(), &id).await {
        Ok(Some(item)) => HttpResponse::Ok().json(item),
        Ok(None) => HttpResponse::NotFound().body("News item not found"),
        Err(e) => {
            log::error!("Failed to fetch news item '{}': {}", id, e);
            HttpResponse::NotFound().body("News item not found")
        }
    }
}

async fn get_resources(
    state: web::Data<AppState>,
    query: web::Query<ResourceQuery>,
) -> impl Responder {
    let category = query.category.as_deref();
    match public_helpers::fetch_resources(state.records.as_ref(), category).await {
        Ok(resources) => HttpResponse::Ok().json(resources),
        Err(e) => {
            log::error!("Failed to fetch resources (category {:?}): {}", category, e);
            HttpResponse::Ok().json(Vec::<public_helpers::ResourceCardView>::new())
        }
    }
}

async fn get_resource_categories(state: web::Data<AppState>) -> impl Responder {
    match public_helpers::fetch_resource_categories(state.records.as_ref()).await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(e) => {
            log::error!("Failed to fetch resource categories: {}", e);
            HttpResponse::Ok().json(public_helpers::category_summary(&[]))
        }
    }
}

async fn get_resource_by_id(id: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    match public_helpers::fetch_resource_detail(state.records.as_ref(), &id).await {
        Ok(Some(resource)) => HttpResponse::Ok().json(resource),
        Ok(None) => HttpResponse::NotFound().body("Resource not found"),
        Err(e) => {
            log::error!("Failed to fetch resource '{}': {}", id, e);
            HttpResponse::NotFound().body("Resource not found")
        }
    }
}

async fn get_collaborators(state: web::Data<AppState>) -> impl Responder {
    match public_helpers::fetch_collaborators(state.records.as_ref()).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            log::error!("Failed to fetch collaborators: {}", e);
            HttpResponse::Ok().json(CollaboratorsView::default())
        }
    }
}

/// Serves uploaded objects when the blob store is process-local. The hosted
/// store serves its own public URLs.
pub fn config_local_storage(cfg: &mut web::ServiceConfig) {
    cfg.route("/storage/v1/object/public/{bucket}/{path:.*}", web::get().to(get_stored_object));
}

async fn get_stored_object(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (bucket, object_path) = path.into_inner();
    if bucket != state.blobs.bucket() {
        return HttpResponse::NotFound().finish();
    }
    match state.blobs.get_object(&object_path, &AuthContext::anonymous()).await {
        Ok(Some(object)) => HttpResponse::Ok().content_type(object.content_type).body(object.bytes),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("Failed to read stored object '{}': {}", object_path, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

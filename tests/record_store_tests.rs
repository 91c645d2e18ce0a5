use chrono::{TimeZone, Utc};
use serde_json::json;
use sitebase_backend::models::db_operations::memory_record_store::MemoryRecordStore;
use sitebase_backend::models::db_operations::record_store::{AuthContext, DbError};
use sitebase_backend::models::db_operations::{
    collaborators_db_operations, news_db_operations, resources_db_operations,
};
use sitebase_backend::models::{
    CollaboratorDraft, Collection, NewsDraft, NewsPatch, ResourceDraft, ResourcePatch,
};

fn news(title: &str, day: u32, published: bool) -> NewsDraft {
    NewsDraft {
        title: title.to_string(),
        content: format!("{} body", title),
        published,
        author: "Desk".to_string(),
        featured_image: None,
        date: Some(Utc.with_ymd_and_hms(2024, 4, day, 12, 0, 0).unwrap()),
        created_by: "admin-1".to_string(),
    }
}

#[actix_web::test]
async fn news_fields_round_trip_through_storage_names() {
    let store = MemoryRecordStore::new();
    let auth = AuthContext::bearer("token");
    let draft = NewsDraft {
        featured_image: Some(
            "https://demo.supabase.co/storage/v1/object/public/images/news/1-a.png".into(),
        ),
        ..news("Opening", 3, true)
    };

    let id = news_db_operations::create_news(&store, &draft, &auth).await.unwrap();
    let raw = store.raw_row(Collection::News, &id).unwrap();
    assert_eq!(raw["featured_image"], json!(draft.featured_image.clone().unwrap()));
    assert_eq!(raw["created_by"], json!("admin-1"));
    assert!(!raw.contains_key("featuredImage"));

    let item =
        news_db_operations::read_news_item(&store, &id, false, &auth).await.unwrap().unwrap();
    assert_eq!(item.id, id);
    assert_eq!(item.featured_image, draft.featured_image);
    assert_eq!(item.created_by, "admin-1");
    assert_eq!(item.date, draft.date.unwrap());
}

#[actix_web::test]
async fn published_filter_and_newest_first_ordering() {
    let store = MemoryRecordStore::new();
    let auth = AuthContext::anonymous();
    for draft in [news("Old", 1, true), news("Draft", 9, false), news("New", 5, true)] {
        news_db_operations::create_news(&store, &draft, &auth).await.unwrap();
    }

    let public: Vec<String> = news_db_operations::read_news(&store, true, &auth)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(public, vec!["New", "Old"]);

    let all: Vec<String> = news_db_operations::read_news(&store, false, &auth)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(all, vec!["Draft", "New", "Old"]);
}

#[actix_web::test]
async fn missing_date_is_stamped_and_drafts_default_unpublished() {
    let store = MemoryRecordStore::new();
    let auth = AuthContext::anonymous();
    let before = Utc::now();
    let draft = NewsDraft { title: "Now".into(), content: "c".into(), ..Default::default() };
    let id = news_db_operations::create_news(&store, &draft, &auth).await.unwrap();

    let item =
        news_db_operations::read_news_item(&store, &id, false, &auth).await.unwrap().unwrap();
    assert!(!item.published);
    assert!(item.date >= before);
    assert!(news_db_operations::read_news_item(&store, &id, true, &auth).await.unwrap().is_none());
}

#[actix_web::test]
async fn deleted_records_disappear_from_lists() {
    let store = MemoryRecordStore::new();
    let auth = AuthContext::anonymous();
    let keep = collaborators_db_operations::create_collaborator(
        &store,
        &CollaboratorDraft { name: "Keep".into(), description: "d".into(), ..Default::default() },
        &auth,
    )
    .await
    .unwrap();
    let gone = collaborators_db_operations::create_collaborator(
        &store,
        &CollaboratorDraft {
            name: "Gone".into(),
            description: "d".into(),
            featured: true,
            ..Default::default()
        },
        &auth,
    )
    .await
    .unwrap();

    collaborators_db_operations::delete_collaborator(&store, &gone, &auth).await.unwrap();
    let remaining = collaborators_db_operations::read_collaborators(&store, &auth).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);

    // Deleting again is not an error.
    collaborators_db_operations::delete_collaborator(&store, &gone, &auth).await.unwrap();
}

#[actix_web::test]
async fn resources_filter_by_category_and_clear_links() {
    let store = MemoryRecordStore::new();
    let auth = AuthContext::anonymous();
    let guide = resources_db_operations::create_resource(
        &store,
        &ResourceDraft {
            title: "Guide".into(),
            description: "d".into(),
            category: "Training".into(),
            external_url: Some("https://learn.example.org".into()),
            ..Default::default()
        },
        &auth,
    )
    .await
    .unwrap();
    resources_db_operations::create_resource(
        &store,
        &ResourceDraft {
            title: "Plan".into(),
            description: "d".into(),
            category: "Framework".into(),
            ..Default::default()
        },
        &auth,
    )
    .await
    .unwrap();

    let training =
        resources_db_operations::read_resources(&store, Some("Training"), &auth).await.unwrap();
    assert_eq!(training.len(), 1);
    assert_eq!(training[0].id, guide);

    let patch = ResourcePatch { external_url: Some(None), ..Default::default() };
    resources_db_operations::update_resource(&store, &guide, &patch, &auth).await.unwrap();
    let updated =
        resources_db_operations::read_resource(&store, &guide, &auth).await.unwrap().unwrap();
    assert_eq!(updated.external_url, None);
    assert_eq!(updated.title, "Guide");
}

#[actix_web::test]
async fn backend_errors_propagate_and_empty_patches_skip_the_call() {
    let store = MemoryRecordStore::new();
    let auth = AuthContext::anonymous();
    store.set_failure(Some("JWT expired"));

    let err = news_db_operations::read_news(&store, true, &auth).await.unwrap_err();
    assert!(matches!(err, DbError::Backend { .. }));
    assert!(err.to_string().contains("JWT expired"));

    news_db_operations::update_news(&store, "any", &NewsPatch::default(), &auth).await.unwrap();
}

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{backends, delete, file, get, multipart_request, Part, ADMIN_EMAIL};
use serde_json::Value;
use sitebase_backend::models::manager_panel::SubmitTarget;
use sitebase_backend::models::Collection;

fn ids(records: &Value) -> Vec<String> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn manager_routes_require_a_session() {
    let backends = backends();
    let app = init_app!(backends.state.clone());

    let resp = test::call_service(&app, get("/admin/news").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let session_req = get("/admin/session").to_request();
    let session: Value = test::call_and_read_body_json(&app, session_req).await;
    assert_eq!(session["data"], Value::Null);
}

#[actix_web::test]
async fn wrong_password_is_rejected() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let req = test::TestRequest::post()
        .uri("/admin/login")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("email=editor%40example.org&password=nope")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], Value::Bool(false));
}

#[actix_web::test]
async fn publishing_toggles_public_visibility() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/news",
        &cookie,
        &[
            Part::Text("title", "Harvest festival"),
            Part::Text("content", "Join us.\n\nBring friends."),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    assert_eq!(created["success"], Value::Bool(true));
    assert_eq!(created["data"]["panel"]["state"], "browsing");
    let news = &created["data"]["records"];
    let id = ids(news).remove(0);
    assert_eq!(news[0]["published"], Value::Bool(false));
    assert_eq!(news[0]["author"], ADMIN_EMAIL);

    let public: Value = test::call_and_read_body_json(&app, get("/api/news").to_request()).await;
    assert!(public.as_array().unwrap().is_empty());

    let toggle = || {
        test::TestRequest::post()
            .uri(&format!("/admin/news/{}/publish", id))
            .cookie(cookie.clone())
            .to_request()
    };
    let published: Value = test::call_and_read_body_json(&app, toggle()).await;
    assert_eq!(published["data"]["records"][0]["published"], Value::Bool(true));

    let public: Value = test::call_and_read_body_json(&app, get("/api/news").to_request()).await;
    assert_eq!(ids(&public), vec![id.clone()]);
    assert_eq!(public[0]["excerpt"], "Join us.");

    let detail_uri = format!("/api/news/{}", id);
    let detail: Value = test::call_and_read_body_json(&app, get(&detail_uri).to_request()).await;
    assert_eq!(detail["paragraphs"], serde_json::json!(["Join us.", "Bring friends."]));

    test::call_service(&app, toggle()).await;
    let public: Value = test::call_and_read_body_json(&app, get("/api/news").to_request()).await;
    assert!(public.as_array().unwrap().is_empty());

    let hidden = test::call_service(&app, get(&detail_uri).to_request()).await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn resource_without_file_has_no_actions_and_deletes_cleanly() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/resources",
        &cookie,
        &[
            Part::Text("title", "Cooperative handbook"),
            Part::Text("description", "How we work."),
            Part::Text("category", "Community"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let id = ids(&created["data"]["records"]).remove(0);

    let detail_uri = format!("/api/resources/{}", id);
    let detail: Value = test::call_and_read_body_json(&app, get(&detail_uri).to_request()).await;
    assert_eq!(detail["fileUrl"], Value::Null);
    assert_eq!(detail["externalUrl"], Value::Null);
    assert_eq!(detail["accent"], "sky");
    assert!(detail["actions"].as_array().unwrap().is_empty());

    let removal = delete(&format!("/admin/resources/{}", id), &cookie).to_request();
    let after: Value = test::call_and_read_body_json(&app, removal).await;
    assert!(after["data"]["records"].as_array().unwrap().is_empty());
    assert!(backends.blobs.calls().is_empty());
    assert!(backends.records.is_empty(Collection::Resources));
}

#[actix_web::test]
async fn titles_and_categories_keep_ampersands_and_angle_brackets() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/resources",
        &cookie,
        &[
            Part::Text("title", "R&D <b>Day</b>: yield < 5%"),
            Part::Text("description", "Field notes."),
            Part::Text("category", "Food & Farming"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let id = ids(&created["data"]["records"]).remove(0);

    let raw = backends.records.raw_row(Collection::Resources, &id).unwrap();
    assert_eq!(raw["title"], "R&D Day: yield < 5%");
    assert_eq!(raw["category"], "Food & Farming");

    let uri = "/api/resources?category=Food%20%26%20Farming";
    let filtered: Value = test::call_and_read_body_json(&app, get(uri).to_request()).await;
    assert_eq!(ids(&filtered), vec![id]);
    assert_eq!(filtered[0]["title"], "R&D Day: yield < 5%");

    let categories: Value =
        test::call_and_read_body_json(&app, get("/api/resources/categories").to_request()).await;
    assert_eq!(categories[1]["name"], "Food & Farming");
}

#[actix_web::test]
async fn replacing_a_resource_file_removes_the_old_upload() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/resources",
        &cookie,
        &[
            Part::Text("title", "Seed plan"),
            Part::Text("description", "Yearly plan."),
            Part::Text("category", "Agricultural"),
            file("file", "plan v1.pdf", "application/pdf", b"one"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let record = &created["data"]["records"][0];
    let id = record["id"].as_str().unwrap().to_string();
    let old_url = record["fileUrl"].as_str().unwrap().to_string();
    assert!(old_url.contains("/images/resources/"));
    assert!(old_url.ends_with("-plan_v1.pdf"));

    let edit = get(&format!("/admin/resources/{}/edit", id)).cookie(cookie.clone()).to_request();
    let editing: Value = test::call_and_read_body_json(&app, edit).await;
    assert_eq!(editing["data"]["title"], "Seed plan");

    let update = multipart_request(
        &format!("/admin/resources/{}", id),
        &cookie,
        &[
            Part::Text("title", "Seed plan"),
            Part::Text("description", "Yearly plan, revised."),
            Part::Text("category", "Agricultural"),
            file("file", "plan v2.pdf", "application/pdf", b"two"),
        ],
    );
    let updated: Value = test::call_and_read_body_json(&app, update.to_request()).await;
    assert_eq!(updated["data"]["panel"]["state"], "browsing");
    let new_url = updated["data"]["records"][0]["fileUrl"].as_str().unwrap().to_string();

    assert_ne!(new_url, old_url);
    assert!(backends.blobs.resolve(&old_url).is_none());
    assert_eq!(backends.blobs.resolve(&new_url).unwrap().bytes, b"two".to_vec());
}

#[actix_web::test]
async fn updates_rewrite_dates_and_clear_unticked_checkboxes() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/news",
        &cookie,
        &[
            Part::Text("title", "Field day"),
            Part::Text("content", "Come along."),
            Part::Text("date", "2024-01-01"),
            Part::Text("published", "on"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let news_id = ids(&created["data"]["records"]).remove(0);
    assert_eq!(created["data"]["records"][0]["date"], "2024-01-01T00:00:00Z");

    let update = multipart_request(
        &format!("/admin/news/{}", news_id),
        &cookie,
        &[
            Part::Text("title", "Field day"),
            Part::Text("content", "Come along."),
            Part::Text("date", "2024-06-01"),
        ],
    );
    let updated: Value = test::call_and_read_body_json(&app, update.to_request()).await;
    let item = &updated["data"]["records"][0];
    assert_eq!(item["date"], "2024-06-01T00:00:00Z");
    assert_eq!(item["published"], Value::Bool(false));

    let create = multipart_request(
        "/admin/resources",
        &cookie,
        &[
            Part::Text("title", "Guide"),
            Part::Text("description", "d"),
            Part::Text("category", "Training"),
            Part::Text("date", "2023-03-03"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let resource_id = ids(&created["data"]["records"]).remove(0);
    let update = multipart_request(
        &format!("/admin/resources/{}", resource_id),
        &cookie,
        &[
            Part::Text("title", "Guide"),
            Part::Text("description", "d"),
            Part::Text("category", "Training"),
            Part::Text("date", "2023-04-04T09:30:00Z"),
        ],
    );
    let updated: Value = test::call_and_read_body_json(&app, update.to_request()).await;
    assert_eq!(updated["data"]["records"][0]["date"], "2023-04-04T09:30:00Z");

    let create = multipart_request(
        "/admin/collaborators",
        &cookie,
        &[
            Part::Text("name", "Solar Coop"),
            Part::Text("description", "Partner."),
            Part::Text("featured", "on"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let collaborator_id = ids(&created["data"]["records"]).remove(0);
    assert_eq!(created["data"]["records"][0]["featured"], Value::Bool(true));

    let update = multipart_request(
        &format!("/admin/collaborators/{}", collaborator_id),
        &cookie,
        &[Part::Text("name", "Solar Coop"), Part::Text("description", "Partner.")],
    );
    let updated: Value = test::call_and_read_body_json(&app, update.to_request()).await;
    assert_eq!(updated["data"]["records"][0]["featured"], Value::Bool(false));

    let view: Value =
        test::call_and_read_body_json(&app, get("/api/collaborators").to_request()).await;
    assert!(view["featured"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn collaborator_logos_upload_replace_and_clean_up() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/collaborators",
        &cookie,
        &[
            Part::Text("name", "Water Trust"),
            Part::Text("description", "Partner."),
            Part::Text("logoUrl", ""),
            file("logo", "trust logo.png", "image/png", b"v1"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let record = &created["data"]["records"][0];
    let id = record["id"].as_str().unwrap().to_string();
    let first_logo = record["logoUrl"].as_str().unwrap().to_string();
    assert!(first_logo.contains("/images/collaborators/"));
    assert!(first_logo.ends_with("-trust_logo.png"));
    assert!(backends.blobs.resolve(&first_logo).is_some());

    let update_uri = format!("/admin/collaborators/{}", id);
    let update = multipart_request(
        &update_uri,
        &cookie,
        &[
            Part::Text("name", "Water Trust"),
            Part::Text("description", "Partner."),
            Part::Text("logoUrl", &first_logo),
            file("logo", "trust logo.jpg", "image/jpeg", b"v2"),
        ],
    );
    let updated: Value = test::call_and_read_body_json(&app, update.to_request()).await;
    let second_logo = updated["data"]["records"][0]["logoUrl"].as_str().unwrap().to_string();
    assert_ne!(second_logo, first_logo);
    assert!(backends.blobs.resolve(&first_logo).is_none());
    assert_eq!(backends.blobs.resolve(&second_logo).unwrap().bytes, b"v2".to_vec());

    let update = multipart_request(
        &update_uri,
        &cookie,
        &[
            Part::Text("name", "Water Trust"),
            Part::Text("description", "Partner."),
            Part::Text("logoUrl", "https://cdn.partner.org/trust.png"),
        ],
    );
    let updated: Value = test::call_and_read_body_json(&app, update.to_request()).await;
    assert_eq!(updated["data"]["records"][0]["logoUrl"], "https://cdn.partner.org/trust.png");
    assert!(backends.blobs.resolve(&second_logo).is_none());
    assert!(backends.blobs.paths().is_empty());

    let gif = multipart_request(
        &update_uri,
        &cookie,
        &[
            Part::Text("name", "Water Trust"),
            Part::Text("description", "Partner."),
            file("logo", "trust.gif", "image/gif", b"gif"),
        ],
    );
    let calls_before = backends.blobs.calls().len();
    let resp = test::call_service(&app, gif.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("PNG or JPG"));
    assert_eq!(backends.blobs.calls().len(), calls_before);
}

#[actix_web::test]
async fn deleting_news_removes_its_uploaded_image() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/news",
        &cookie,
        &[
            Part::Text("title", "New greenhouse"),
            Part::Text("content", "Built."),
            file("image", "green house.jpg", "image/jpeg", b"jpg"),
        ],
    );
    let created: Value = test::call_and_read_body_json(&app, create.to_request()).await;
    let record = &created["data"]["records"][0];
    let id = record["id"].as_str().unwrap().to_string();
    let image = record["featuredImage"].as_str().unwrap().to_string();
    assert!(image.contains("/images/news/"));
    assert!(backends.blobs.resolve(&image).is_some());

    let removal = delete(&format!("/admin/news/{}", id), &cookie).to_request();
    let after: Value = test::call_and_read_body_json(&app, removal).await;
    assert!(ids(&after["data"]["records"]).is_empty());
    assert!(backends.blobs.resolve(&image).is_none());
}

#[actix_web::test]
async fn second_submit_while_busy_is_a_conflict() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let session_req = get("/admin/session").cookie(cookie.clone()).to_request();
    let session: Value = test::call_and_read_body_json(&app, session_req).await;
    let admin_id = session["data"]["user_id"].as_str().unwrap().to_string();
    assert_eq!(session["data"]["email"], ADMIN_EMAIL);
    assert!(session["data"].get("access_token").is_none());

    let _in_flight = backends
        .state
        .panels
        .begin_submit(&admin_id, Collection::News, SubmitTarget::Create)
        .unwrap();
    let create = multipart_request(
        "/admin/news",
        &cookie,
        &[Part::Text("title", "t"), Part::Text("content", "c")],
    );
    let resp = test::call_service(&app, create.to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(backends.records.is_empty(Collection::News));
}

#[actix_web::test]
async fn invalid_forms_are_rejected_before_any_backend_call() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    let create = multipart_request(
        "/admin/collaborators",
        &cookie,
        &[Part::Text("name", "Solar Coop"), file("unused", "x.png", "image/png", b"x")],
    );
    let resp = test::call_service(&app, create.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing required fields: description");

    assert!(backends.records.is_empty(Collection::Collaborators));
    assert!(backends.blobs.calls().is_empty());
}

#[actix_web::test]
async fn collaborators_split_featured_and_external_logos_survive_delete() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    let cookie = login!(&app);

    for (name, featured) in [("Solar Coop", "on"), ("Water Trust", "")] {
        let create = multipart_request(
            "/admin/collaborators",
            &cookie,
            &[
                Part::Text("name", name),
                Part::Text("description", "Partner."),
                Part::Text("logoUrl", "https://cdn.partner.org/logo.png"),
                Part::Text("featured", featured),
            ],
        );
        let resp = test::call_service(&app, create.to_request()).await;
        assert!(resp.status().is_success());
    }

    let view: Value =
        test::call_and_read_body_json(&app, get("/api/collaborators").to_request()).await;
    assert_eq!(view["all"].as_array().unwrap().len(), 2);
    assert_eq!(view["featured"].as_array().unwrap().len(), 1);
    assert_eq!(view["featured"][0]["name"], "Solar Coop");

    let id = view["featured"][0]["id"].as_str().unwrap().to_string();
    let removal = delete(&format!("/admin/collaborators/{}", id), &cookie).to_request();
    let after: Value = test::call_and_read_body_json(&app, removal).await;
    assert_eq!(after["data"]["records"].as_array().unwrap().len(), 1);
    assert!(backends.blobs.calls().is_empty());
}

#[actix_web::test]
async fn public_listings_degrade_to_empty_on_backend_failure() {
    let backends = backends();
    let app = init_app!(backends.state.clone());
    backends.records.set_failure(Some("service unavailable"));

    for uri in ["/api/news", "/api/resources", "/api/resources?category=Training"] {
        let resp = test::call_service(&app, get(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body.as_array().unwrap().is_empty(), "{} should be empty", uri);
    }

    let view: Value =
        test::call_and_read_body_json(&app, get("/api/collaborators").to_request()).await;
    assert!(view["all"].as_array().unwrap().is_empty());

    let categories: Value =
        test::call_and_read_body_json(&app, get("/api/resources/categories").to_request()).await;
    assert_eq!(categories[0]["name"], "All");
    assert_eq!(categories[0]["count"], 0);
}

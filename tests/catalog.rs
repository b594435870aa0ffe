//! Categories, users and compilations over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestApp, error_reason, id};

fn ids(list: &Value) -> Vec<i64> {
    list.as_array().unwrap().iter().map(id).collect()
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let used = app.category("Concerts").await;
    let unused = app.category("Lectures").await;
    app.event(owner, used, 0, true).await;

    let (status, body) = app.delete(&format!("/admin/categories/{used}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "integrity constraint");

    let (status, body) = app.delete(&format!("/admin/categories/{unused}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.get(&format!("/categories/{unused}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/admin/categories/{unused}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_names_are_unique_and_non_blank() {
    let app = TestApp::new();
    let concerts = app.category("Concerts").await;
    let lectures = app.category("Lectures").await;

    let (status, _) = app.post("/admin/categories", json!({ "name": "Concerts" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.post("/admin/categories", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch(&format!("/admin/categories/{lectures}"), json!({ "name": "Concerts" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, body) = app
        .patch(&format!("/admin/categories/{lectures}"), json!({ "name": "Talks" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": lectures, "name": "Talks" }));

    let (_, list) = app.get("/categories?from=0&size=1").await;
    assert_eq!(ids(&list), vec![concerts]);
    let (_, list) = app.get("/categories?from=1&size=1").await;
    assert_eq!(ids(&list), vec![lectures]);
    let (status, _) = app.get("/categories?size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_are_listed_by_id_and_deleted_once() {
    let app = TestApp::new();
    let anna = app.user("Anna").await;
    let boris = app.user("Boris").await;
    let clara = app.user("Clara").await;

    let (_, list) = app.get(&format!("/admin/users?ids={clara},{anna}")).await;
    assert_eq!(ids(&list), vec![anna, clara]);
    let (_, list) = app.get("/admin/users").await;
    assert_eq!(ids(&list), vec![anna, boris, clara]);

    let (status, _) = app
        .post("/admin/users", json!({ "name": "Anna Two", "email": "anna@example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app
        .post("/admin/users", json!({ "name": "Dora", "email": "not-an-email" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&format!("/admin/users/{boris}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/admin/users/{boris}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.published_event(clara, 0, true).await;
    let (status, body) = app.delete(&format!("/admin/users/{clara}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "integrity constraint");
}

#[tokio::test]
async fn compilation_lifecycle() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let first = app.published_event(owner, 0, true).await;
    let second = app.published_event(owner, 0, true).await;

    let (status, body) = app
        .post(
            "/admin/compilations",
            json!({ "events": [second, first, second], "title": "Summer" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let compilation = id(&body);
    assert_eq!(body["pinned"], false);
    assert_eq!(ids(&body["events"]), vec![first, second]);
    assert_eq!(body["events"][0]["views"], 0);

    let (status, body) = app
        .post("/admin/compilations", json!({ "events": [first, 404], "title": "Broken" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("404"));

    let (status, body) = app
        .patch(
            &format!("/admin/compilations/{compilation}"),
            json!({ "pinned": true, "eventIds": [first] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pinned"], true);
    assert_eq!(body["title"], "Summer");
    assert_eq!(ids(&body["events"]), vec![first]);

    let (_, pinned) = app.get("/compilations?pinned=true").await;
    assert_eq!(ids(&pinned), vec![compilation]);
    let (_, unpinned) = app.get("/compilations?pinned=false").await;
    assert_eq!(unpinned, json!([]));

    let (status, _) = app.delete(&format!("/admin/compilations/{compilation}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/compilations/{compilation}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_is_served_by_both_routers() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.stats_get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

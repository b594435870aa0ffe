//! Participation requests over HTTP: admission, moderation and capacity.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestApp, error_reason, id};

fn ids(list: &Value) -> Vec<i64> {
    list.as_array().unwrap().iter().map(id).collect()
}

async fn confirmed_count(app: &TestApp, owner: i64, event: i64) -> i64 {
    let (_, body) = app.get(&format!("/users/{owner}/events/{event}")).await;
    body["confirmedRequests"].as_i64().unwrap()
}

#[tokio::test]
async fn unmoderated_unlimited_event_confirms_without_counting() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let guest = app.user("Gleb").await;
    let event = app.published_event(owner, 0, false).await;

    let (status, body) = app.join(guest, event).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "CONFIRMED");
    assert_eq!(body["event"], event);
    assert_eq!(body["requester"], guest);
    assert_eq!(body["created"], common::NOW);

    assert_eq!(confirmed_count(&app, owner, event).await, 0);
}

#[tokio::test]
async fn limiting_an_unlimited_event_counts_its_confirmed_participants() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let event = app.published_event(owner, 0, false).await;
    for name in ["Anna", "Boris", "Clara"] {
        let user = app.user(name).await;
        let (status, body) = app.join(user, event).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["status"], "CONFIRMED");
    }
    assert_eq!(confirmed_count(&app, owner, event).await, 0);

    let (status, body) = app
        .patch(&format!("/admin/events/{event}"), json!({"participantLimit": 2}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(error_reason(&body), "validation");
    assert_eq!(confirmed_count(&app, owner, event).await, 0);

    let (status, body) = app
        .patch(&format!("/admin/events/{event}"), json!({"participantLimit": 3}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["participantLimit"], 3);
    assert_eq!(body["confirmedRequests"], 3);

    let late = app.user("Dmitri").await;
    let (status, body) = app.join(late, event).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "participation forbidden");
}

#[tokio::test]
async fn admission_rules_reject_with_participation_forbidden() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let guest = app.user("Gleb").await;
    let late = app.user("Lena").await;
    let category = app.category("Concerts").await;
    let draft = app.event(owner, category, 0, true).await;
    let event = app.published_event(owner, 1, false).await;

    let (status, body) = app.join(guest, draft).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "participation forbidden");

    let (status, _) = app.join(owner, event).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.join(guest, event).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.join(guest, event).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.join(late, event).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(confirmed_count(&app, owner, event).await, 1);

    let (status, body) = app.post_empty(&format!("/users/{guest}/requests")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(&body), "request malformed");

    let (status, _) = app.join(guest, 999).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_confirm_stops_at_the_limit_and_rejects_the_rest() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let event = app.published_event(owner, 2, true).await;
    let mut requests = Vec::new();
    for name in ["Anna", "Boris", "Clara"] {
        let user = app.user(name).await;
        let (status, body) = app.join(user, event).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "PENDING");
        requests.push(id(&body));
    }

    let (status, body) = app
        .patch(
            &format!("/users/{owner}/events/{event}/requests"),
            json!({ "requestIds": requests, "status": "CONFIRMED" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(ids(&body["confirmedRequests"]), requests[..2].to_vec());
    assert_eq!(ids(&body["rejectedRequests"]), requests[2..].to_vec());
    assert_eq!(confirmed_count(&app, owner, event).await, 2);

    let (_, listed) = app
        .get(&format!("/users/{owner}/events/{event}/requests"))
        .await;
    let statuses: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["CONFIRMED", "CONFIRMED", "REJECTED"]);
}

#[tokio::test]
async fn concurrent_bulk_confirms_never_exceed_the_limit() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let event = app.published_event(owner, 2, true).await;
    let mut requests = Vec::new();
    for name in ["Anna", "Boris", "Clara"] {
        let user = app.user(name).await;
        let (_, body) = app.join(user, event).await;
        requests.push(id(&body));
    }

    let uri = format!("/users/{owner}/events/{event}/requests");
    let body = json!({ "requestIds": requests, "status": "CONFIRMED" });
    let ((first, _), (second, _)) = tokio::join!(
        app.patch(&uri, body.clone()),
        app.patch(&uri, body.clone())
    );

    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(confirmed_count(&app, owner, event).await, 2);
}

#[tokio::test]
async fn failed_batch_changes_nothing() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let event = app.published_event(owner, 5, true).await;
    let anna = app.user("Anna").await;
    let boris = app.user("Boris").await;
    let (_, first) = app.join(anna, event).await;
    let (_, second) = app.join(boris, event).await;
    let (first, second) = (id(&first), id(&second));

    let uri = format!("/users/{owner}/events/{event}/requests");
    let (status, _) = app
        .patch(&uri, json!({ "requestIds": [second], "status": "REJECTED" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .patch(&uri, json!({ "requestIds": [first, second], "status": "CONFIRMED" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "validation");

    let (_, listed) = app.get(&uri).await;
    assert_eq!(listed[0]["status"], "PENDING");
    assert_eq!(confirmed_count(&app, owner, event).await, 0);

    let (status, _) = app
        .patch(&uri, json!({ "requestIds": [first, 999], "status": "CONFIRMED" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(confirmed_count(&app, owner, event).await, 0);
}

#[tokio::test]
async fn bulk_update_requires_moderation_and_ownership() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let guest = app.user("Gleb").await;
    let open = app.published_event(owner, 0, true).await;
    let (_, request) = app.join(guest, open).await;

    let (status, body) = app
        .patch(
            &format!("/users/{owner}/events/{open}/requests"),
            json!({ "requestIds": [id(&request)], "status": "CONFIRMED" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "validation");

    let (status, _) = app
        .get(&format!("/users/{guest}/events/{open}/requests"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn canceling_a_confirmed_request_frees_its_slot() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let guest = app.user("Gleb").await;
    let other = app.user("Lena").await;
    let event = app.published_event(owner, 1, false).await;

    let (_, request) = app.join(guest, event).await;
    let request = id(&request);
    assert_eq!(confirmed_count(&app, owner, event).await, 1);

    let (status, _) = app
        .patch_empty(&format!("/users/{other}/requests/{request}/cancel"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .patch_empty(&format!("/users/{guest}/requests/{request}/cancel"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELED");
    assert_eq!(confirmed_count(&app, owner, event).await, 0);

    let (status, _) = app.join(other, event).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, own) = app.get(&format!("/users/{guest}/requests")).await;
    assert_eq!(ids(&own), vec![request]);
}

//! Comments over HTTP: authoring, moderation and public reads.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestApp, error_reason, id};

fn ids(list: &Value) -> Vec<i64> {
    list.as_array().unwrap().iter().map(id).collect()
}

#[tokio::test]
async fn only_published_events_take_comments() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let reader = app.user("Rita").await;
    let category = app.category("Concerts").await;
    let draft = app.event(owner, category, 0, true).await;

    let (status, body) = app
        .post(
            &format!("/users/{reader}/comments/{draft}"),
            json!({ "text": "Looking forward to it" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "state conflict");

    let (status, _) = app
        .post(&format!("/users/{reader}/comments/999"), json!({ "text": "Hello there" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moderation_controls_public_visibility() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let reader = app.user("Rita").await;
    let event = app.published_event(owner, 0, true).await;

    let (status, body) = app
        .post(
            &format!("/users/{reader}/comments/{event}"),
            json!({ "text": "Looking forward to it" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let comment = id(&body);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["commentator"]["id"], reader);
    assert_eq!(body["event"]["id"], event);
    assert_eq!(body["created"], common::NOW);

    let (_, public) = app.get(&format!("/comments/{event}")).await;
    assert_eq!(public, json!([]));

    let (status, body) = app
        .patch(
            &format!("/admin/comments/{comment}"),
            json!({ "status": "PUBLISHED" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PUBLISHED");

    let (_, public) = app.get(&format!("/comments/{event}")).await;
    assert_eq!(ids(&public), vec![comment]);

    let (status, _) = app
        .patch(
            &format!("/admin/comments/{comment}"),
            json!({ "status": "CANCELED" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .patch(
            &format!("/users/{reader}/comments/{comment}"),
            json!({ "text": "Changed my mind" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn editing_a_declined_comment_resubmits_it() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let reader = app.user("Rita").await;
    let stranger = app.user("Sam").await;
    let event = app.published_event(owner, 0, true).await;
    let (_, body) = app
        .post(
            &format!("/users/{reader}/comments/{event}"),
            json!({ "text": "Rude words here" }),
        )
        .await;
    let comment = id(&body);
    app.patch(
        &format!("/admin/comments/{comment}"),
        json!({ "status": "CANCELED" }),
    )
    .await;

    let (status, _) = app
        .patch(
            &format!("/users/{stranger}/comments/{comment}"),
            json!({ "text": "Hijacked text" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .patch(
            &format!("/users/{reader}/comments/{comment}"),
            json!({ "text": "Polite words now" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["text"], "Polite words now");

    let (status, body) = app
        .get(&format!("/users/{reader}/comments/{comment}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Polite words now");
    let (status, _) = app
        .get(&format!("/users/{stranger}/comments/{comment}"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .patch(
            &format!("/users/{reader}/comments/{comment}"),
            json!({ "text": "tiny" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_search_and_delete() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let rita = app.user("Rita").await;
    let sam = app.user("Sam").await;
    let event = app.published_event(owner, 0, true).await;

    let mut comments = Vec::new();
    for (user, text) in [(rita, "Great line-up"), (sam, "Too expensive"), (rita, "See you there")] {
        let (_, body) = app
            .post(&format!("/users/{user}/comments/{event}"), json!({ "text": text }))
            .await;
        comments.push(id(&body));
    }
    app.patch(
        &format!("/admin/comments/{}", comments[1]),
        json!({ "status": "PUBLISHED" }),
    )
    .await;

    let (_, found) = app.get(&format!("/admin/comments?commentatorIds={rita}")).await;
    assert_eq!(ids(&found), vec![comments[0], comments[2]]);
    let (_, found) = app.get("/admin/comments?text=EXPENSIVE").await;
    assert_eq!(ids(&found), vec![comments[1]]);
    let (_, found) = app.get("/admin/comments?status=PENDING").await;
    assert_eq!(ids(&found), vec![comments[0], comments[2]]);
    let (_, found) = app
        .get(&format!("/admin/comments?eventIds={event}&commentIds={},{}", comments[2], comments[1]))
        .await;
    assert_eq!(ids(&found), vec![comments[1], comments[2]]);

    let (status, body) = app
        .get("/admin/comments?rangeStart=2024-07-01%2000:00:00&rangeEnd=2024-06-01%2000:00:00")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(&body), "bad date/time");

    let (_, own) = app.get(&format!("/users/{rita}/comments")).await;
    assert_eq!(ids(&own), vec![comments[0], comments[2]]);

    let (status, _) = app.delete(&format!("/admin/comments/{}", comments[0])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/admin/comments/{}", comments[0])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

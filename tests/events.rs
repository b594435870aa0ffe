//! Event lifecycle over HTTP: creation, moderation and public reads.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{EVENT_DATE, TestApp, error_reason, event_body, id};

#[tokio::test]
async fn event_date_needs_two_hours_of_lead_time() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;

    let (status, body) = app
        .post(
            &format!("/users/{owner}/events"),
            event_body(category, "2024-06-01 11:30:00", 0, true),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(&body), "bad date/time");
    assert_eq!(body["status"], "BAD_REQUEST");

    let (status, body) = app
        .post(
            &format!("/users/{owner}/events"),
            event_body(category, "2024-06-01 12:30:00", 0, true),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["state"], "PENDING");
}

#[tokio::test]
async fn created_event_reads_back_for_its_owner() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;
    let event = app.event(owner, category, 10, true).await;

    let (status, body) = app.get(&format!("/users/{owner}/events/{event}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "PENDING");
    assert_eq!(body["confirmedRequests"], 0);
    assert_eq!(body["eventDate"], EVENT_DATE);
    assert_eq!(body["createdOn"], common::NOW);
    assert!(body["publishedOn"].is_null());
    assert_eq!(body["initiator"]["id"], owner);
    assert_eq!(body["category"]["id"], category);

    let (status, list) = app.get(&format!("/users/{owner}/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn coordinates_are_stored_without_range_checks() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;
    let mut body = event_body(category, EVENT_DATE, 0, true);
    body["location"] = json!({ "lat": 123.5, "lon": -200.0 });

    let (status, created) = app.post(&format!("/users/{owner}/events"), body).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["location"]["lat"], 123.5);
    assert_eq!(created["location"]["lon"], -200.0);
}

#[tokio::test]
async fn foreign_event_is_unauthorized_for_owner_routes() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let stranger = app.user("Sam").await;
    let category = app.category("Concerts").await;
    let event = app.event(owner, category, 0, true).await;

    let (status, body) = app.get(&format!("/users/{stranger}/events/{event}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_reason(&body), "not authorized");

    let (status, list) = app.get(&format!("/users/{stranger}/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn publish_then_read_publicly() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;
    let event = app.event(owner, category, 0, true).await;

    let (status, _) = app.get(&format!("/events/{event}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let published = app.publish(event).await;
    assert_eq!(published["state"], "PUBLISHED");
    assert_eq!(published["publishedOn"], common::NOW);
    assert_eq!(published["views"], 0);

    let (status, body) = app.get_from(&format!("/events/{event}"), "10.0.0.1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "PUBLISHED");
    assert_eq!(body["views"], 1);
}

#[tokio::test]
async fn canceled_event_cannot_be_published() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;
    let event = app.event(owner, category, 0, true).await;

    let (status, body) = app
        .patch(
            &format!("/users/{owner}/events/{event}"),
            json!({ "stateAction": "CANCEL_REVIEW" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "CANCELED");

    let (status, body) = app
        .patch(
            &format!("/admin/events/{event}"),
            json!({ "stateAction": "PUBLISH_EVENT" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_reason(&body), "state conflict");
}

#[tokio::test]
async fn published_event_is_frozen_for_owner_and_cannot_be_rejected() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let event = app.published_event(owner, 0, true).await;

    let (status, _) = app
        .patch(
            &format!("/users/{owner}/events/{event}"),
            json!({ "title": "A brand new title" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .patch(
            &format!("/admin/events/{event}"),
            json!({ "stateAction": "REJECT_EVENT" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn owner_can_resubmit_with_new_fields() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;
    let other = app.category("Lectures").await;
    let event = app.event(owner, category, 0, true).await;

    let (status, body) = app
        .patch(
            &format!("/users/{owner}/events/{event}"),
            json!({
                "category": other,
                "eventDate": "2024-07-01 18:00:00",
                "location": { "lat": 59.93, "lon": 30.31 },
                "stateAction": "SEND_TO_REVIEW"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["category"]["id"], other);
    assert_eq!(body["eventDate"], "2024-07-01 18:00:00");
    assert_eq!(body["location"]["lat"], 59.93);
    assert_eq!(body["state"], "PENDING");

    let (status, body) = app
        .patch(
            &format!("/users/{owner}/events/{event}"),
            json!({ "eventDate": "2024-06-01 10:30:00" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(&body), "bad date/time");
}

#[tokio::test]
async fn admin_search_filters_by_state_and_window() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;
    let pending = app.event(owner, category, 0, true).await;
    let published = app.published_event(owner, 0, true).await;

    let (status, body) = app.get("/admin/events?states=PUBLISHED").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(id).collect();
    assert_eq!(ids, vec![published]);

    let (_, body) = app
        .get(&format!("/admin/events?users={owner}&categories={category}"))
        .await;
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(id).collect();
    assert_eq!(ids, vec![pending]);

    let (status, body) = app
        .get("/admin/events?rangeStart=2024-07-01%2000:00:00&rangeEnd=2024-06-01%2000:00:00")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(&body), "bad date/time");

    let (status, _) = app.get("/admin/events?states=DRAFT").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_search_only_returns_published_events() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;
    app.event(owner, category, 0, true).await;
    let published = app.published_event(owner, 0, true).await;

    let (status, body) = app.get("/events?text=JAZZ&from=0&size=10").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(id).collect();
    assert_eq!(ids, vec![published]);

    let (_, body) = app.get("/events?text=opera").await;
    assert_eq!(body, json!([]));

    let (status, _) = app.get("/events?sort=NEWEST").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_available_skips_full_events() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let guest = app.user("Gleb").await;
    let full = app.published_event(owner, 1, false).await;
    let unlimited = app.published_event(owner, 0, false).await;

    let (status, _) = app.join(guest, full).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/events?onlyAvailable=true").await;
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(id).collect();
    assert_eq!(ids, vec![unlimited]);

    let (_, body) = app.get("/events").await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn views_sort_orders_by_unique_readers() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let quiet = app.published_event(owner, 0, true).await;
    let popular = app.published_event(owner, 0, true).await;

    for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        app.get_from(&format!("/events/{popular}"), ip).await;
    }
    app.get_from(&format!("/events/{quiet}"), "10.0.0.1").await;

    let (status, body) = app.get("/events?sort=VIEWS").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(id(&rows[0]), popular);
    assert_eq!(rows[0]["views"], 3);
    assert_eq!(id(&rows[1]), quiet);
    assert_eq!(rows[1]["views"], 1);

    let (_, body) = app.get("/events?sort=VIEWS&from=1&size=1").await;
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(id).collect();
    assert_eq!(ids, vec![quiet]);
}

#[tokio::test]
async fn invalid_bodies_and_paths_use_the_error_shape() {
    let app = TestApp::new();
    let owner = app.user("Olga").await;
    let category = app.category("Concerts").await;

    let mut body = event_body(category, EVENT_DATE, 0, true);
    body["annotation"] = json!("short");
    let (status, err) = app.post(&format!("/users/{owner}/events"), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(&err), "request malformed");

    let (status, err) = app.get("/events/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_reason(&err), "request malformed");

    let (status, err) = app.get("/events/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_reason(&err), "object not found");
    assert_eq!(err["status"], "NOT_FOUND");
}

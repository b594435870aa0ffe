//! In-process harness: both routers over in-memory stores and a fixed clock.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::NaiveDateTime;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use explore_with_me::api;
use explore_with_me::app_state::{AppState, StatsState};
use explore_with_me::client::InProcessStatsClient;
use explore_with_me::domain::FixedClock;
use explore_with_me::domain::time;
use explore_with_me::persistence::{HitStore, MemoryHitStore, MemoryStore, Store};

/// Start of every test: `2024-06-01 10:00:00`.
pub const NOW: &str = "2024-06-01 10:00:00";

/// Comfortably in the future relative to [`NOW`].
pub const EVENT_DATE: &str = "2024-06-10 19:00:00";

/// Both services sharing one hit log.
pub struct TestApp {
    pub main: Router,
    pub stats: Router,
    pub clock: Arc<FixedClock>,
    seq: AtomicUsize,
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(ts(NOW)));
        let hits: Arc<dyn HitStore> = Arc::new(MemoryHitStore::new());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let client = Arc::new(InProcessStatsClient::new(Arc::clone(&hits)));

        let main = api::build_router().with_state(AppState::new(
            store,
            client,
            Arc::clone(&clock) as _,
            "ewm-main-service",
        ));
        let stats = api::build_stats_router().with_state(StatsState::new(hits));
        Self {
            main,
            stats,
            clock,
            seq: AtomicUsize::new(0),
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        ip: Option<&str>,
    ) -> (StatusCode, Value) {
        send(self.main.clone(), method, uri, body, ip).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    pub async fn get_from(&self, uri: &str, ip: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, Some(ip)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body), None).await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::POST, uri, None, None).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, Some(body), None).await
    }

    pub async fn patch_empty(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, None, None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, None, None).await
    }

    pub async fn stats_get(&self, uri: &str) -> (StatusCode, Value) {
        send(self.stats.clone(), Method::GET, uri, None, None).await
    }

    pub async fn stats_post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        send(self.stats.clone(), Method::POST, uri, Some(body), None).await
    }

    // ── Fixtures ──

    pub async fn user(&self, name: &str) -> i64 {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        let (status, body) = self
            .post("/admin/users", json!({ "name": name, "email": email }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id(&body)
    }

    pub async fn category(&self, name: &str) -> i64 {
        let (status, body) = self.post("/admin/categories", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id(&body)
    }

    pub async fn event(&self, owner: i64, category: i64, limit: i64, moderation: bool) -> i64 {
        let (status, body) = self
            .post(
                &format!("/users/{owner}/events"),
                event_body(category, EVENT_DATE, limit, moderation),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id(&body)
    }

    pub async fn publish(&self, event: i64) -> Value {
        let (status, body) = self
            .patch(
                &format!("/admin/events/{event}"),
                json!({ "stateAction": "PUBLISH_EVENT" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    pub async fn published_event(&self, owner: i64, limit: i64, moderation: bool) -> i64 {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let category = self.category(&format!("Category {n}")).await;
        let event = self.event(owner, category, limit, moderation).await;
        self.publish(event).await;
        event
    }

    pub async fn join(&self, user: i64, event: i64) -> (StatusCode, Value) {
        self.post_empty(&format!("/users/{user}/requests?eventId={event}"))
            .await
    }
}

pub fn event_body(category: i64, date: &str, limit: i64, moderation: bool) -> Value {
    json!({
        "annotation": "An evening of live jazz by the river bank",
        "category": category,
        "description": "Three bands, one open-air stage and plenty of improvisation",
        "eventDate": date,
        "location": { "lat": 55.754167, "lon": 37.62 },
        "paid": false,
        "participantLimit": limit,
        "requestModeration": moderation,
        "title": "Jazz on the river"
    })
}

pub fn ts(raw: &str) -> NaiveDateTime {
    time::parse(raw).expect("fixture timestamp")
}

pub fn id(body: &Value) -> i64 {
    body["id"].as_i64().expect("body has an id")
}

/// Asserts the shared error body shape and returns its `reason`.
pub fn error_reason(body: &Value) -> String {
    for key in ["status", "reason", "message", "timestamp"] {
        assert!(body[key].is_string(), "error body lacks {key}: {body}");
    }
    body["reason"].as_str().unwrap_or_default().to_string()
}

async fn send(
    router: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    ip: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ip) = ip {
        builder = builder.header("x-forwarded-for", ip);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

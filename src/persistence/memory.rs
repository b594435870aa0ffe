//! In-memory stores with the same contracts as the Postgres ones.
//!
//! All tables sit behind one [`tokio::sync::RwLock`]. Every
//! read-modify-write holds the write lock from load to commit, which
//! serializes updates the way a row lock does, and mutates a copy that is
//! written back only when the domain closure succeeds.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;

use super::{
    Admission, BatchMutation, CategoryStore, CommentMutation, CommentStore, CompilationStore,
    EventMutation, EventStore, HitStore, LocationStore, RequestMutation, RequestStore, UserStore,
};
use crate::domain::compilation::normalize_ids;
use crate::domain::hit::sort_stats;
use crate::domain::search::{CommentField, CommentOrder, EventField, EventOrder};
use crate::domain::{
    Category, Comment, CommentDraft, CommentStatus, Compilation, CompilationPatch, Coordinates,
    EndpointHit, Event, EventDraft, EventState, Location, NewCompilation, NewHit, NewUser, Page,
    ParticipationRequest, Predicate, RequestStatus, StatsQuery, User, UserShort, ViewStats,
};
use crate::error::ServiceError;

/// Monotonic id generator starting at 1.
#[derive(Debug, Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

/// An event row with references kept as ids.
#[derive(Debug, Clone)]
struct EventRecord {
    id: i64,
    title: String,
    annotation: String,
    description: String,
    category_id: i64,
    initiator_id: i64,
    location_id: i64,
    event_date: NaiveDateTime,
    created_on: NaiveDateTime,
    published_on: Option<NaiveDateTime>,
    paid: bool,
    participant_limit: i64,
    request_moderation: bool,
    state: EventState,
    confirmed_requests: i64,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            annotation: event.annotation.clone(),
            description: event.description.clone(),
            category_id: event.category.id,
            initiator_id: event.initiator.id,
            location_id: event.location.id,
            event_date: event.event_date,
            created_on: event.created_on,
            published_on: event.published_on,
            paid: event.paid,
            participant_limit: event.participant_limit,
            request_moderation: event.request_moderation,
            state: event.state,
            confirmed_requests: event.confirmed_requests,
        }
    }
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    text: String,
    commentator_id: i64,
    event_id: i64,
    created: NaiveDateTime,
    status: CommentStatus,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    events: BTreeMap<i64, EventRecord>,
    requests: BTreeMap<i64, ParticipationRequest>,
    comments: BTreeMap<i64, CommentRecord>,
    compilations: BTreeMap<i64, Compilation>,
    user_ids: Sequence,
    category_ids: Sequence,
    location_ids: Sequence,
    event_ids: Sequence,
    request_ids: Sequence,
    comment_ids: Sequence,
    compilation_ids: Sequence,
}

impl Tables {
    fn user_short(&self, id: i64) -> Result<UserShort, ServiceError> {
        self.users
            .get(&id)
            .map(UserShort::from)
            .ok_or_else(|| dangling("user", id))
    }

    fn event(&self, record: &EventRecord) -> Result<Event, ServiceError> {
        let category = self
            .categories
            .get(&record.category_id)
            .cloned()
            .ok_or_else(|| dangling("category", record.category_id))?;
        let location = *self
            .locations
            .get(&record.location_id)
            .ok_or_else(|| dangling("location", record.location_id))?;
        Ok(Event {
            id: record.id,
            title: record.title.clone(),
            annotation: record.annotation.clone(),
            description: record.description.clone(),
            category,
            initiator: self.user_short(record.initiator_id)?,
            location,
            event_date: record.event_date,
            created_on: record.created_on,
            published_on: record.published_on,
            paid: record.paid,
            participant_limit: record.participant_limit,
            request_moderation: record.request_moderation,
            state: record.state,
            confirmed_requests: record.confirmed_requests,
            views: 0,
        })
    }

    fn event_by_id(&self, id: i64) -> Result<Event, ServiceError> {
        let record = self
            .events
            .get(&id)
            .ok_or_else(|| ServiceError::not_found("Event", id))?;
        self.event(record)
    }

    fn comment(&self, record: &CommentRecord) -> Result<Comment, ServiceError> {
        Ok(Comment {
            id: record.id,
            text: record.text.clone(),
            commentator: self.user_short(record.commentator_id)?,
            event_id: record.event_id,
            created: record.created,
            status: record.status,
        })
    }

    /// Moves the confirmed counter of a limited event by `delta`, never
    /// below zero. Unlimited events do not track participants.
    fn adjust_confirmed(&mut self, event_id: i64, delta: i64) {
        if let Some(record) = self.events.get_mut(&event_id)
            && record.participant_limit > 0
        {
            record.confirmed_requests = (record.confirmed_requests + delta).max(0);
        }
    }

    fn ensure_events_exist(&self, ids: &[i64]) -> Result<(), ServiceError> {
        match ids.iter().find(|id| !self.events.contains_key(id)) {
            Some(id) => Err(ServiceError::IntegrityViolation(format!(
                "event id={id} does not exist"
            ))),
            None => Ok(()),
        }
    }
}

fn dangling(table: &str, id: i64) -> ServiceError {
    ServiceError::Internal(format!("dangling {table} reference id={id}"))
}

/// In-memory store of the main service.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ── Users ──

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User, ServiceError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(ServiceError::IntegrityViolation(format!(
                "e-mail {} is already registered",
                user.email
            )));
        }
        let id = tables.user_ids.next();
        let stored = User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, ServiceError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, ids: &[i64], page: Page) -> Result<Vec<User>, ServiceError> {
        let tables = self.tables.read().await;
        Ok(page.apply(
            tables
                .users
                .values()
                .filter(|u| ids.is_empty() || ids.contains(&u.id))
                .cloned(),
        ))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, ServiceError> {
        let mut tables = self.tables.write().await;
        let referenced = tables.events.values().any(|e| e.initiator_id == id)
            || tables.requests.values().any(|r| r.requester_id == id)
            || tables.comments.values().any(|c| c.commentator_id == id);
        if referenced && tables.users.contains_key(&id) {
            return Err(ServiceError::IntegrityViolation(format!(
                "user id={id} is still referenced"
            )));
        }
        Ok(tables.users.remove(&id).is_some())
    }
}

// ── Categories ──

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(&self, name: &str) -> Result<Category, ServiceError> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == name) {
            return Err(ServiceError::IntegrityViolation(format!(
                "category name '{name}' is already taken"
            )));
        }
        let id = tables.category_ids.next();
        let category = Category {
            id,
            name: name.to_string(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, ServiceError> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == name && c.id != id) {
            return Err(ServiceError::IntegrityViolation(format!(
                "category name '{name}' is already taken"
            )));
        }
        Ok(tables.categories.get_mut(&id).map(|category| {
            name.clone_into(&mut category.name);
            category.clone()
        }))
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, ServiceError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self, page: Page) -> Result<Vec<Category>, ServiceError> {
        let tables = self.tables.read().await;
        Ok(page.apply(tables.categories.values().cloned()))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, ServiceError> {
        let mut tables = self.tables.write().await;
        if tables.events.values().any(|e| e.category_id == id) {
            return Err(ServiceError::IntegrityViolation(format!(
                "category id={id} is used by events"
            )));
        }
        Ok(tables.categories.remove(&id).is_some())
    }
}

// ── Locations ──

#[async_trait]
impl LocationStore for MemoryStore {
    async fn insert_location(&self, at: Coordinates) -> Result<Location, ServiceError> {
        let mut tables = self.tables.write().await;
        let id = tables.location_ids.next();
        let location = Location {
            id,
            lat: at.lat,
            lon: at.lon,
        };
        tables.locations.insert(id, location);
        Ok(location)
    }

    async fn find_or_insert_location(&self, at: Coordinates) -> Result<Location, ServiceError> {
        {
            let tables = self.tables.read().await;
            if let Some(found) = tables.locations.values().find(|l| l.coordinates() == at) {
                return Ok(*found);
            }
        }
        self.insert_location(at).await
    }
}

// ── Events ──

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, draft: &EventDraft) -> Result<Event, ServiceError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&draft.category_id)
            || !tables.users.contains_key(&draft.initiator_id)
            || !tables.locations.contains_key(&draft.location_id)
        {
            return Err(ServiceError::IntegrityViolation(
                "event references a missing category, user or location".to_string(),
            ));
        }
        let id = tables.event_ids.next();
        let record = EventRecord {
            id,
            title: draft.title.clone(),
            annotation: draft.annotation.clone(),
            description: draft.description.clone(),
            category_id: draft.category_id,
            initiator_id: draft.initiator_id,
            location_id: draft.location_id,
            event_date: draft.event_date,
            created_on: draft.created_on,
            published_on: None,
            paid: draft.paid,
            participant_limit: draft.participant_limit,
            request_moderation: draft.request_moderation,
            state: EventState::Pending,
            confirmed_requests: 0,
        };
        let event = tables.event(&record)?;
        tables.events.insert(id, record);
        Ok(event)
    }

    async fn find_event(&self, id: i64) -> Result<Option<Event>, ServiceError> {
        let tables = self.tables.read().await;
        tables.events.get(&id).map(|r| tables.event(r)).transpose()
    }

    async fn find_events(&self, ids: &[i64]) -> Result<Vec<Event>, ServiceError> {
        let tables = self.tables.read().await;
        tables
            .events
            .values()
            .filter(|r| ids.contains(&r.id))
            .map(|r| tables.event(r))
            .collect()
    }

    async fn list_events(
        &self,
        filter: &Predicate<EventField>,
        order: EventOrder,
        page: Page,
    ) -> Result<Vec<Event>, ServiceError> {
        let tables = self.tables.read().await;
        let mut events = Vec::new();
        for record in tables.events.values() {
            let event = tables.event(record)?;
            if filter.matches(&event) {
                events.push(event);
            }
        }
        order.sort(&mut events);
        Ok(page.apply(events))
    }

    async fn update_event(&self, id: i64, mutation: EventMutation<'_>) -> Result<Event, ServiceError> {
        let mut tables = self.tables.write().await;
        let mut event = tables.event_by_id(id)?;
        let limit = event.participant_limit;
        mutation(&mut event)?;
        if event.participant_limit != limit {
            let confirmed = tables
                .requests
                .values()
                .filter(|r| r.event_id == id && r.status == RequestStatus::Confirmed)
                .count();
            event.recount_confirmed(i64::try_from(confirmed).unwrap_or(i64::MAX))?;
        }
        tables.events.insert(id, EventRecord::from(&event));
        Ok(event)
    }

    async fn count_events_in_category(&self, category_id: i64) -> Result<i64, ServiceError> {
        let tables = self.tables.read().await;
        let count = tables
            .events
            .values()
            .filter(|e| e.category_id == category_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

// ── Requests ──

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create_request(
        &self,
        event_id: i64,
        requester_id: i64,
        created: NaiveDateTime,
        admission: Admission<'_>,
    ) -> Result<ParticipationRequest, ServiceError> {
        let mut tables = self.tables.write().await;
        let event = tables.event_by_id(event_id)?;
        let already_requested = tables
            .requests
            .values()
            .any(|r| r.event_id == event_id && r.requester_id == requester_id);
        let status = admission(&event, already_requested)?;

        let id = tables.request_ids.next();
        let request = ParticipationRequest {
            id,
            event_id,
            requester_id,
            created,
            status,
        };
        tables.requests.insert(id, request.clone());
        if status == RequestStatus::Confirmed {
            tables.adjust_confirmed(event_id, 1);
        }
        Ok(request)
    }

    async fn find_request(&self, id: i64) -> Result<Option<ParticipationRequest>, ServiceError> {
        Ok(self.tables.read().await.requests.get(&id).cloned())
    }

    async fn list_requests_by_requester(
        &self,
        requester_id: i64,
    ) -> Result<Vec<ParticipationRequest>, ServiceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| r.requester_id == requester_id)
            .cloned()
            .collect())
    }

    async fn list_requests_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<ParticipationRequest>, ServiceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn update_request(
        &self,
        id: i64,
        mutation: RequestMutation<'_>,
    ) -> Result<ParticipationRequest, ServiceError> {
        let mut tables = self.tables.write().await;
        let mut request = tables
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Request", id))?;
        let before = request.status;
        mutation(&mut request)?;

        let delta = match (before, request.status) {
            (RequestStatus::Confirmed, RequestStatus::Confirmed) => 0,
            (RequestStatus::Confirmed, _) => -1,
            (_, RequestStatus::Confirmed) => 1,
            _ => 0,
        };
        tables.adjust_confirmed(request.event_id, delta);
        tables.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn update_request_statuses(
        &self,
        event_id: i64,
        request_ids: &[i64],
        mutation: BatchMutation<'_>,
    ) -> Result<Vec<ParticipationRequest>, ServiceError> {
        let mut tables = self.tables.write().await;
        let mut event = tables.event_by_id(event_id)?;
        let mut requests: Vec<ParticipationRequest> = tables
            .requests
            .values()
            .filter(|r| r.event_id == event_id && request_ids.contains(&r.id))
            .cloned()
            .collect();

        mutation(&mut event, &mut requests)?;

        for request in &requests {
            tables.requests.insert(request.id, request.clone());
        }
        tables.events.insert(event_id, EventRecord::from(&event));
        Ok(requests)
    }
}

// ── Comments ──

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, draft: &CommentDraft) -> Result<Comment, ServiceError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&draft.commentator_id)
            || !tables.events.contains_key(&draft.event_id)
        {
            return Err(ServiceError::IntegrityViolation(
                "comment references a missing user or event".to_string(),
            ));
        }
        let id = tables.comment_ids.next();
        let record = CommentRecord {
            id,
            text: draft.text.clone(),
            commentator_id: draft.commentator_id,
            event_id: draft.event_id,
            created: draft.created,
            status: CommentStatus::Pending,
        };
        let comment = tables.comment(&record)?;
        tables.comments.insert(id, record);
        Ok(comment)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, ServiceError> {
        let tables = self.tables.read().await;
        tables.comments.get(&id).map(|r| tables.comment(r)).transpose()
    }

    async fn list_comments(
        &self,
        filter: &Predicate<CommentField>,
        order: CommentOrder,
        page: Page,
    ) -> Result<Vec<Comment>, ServiceError> {
        let tables = self.tables.read().await;
        let mut comments = Vec::new();
        for record in tables.comments.values() {
            let comment = tables.comment(record)?;
            if filter.matches(&comment) {
                comments.push(comment);
            }
        }
        order.sort(&mut comments);
        Ok(page.apply(comments))
    }

    async fn update_comment(
        &self,
        id: i64,
        mutation: CommentMutation<'_>,
    ) -> Result<Comment, ServiceError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .comments
            .get(&id)
            .ok_or_else(|| ServiceError::not_found("Comment", id))?;
        let mut comment = tables.comment(record)?;
        mutation(&mut comment)?;
        if let Some(record) = tables.comments.get_mut(&id) {
            record.text.clone_from(&comment.text);
            record.status = comment.status;
        }
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, ServiceError> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }
}

// ── Compilations ──

#[async_trait]
impl CompilationStore for MemoryStore {
    async fn insert_compilation(&self, new: &NewCompilation) -> Result<Compilation, ServiceError> {
        let mut tables = self.tables.write().await;
        tables.ensure_events_exist(&new.event_ids)?;
        let id = tables.compilation_ids.next();
        let compilation = Compilation {
            id,
            title: new.title.clone(),
            pinned: new.pinned,
            event_ids: normalize_ids(&new.event_ids),
        };
        tables.compilations.insert(id, compilation.clone());
        Ok(compilation)
    }

    async fn find_compilation(&self, id: i64) -> Result<Option<Compilation>, ServiceError> {
        Ok(self.tables.read().await.compilations.get(&id).cloned())
    }

    async fn list_compilations(
        &self,
        pinned: Option<bool>,
        page: Page,
    ) -> Result<Vec<Compilation>, ServiceError> {
        let tables = self.tables.read().await;
        Ok(page.apply(
            tables
                .compilations
                .values()
                .filter(|c| pinned.is_none_or(|p| c.pinned == p))
                .cloned(),
        ))
    }

    async fn update_compilation(
        &self,
        id: i64,
        patch: &CompilationPatch,
    ) -> Result<Option<Compilation>, ServiceError> {
        let mut tables = self.tables.write().await;
        if let Some(ids) = &patch.event_ids {
            tables.ensure_events_exist(ids)?;
        }
        Ok(tables.compilations.get_mut(&id).map(|compilation| {
            if let Some(title) = &patch.title {
                compilation.title.clone_from(title);
            }
            if let Some(pinned) = patch.pinned {
                compilation.pinned = pinned;
            }
            if let Some(ids) = &patch.event_ids {
                compilation.event_ids = normalize_ids(ids);
            }
            compilation.clone()
        }))
    }

    async fn delete_compilation(&self, id: i64) -> Result<bool, ServiceError> {
        Ok(self.tables.write().await.compilations.remove(&id).is_some())
    }
}

// ── Statistics ──

/// In-memory hit log.
#[derive(Debug, Default)]
pub struct MemoryHitStore {
    hits: RwLock<(Sequence, Vec<EndpointHit>)>,
}

impl MemoryHitStore {
    /// Creates an empty hit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HitStore for MemoryHitStore {
    async fn insert_hit(&self, hit: &NewHit) -> Result<EndpointHit, ServiceError> {
        let mut guard = self.hits.write().await;
        let (ids, hits) = &mut *guard;
        let stored = EndpointHit {
            id: ids.next(),
            app: hit.app.clone(),
            uri: hit.uri.clone(),
            ip: hit.ip.clone(),
            timestamp: hit.timestamp,
        };
        hits.push(stored.clone());
        Ok(stored)
    }

    async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError> {
        let guard = self.hits.read().await;
        let mut groups: HashMap<(&str, &str), Vec<&str>> = HashMap::new();
        for hit in guard.1.iter().filter(|h| query.covers(h)) {
            groups
                .entry((hit.app.as_str(), hit.uri.as_str()))
                .or_default()
                .push(hit.ip.as_str());
        }
        let mut stats: Vec<ViewStats> = groups
            .into_iter()
            .map(|((app, uri), mut ips)| {
                if query.unique() {
                    ips.sort_unstable();
                    ips.dedup();
                }
                ViewStats {
                    app: app.to_string(),
                    uri: uri.to_string(),
                    hits: i64::try_from(ips.len()).unwrap_or(i64::MAX),
                }
            })
            .collect();
        sort_stats(&mut stats);
        Ok(stats)
    }
}

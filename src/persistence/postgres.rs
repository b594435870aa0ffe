//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::models::{
    COMMENT_COLUMNS, COMMENT_JOINS, CategoryRow, CommentRow, CompilationRow, EVENT_COLUMNS,
    EVENT_JOINS, EventRow, HitRow, LocationRow, REQUEST_COLUMNS, RequestRow, UserRow, ViewStatsRow,
};
use super::sql::push_predicate;
use super::{
    Admission, BatchMutation, CategoryStore, CommentMutation, CommentStore, CompilationStore,
    EventMutation, EventStore, HitStore, LocationStore, RequestMutation, RequestStore, UserStore,
};
use crate::config::DatabaseConfig;
use crate::domain::search::{CommentField, CommentOrder, EventField, EventOrder};
use crate::domain::{
    Category, Comment, CommentDraft, CommentStatus, Compilation, CompilationPatch, Coordinates,
    EndpointHit, Event, EventDraft, EventState, Location, NewCompilation, NewHit, NewUser, Page,
    ParticipationRequest, Predicate, RequestStatus, StatsQuery, User, ViewStats,
};
use crate::error::ServiceError;

/// Opens a connection pool sized by `config`.
///
/// # Errors
///
/// Returns [`ServiceError::Persistence`] if the database is unreachable.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, ServiceError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// PostgreSQL-backed store of the main service using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the main service migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ServiceError> {
        sqlx::migrate!("./migrations/main").run(&self.pool).await?;
        Ok(())
    }
}

// ── Row helpers ──

async fn fetch_event(
    conn: &mut PgConnection,
    id: i64,
    lock: bool,
) -> Result<Option<Event>, ServiceError> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events e {EVENT_JOINS} WHERE e.id = $1{}",
        if lock { " FOR UPDATE OF e" } else { "" }
    );
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(Event::try_from)
        .transpose()
}

async fn write_event(conn: &mut PgConnection, event: &Event) -> Result<(), ServiceError> {
    sqlx::query(
        "UPDATE events SET title = $1, annotation = $2, description = $3, category_id = $4, \
         location_id = $5, event_date = $6, published_on = $7, paid = $8, participant_limit = $9, \
         request_moderation = $10, state = $11, confirmed_requests = $12 WHERE id = $13",
    )
    .bind(&event.title)
    .bind(&event.annotation)
    .bind(&event.description)
    .bind(event.category.id)
    .bind(event.location.id)
    .bind(event.event_date)
    .bind(event.published_on)
    .bind(event.paid)
    .bind(event.participant_limit)
    .bind(event.request_moderation)
    .bind(event.state.as_str())
    .bind(event.confirmed_requests)
    .bind(event.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Moves the confirmed counter of a limited event by `delta`, never below zero.
/// Unlimited events do not track participants.
async fn adjust_confirmed(
    conn: &mut PgConnection,
    event_id: i64,
    delta: i64,
) -> Result<(), ServiceError> {
    sqlx::query(
        "UPDATE events SET confirmed_requests = GREATEST(confirmed_requests + $1, 0) \
         WHERE id = $2 AND participant_limit > 0",
    )
    .bind(delta)
    .bind(event_id)
    .execute(conn)
    .await?;
    Ok(())
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>, ServiceError> {
    rows.into_iter().map(Event::try_from).collect()
}

fn into_requests(rows: Vec<RequestRow>) -> Result<Vec<ParticipationRequest>, ServiceError> {
    rows.into_iter().map(ParticipationRequest::try_from).collect()
}

fn into_comments(rows: Vec<CommentRow>) -> Result<Vec<Comment>, ServiceError> {
    rows.into_iter().map(Comment::try_from).collect()
}

// ── Users ──

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User, ServiceError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self, ids: &[i64], page: Page) -> Result<Vec<User>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id, name, email FROM users");
        if !ids.is_empty() {
            builder.push(" WHERE id = ANY(").push_bind(ids).push(")");
        }
        builder
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Categories ──

#[async_trait]
impl CategoryStore for PostgresStore {
    async fn insert_category(&self, name: &str) -> Result<Category, ServiceError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn rename_category(&self, id: i64, name: &str) -> Result<Option<Category>, ServiceError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, ServiceError> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Category::from))
    }

    async fn list_categories(&self, page: Page) -> Result<Vec<Category>, ServiceError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name FROM categories ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn delete_category(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Locations ──

#[async_trait]
impl LocationStore for PostgresStore {
    async fn insert_location(&self, at: Coordinates) -> Result<Location, ServiceError> {
        let row = sqlx::query_as::<_, LocationRow>(
            "INSERT INTO locations (lat, lon) VALUES ($1, $2) RETURNING id, lat, lon",
        )
        .bind(at.lat)
        .bind(at.lon)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_or_insert_location(&self, at: Coordinates) -> Result<Location, ServiceError> {
        let existing = sqlx::query_as::<_, LocationRow>(
            "SELECT id, lat, lon FROM locations WHERE lat = $1 AND lon = $2 ORDER BY id LIMIT 1",
        )
        .bind(at.lat)
        .bind(at.lon)
        .fetch_optional(&self.pool)
        .await?;
        match existing {
            Some(row) => Ok(row.into()),
            None => self.insert_location(at).await,
        }
    }
}

// ── Events ──

#[async_trait]
impl EventStore for PostgresStore {
    async fn insert_event(&self, draft: &EventDraft) -> Result<Event, ServiceError> {
        let sql = format!(
            "WITH e AS (INSERT INTO events (title, annotation, description, category_id, \
             initiator_id, location_id, event_date, created_on, paid, participant_limit, \
             request_moderation, state, confirmed_requests) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0) RETURNING *) \
             SELECT {EVENT_COLUMNS} FROM e {EVENT_JOINS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(&draft.title)
            .bind(&draft.annotation)
            .bind(&draft.description)
            .bind(draft.category_id)
            .bind(draft.initiator_id)
            .bind(draft.location_id)
            .bind(draft.event_date)
            .bind(draft.created_on)
            .bind(draft.paid)
            .bind(draft.participant_limit)
            .bind(draft.request_moderation)
            .bind(EventState::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;
        Event::try_from(row)
    }

    async fn find_event(&self, id: i64) -> Result<Option<Event>, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        fetch_event(&mut conn, id, false).await
    }

    async fn find_events(&self, ids: &[i64]) -> Result<Vec<Event>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events e {EVENT_JOINS} WHERE e.id = ANY($1) ORDER BY e.id"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        into_events(rows)
    }

    async fn list_events(
        &self,
        filter: &Predicate<EventField>,
        order: EventOrder,
        page: Page,
    ) -> Result<Vec<Event>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events e {EVENT_JOINS} WHERE "
        ));
        push_predicate(&mut builder, filter);
        builder
            .push(" ORDER BY ")
            .push(order.sql())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = builder
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await?;
        into_events(rows)
    }

    async fn update_event(&self, id: i64, mutation: EventMutation<'_>) -> Result<Event, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut event = fetch_event(&mut tx, id, true)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event", id))?;
        let limit = event.participant_limit;
        mutation(&mut event)?;
        if event.participant_limit != limit {
            // Request writers lock the event row first, so the count is stable here.
            let confirmed = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM requests WHERE event_id = $1 AND status = $2",
            )
            .bind(id)
            .bind(RequestStatus::Confirmed.as_str())
            .fetch_one(&mut *tx)
            .await?;
            event.recount_confirmed(confirmed)?;
        }
        write_event(&mut tx, &event).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn count_events_in_category(&self, category_id: i64) -> Result<i64, ServiceError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ── Requests ──

#[async_trait]
impl RequestStore for PostgresStore {
    async fn create_request(
        &self,
        event_id: i64,
        requester_id: i64,
        created: NaiveDateTime,
        admission: Admission<'_>,
    ) -> Result<ParticipationRequest, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let event = fetch_event(&mut tx, event_id, true)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event", event_id))?;
        let already_requested = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM requests WHERE event_id = $1 AND requester_id = $2)",
        )
        .bind(event_id)
        .bind(requester_id)
        .fetch_one(&mut *tx)
        .await?;

        let status = admission(&event, already_requested)?;
        let sql = format!(
            "INSERT INTO requests (event_id, requester_id, created, status) \
             VALUES ($1, $2, $3, $4) RETURNING {REQUEST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(event_id)
            .bind(requester_id)
            .bind(created)
            .bind(status.as_str())
            .fetch_one(&mut *tx)
            .await?;
        if status == RequestStatus::Confirmed {
            adjust_confirmed(&mut tx, event_id, 1).await?;
        }
        tx.commit().await?;
        ParticipationRequest::try_from(row)
    }

    async fn find_request(&self, id: i64) -> Result<Option<ParticipationRequest>, ServiceError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ParticipationRequest::try_from)
            .transpose()
    }

    async fn list_requests_by_requester(
        &self,
        requester_id: i64,
    ) -> Result<Vec<ParticipationRequest>, ServiceError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE requester_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(requester_id)
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }

    async fn list_requests_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<ParticipationRequest>, ServiceError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE event_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }

    async fn update_request(
        &self,
        id: i64,
        mutation: RequestMutation<'_>,
    ) -> Result<ParticipationRequest, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let event_id = sqlx::query_scalar::<_, i64>("SELECT event_id FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("Request", id))?;
        // Event row first: same lock order as batch updates.
        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let mut request = ParticipationRequest::try_from(row)?;
        let before = request.status;
        mutation(&mut request)?;

        sqlx::query("UPDATE requests SET status = $1 WHERE id = $2")
            .bind(request.status.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        match (before, request.status) {
            (RequestStatus::Confirmed, after) if after != RequestStatus::Confirmed => {
                adjust_confirmed(&mut tx, event_id, -1).await?;
            }
            (before, RequestStatus::Confirmed) if before != RequestStatus::Confirmed => {
                adjust_confirmed(&mut tx, event_id, 1).await?;
            }
            _ => {}
        }
        tx.commit().await?;
        Ok(request)
    }

    async fn update_request_statuses(
        &self,
        event_id: i64,
        request_ids: &[i64],
        mutation: BatchMutation<'_>,
    ) -> Result<Vec<ParticipationRequest>, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut event = fetch_event(&mut tx, event_id, true)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event", event_id))?;
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE event_id = $1 AND id = ANY($2) \
             ORDER BY id FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(event_id)
            .bind(request_ids)
            .fetch_all(&mut *tx)
            .await?;
        let mut requests = into_requests(rows)?;

        mutation(&mut event, &mut requests)?;

        for request in &requests {
            sqlx::query("UPDATE requests SET status = $1 WHERE id = $2")
                .bind(request.status.as_str())
                .bind(request.id)
                .execute(&mut *tx)
                .await?;
        }
        write_event(&mut tx, &event).await?;
        tx.commit().await?;
        Ok(requests)
    }
}

// ── Comments ──

#[async_trait]
impl CommentStore for PostgresStore {
    async fn insert_comment(&self, draft: &CommentDraft) -> Result<Comment, ServiceError> {
        let sql = format!(
            "WITH c AS (INSERT INTO comments (text, commentator_id, event_id, created, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *) \
             SELECT {COMMENT_COLUMNS} FROM c {COMMENT_JOINS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(&draft.text)
            .bind(draft.commentator_id)
            .bind(draft.event_id)
            .bind(draft.created)
            .bind(CommentStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;
        Comment::try_from(row)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, ServiceError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments c {COMMENT_JOINS} WHERE c.id = $1");
        sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Comment::try_from)
            .transpose()
    }

    async fn list_comments(
        &self,
        filter: &Predicate<CommentField>,
        order: CommentOrder,
        page: Page,
    ) -> Result<Vec<Comment>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c {COMMENT_JOINS} WHERE "
        ));
        push_predicate(&mut builder, filter);
        builder
            .push(" ORDER BY ")
            .push(order.sql())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = builder
            .build_query_as::<CommentRow>()
            .fetch_all(&self.pool)
            .await?;
        into_comments(rows)
    }

    async fn update_comment(
        &self,
        id: i64,
        mutation: CommentMutation<'_>,
    ) -> Result<Comment, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c {COMMENT_JOINS} WHERE c.id = $1 FOR UPDATE OF c"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment", id))?;
        let mut comment = Comment::try_from(row)?;
        mutation(&mut comment)?;
        sqlx::query("UPDATE comments SET text = $1, status = $2 WHERE id = $3")
            .bind(&comment.text)
            .bind(comment.status.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Compilations ──

impl PostgresStore {
    async fn compilation_event_ids(&self, ids: &[i64]) -> Result<Vec<(i64, i64)>, ServiceError> {
        let pairs = sqlx::query_as::<_, (i64, i64)>(
            "SELECT compilation_id, event_id FROM compilation_events \
             WHERE compilation_id = ANY($1) ORDER BY compilation_id, event_id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(pairs)
    }

    async fn assemble(&self, rows: Vec<CompilationRow>) -> Result<Vec<Compilation>, ServiceError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let pairs = self.compilation_event_ids(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| Compilation {
                id: row.id,
                event_ids: pairs
                    .iter()
                    .filter(|(compilation_id, _)| *compilation_id == row.id)
                    .map(|(_, event_id)| *event_id)
                    .collect(),
                title: row.title,
                pinned: row.pinned,
            })
            .collect())
    }
}

async fn link_events(
    conn: &mut PgConnection,
    compilation_id: i64,
    event_ids: &[i64],
) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO compilation_events (compilation_id, event_id) \
         SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
    )
    .bind(compilation_id)
    .bind(event_ids)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl CompilationStore for PostgresStore {
    async fn insert_compilation(&self, new: &NewCompilation) -> Result<Compilation, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, CompilationRow>(
            "INSERT INTO compilations (title, pinned) VALUES ($1, $2) RETURNING id, title, pinned",
        )
        .bind(&new.title)
        .bind(new.pinned)
        .fetch_one(&mut *tx)
        .await?;
        link_events(&mut tx, row.id, &new.event_ids).await?;
        tx.commit().await?;
        let mut assembled = self.assemble(vec![row]).await?;
        assembled
            .pop()
            .ok_or_else(|| ServiceError::Internal("inserted compilation vanished".to_string()))
    }

    async fn find_compilation(&self, id: i64) -> Result<Option<Compilation>, ServiceError> {
        let row = sqlx::query_as::<_, CompilationRow>(
            "SELECT id, title, pinned FROM compilations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_compilations(
        &self,
        pinned: Option<bool>,
        page: Page,
    ) -> Result<Vec<Compilation>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id, title, pinned FROM compilations");
        if let Some(pinned) = pinned {
            builder.push(" WHERE pinned = ").push_bind(pinned);
        }
        builder
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = builder
            .build_query_as::<CompilationRow>()
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows).await
    }

    async fn update_compilation(
        &self,
        id: i64,
        patch: &CompilationPatch,
    ) -> Result<Option<Compilation>, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, CompilationRow>(
            "UPDATE compilations SET title = COALESCE($1, title), pinned = COALESCE($2, pinned) \
             WHERE id = $3 RETURNING id, title, pinned",
        )
        .bind(patch.title.as_deref())
        .bind(patch.pinned)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        if let Some(event_ids) = &patch.event_ids {
            sqlx::query("DELETE FROM compilation_events WHERE compilation_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_events(&mut tx, id, event_ids).await?;
        }
        tx.commit().await?;
        Ok(self.assemble(vec![row]).await?.pop())
    }

    async fn delete_compilation(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM compilations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ── Statistics ──

/// PostgreSQL-backed hit log of the statistics service.
#[derive(Debug, Clone)]
pub struct PostgresHitStore {
    pool: PgPool,
}

impl PostgresHitStore {
    /// Creates a new hit store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the statistics service migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ServiceError> {
        sqlx::migrate!("./migrations/stats").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl HitStore for PostgresHitStore {
    async fn insert_hit(&self, hit: &NewHit) -> Result<EndpointHit, ServiceError> {
        let row = sqlx::query_as::<_, HitRow>(
            "INSERT INTO hits (app, uri, ip, timestamp) VALUES ($1, $2, $3, $4) \
             RETURNING id, app, uri, ip, timestamp",
        )
        .bind(&hit.app)
        .bind(&hit.uri)
        .bind(&hit.ip)
        .bind(hit.timestamp)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT app, uri, ");
        builder.push(if query.unique() {
            "COUNT(DISTINCT ip)"
        } else {
            "COUNT(*)"
        });
        builder
            .push(" AS hits FROM hits WHERE timestamp BETWEEN ")
            .push_bind(query.start())
            .push(" AND ")
            .push_bind(query.end());
        if !query.uris().is_empty() {
            builder.push(" AND uri = ANY(").push_bind(query.uris()).push(")");
        }
        builder.push(" GROUP BY app, uri ORDER BY hits DESC, app, uri");
        let rows = builder
            .build_query_as::<ViewStatsRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ViewStats::from).collect())
    }
}

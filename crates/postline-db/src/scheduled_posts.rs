//! Database operations for the `scheduled_posts` publish queue.
//!
//! Queue rows are separate from editorial `social_posts` records; see
//! DESIGN.md for the reconciliation decision.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use postline_core::ScheduleStatus;

use crate::DbError;

/// A row from the `scheduled_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduledPostRow {
    pub id: i64,
    pub profile_id: i64,
    pub content: String,
    pub hashtags: Vec<String>,
    pub media_urls: Vec<String>,
    pub scheduled_for: DateTime<Utc>,
    pub status: String,
    /// Identifier returned by the platform connector once sent.
    pub external_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScheduledPost {
    pub profile_id: i64,
    pub content: String,
    pub hashtags: Vec<String>,
    pub media_urls: Vec<String>,
    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduledPostFilters {
    pub profile_id: Option<i64>,
    pub status: Option<ScheduleStatus>,
}

/// Returns queue rows in dispatch order (`scheduled_for` ascending),
/// optionally scoped to a profile and/or status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scheduled_posts(
    pool: &PgPool,
    filters: ScheduledPostFilters,
) -> Result<Vec<ScheduledPostRow>, DbError> {
    let rows = sqlx::query_as::<_, ScheduledPostRow>(
        "SELECT id, profile_id, content, hashtags, media_urls, scheduled_for, status, \
                external_id, error_message, created_at \
         FROM scheduled_posts \
         WHERE ($1::BIGINT IS NULL OR profile_id = $1) \
           AND ($2::TEXT IS NULL OR status = $2) \
         ORDER BY scheduled_for, id",
    )
    .bind(filters.profile_id)
    .bind(filters.status.map(ScheduleStatus::as_str))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single queue row by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scheduled_post(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ScheduledPostRow>, DbError> {
    let row = sqlx::query_as::<_, ScheduledPostRow>(
        "SELECT id, profile_id, content, hashtags, media_urls, scheduled_for, status, \
                external_id, error_message, created_at \
         FROM scheduled_posts \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Enqueues a publish job in `pending` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including an unknown
/// profile, via the foreign key).
pub async fn create_scheduled_post(
    pool: &PgPool,
    job: &NewScheduledPost,
) -> Result<ScheduledPostRow, DbError> {
    let row = sqlx::query_as::<_, ScheduledPostRow>(
        "INSERT INTO scheduled_posts (profile_id, content, hashtags, media_urls, scheduled_for) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, profile_id, content, hashtags, media_urls, scheduled_for, status, \
                   external_id, error_message, created_at",
    )
    .bind(job.profile_id)
    .bind(&job.content)
    .bind(&job.hashtags)
    .bind(&job.media_urls)
    .bind(job.scheduled_for)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns pending rows due at or before `now`, in dispatch order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_due_scheduled_posts(
    pool: &PgPool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ScheduledPostRow>, DbError> {
    let rows = sqlx::query_as::<_, ScheduledPostRow>(
        "SELECT id, profile_id, content, hashtags, media_urls, scheduled_for, status, \
                external_id, error_message, created_at \
         FROM scheduled_posts \
         WHERE status = 'pending' AND scheduled_for <= $1 \
         ORDER BY scheduled_for, id \
         LIMIT $2",
    )
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Marks a pending row as sent, recording the connector's external id.
///
/// # Errors
///
/// Returns [`DbError::InvalidScheduleTransition`] when the row is missing or
/// no longer pending, [`DbError::Sqlx`] on other failures.
pub async fn mark_scheduled_post_sent(
    pool: &PgPool,
    id: i64,
    external_id: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scheduled_posts \
         SET status = 'sent', external_id = $1, error_message = NULL \
         WHERE id = $2 AND status = 'pending'",
    )
    .bind(external_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScheduleTransition {
            id,
            expected_status: "pending",
        });
    }
    Ok(())
}

/// Marks a pending row as failed, recording the error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidScheduleTransition`] when the row is missing or
/// no longer pending, [`DbError::Sqlx`] on other failures.
pub async fn mark_scheduled_post_failed(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scheduled_posts \
         SET status = 'failed', error_message = $1 \
         WHERE id = $2 AND status = 'pending'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScheduleTransition {
            id,
            expected_status: "pending",
        });
    }
    Ok(())
}

/// Removes a queue row; how a pending job is canceled.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_scheduled_post(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM scheduled_posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

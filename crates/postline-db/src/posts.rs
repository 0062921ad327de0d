//! Database operations for the `social_posts` table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use postline_core::{encode_copies, ContentFormat, ContentType, PlatformCopy, PostStatus};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `social_posts` table.
///
/// `profile_ids` is the source of truth for targeting; `profile_id` is
/// always written as its first element (NULL when the set is empty) and
/// exists for single-profile consumers. Both are maintained inside the
/// INSERT/UPDATE statements so they cannot diverge.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub product_id: Option<i64>,
    pub post_at: DateTime<Utc>,
    pub profile_ids: Vec<i64>,
    pub profile_id: Option<i64>,
    pub content_type: String,
    pub content_format: Option<String>,
    /// Opaque structured column; decode with `postline_core::parse_copies`.
    pub copies: Value,
    pub hashtags: Vec<String>,
    pub media_ids: Vec<i64>,
    pub status: String,
    pub launch_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewPost {
    pub product_id: Option<i64>,
    pub post_at: DateTime<Utc>,
    pub profile_ids: Vec<i64>,
    pub content_type: ContentType,
    pub content_format: Option<ContentFormat>,
    pub copies: Vec<PlatformCopy>,
    pub hashtags: Vec<String>,
    pub media_ids: Vec<i64>,
    pub status: PostStatus,
    pub launch_id: Option<i64>,
}

// Option<Option<T>> distinguishes "keep" / "clear" / "set" per PATCH
// semantics, as elsewhere in this crate.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub product_id: Option<Option<i64>>,
    pub post_at: Option<DateTime<Utc>>,
    pub profile_ids: Option<Vec<i64>>,
    pub content_type: Option<ContentType>,
    pub content_format: Option<Option<ContentFormat>>,
    pub copies: Option<Vec<PlatformCopy>>,
    pub hashtags: Option<Vec<String>>,
    pub media_ids: Option<Vec<i64>>,
    pub status: Option<PostStatus>,
    pub launch_id: Option<Option<i64>>,
}

/// Server-side scoping for post lists. `from`/`to` bound `post_at`
/// inclusively on both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostListFilters {
    pub launch_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns posts in calendar order (`post_at` ascending), optionally scoped
/// to a launch and/or an inclusive date range.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts(
    pool: &PgPool,
    filters: PostListFilters,
) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, product_id, post_at, profile_ids, profile_id, content_type, \
                content_format, copies, hashtags, media_ids, status, launch_id, \
                created_at, updated_at \
         FROM social_posts \
         WHERE ($1::BIGINT IS NULL OR launch_id = $1) \
           AND ($2::TIMESTAMPTZ IS NULL OR post_at >= $2) \
           AND ($3::TIMESTAMPTZ IS NULL OR post_at <= $3) \
         ORDER BY post_at, id",
    )
    .bind(filters.launch_id)
    .bind(filters.from)
    .bind(filters.to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single post by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post(pool: &PgPool, id: i64) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, product_id, post_at, profile_ids, profile_id, content_type, \
                content_format, copies, hashtags, media_ids, status, launch_id, \
                created_at, updated_at \
         FROM social_posts \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a post and returns the full inserted row.
///
/// `profile_id` is derived from the first element of `profile_ids` here,
/// not by the caller.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_post(pool: &PgPool, post: &NewPost) -> Result<PostRow, DbError> {
    let first_profile = post.profile_ids.first().copied();

    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO social_posts \
             (product_id, post_at, profile_ids, profile_id, content_type, \
              content_format, copies, hashtags, media_ids, status, launch_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7::jsonb, $8, $9, $10, $11) \
         RETURNING id, product_id, post_at, profile_ids, profile_id, content_type, \
                   content_format, copies, hashtags, media_ids, status, launch_id, \
                   created_at, updated_at",
    )
    .bind(post.product_id)
    .bind(post.post_at)
    .bind(&post.profile_ids)
    .bind(first_profile)
    .bind(post.content_type.as_str())
    .bind(post.content_format.map(ContentFormat::as_str))
    .bind(encode_copies(&post.copies))
    .bind(&post.hashtags)
    .bind(&post.media_ids)
    .bind(post.status.as_str())
    .bind(post.launch_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse patch to a post and returns the full updated row.
///
/// When `profile_ids` is supplied, `profile_id` is recomputed from its first
/// element in the same statement.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_post(pool: &PgPool, id: i64, patch: &PostPatch) -> Result<PostRow, DbError> {
    let product_supplied = patch.product_id.is_some();
    let product_val = patch.product_id.flatten();
    let profiles_supplied = patch.profile_ids.is_some();
    let first_profile = patch
        .profile_ids
        .as_ref()
        .and_then(|ids| ids.first().copied());
    let format_supplied = patch.content_format.is_some();
    let format_val = patch.content_format.flatten().map(ContentFormat::as_str);
    let copies_val = patch.copies.as_ref().map(|c| encode_copies(c));
    let launch_supplied = patch.launch_id.is_some();
    let launch_val = patch.launch_id.flatten();

    let row = sqlx::query_as::<_, PostRow>(
        "UPDATE social_posts \
         SET product_id     = CASE WHEN $2::BOOL  THEN $3  ELSE product_id END, \
             post_at        = COALESCE($4, post_at), \
             profile_ids    = CASE WHEN $5::BOOL  THEN $6  ELSE profile_ids END, \
             profile_id     = CASE WHEN $5::BOOL  THEN $7  ELSE profile_id END, \
             content_type   = COALESCE($8, content_type), \
             content_format = CASE WHEN $9::BOOL  THEN $10 ELSE content_format END, \
             copies         = COALESCE($11::jsonb, copies), \
             hashtags       = COALESCE($12, hashtags), \
             media_ids      = COALESCE($13, media_ids), \
             status         = COALESCE($14, status), \
             launch_id      = CASE WHEN $15::BOOL THEN $16 ELSE launch_id END, \
             updated_at     = NOW() \
         WHERE id = $1 \
         RETURNING id, product_id, post_at, profile_ids, profile_id, content_type, \
                   content_format, copies, hashtags, media_ids, status, launch_id, \
                   created_at, updated_at",
    )
    .bind(id)
    .bind(product_supplied)
    .bind(product_val)
    .bind(patch.post_at)
    .bind(profiles_supplied)
    .bind(&patch.profile_ids)
    .bind(first_profile)
    .bind(patch.content_type.map(ContentType::as_str))
    .bind(format_supplied)
    .bind(format_val)
    .bind(copies_val)
    .bind(&patch.hashtags)
    .bind(&patch.media_ids)
    .bind(patch.status.map(PostStatus::as_str))
    .bind(launch_supplied)
    .bind(launch_val)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a post.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_post(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM social_posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

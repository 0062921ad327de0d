//! Database operations for the `media_kit_resources` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `media_kit_resources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaKitResourceRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub url: String,
    pub format: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMediaKitResource {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub url: String,
    pub format: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub tags: Vec<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct MediaKitResourcePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub url: Option<String>,
    pub format: Option<Option<String>>,
    pub file_size_bytes: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Returns all media kit resources, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_media_kit_resources(pool: &PgPool) -> Result<Vec<MediaKitResourceRow>, DbError> {
    let rows = sqlx::query_as::<_, MediaKitResourceRow>(
        "SELECT id, name, description, category, url, format, file_size_bytes, tags, \
                is_active, created_at, updated_at \
         FROM media_kit_resources \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single resource by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_media_kit_resource(
    pool: &PgPool,
    id: i64,
) -> Result<Option<MediaKitResourceRow>, DbError> {
    let row = sqlx::query_as::<_, MediaKitResourceRow>(
        "SELECT id, name, description, category, url, format, file_size_bytes, tags, \
                is_active, created_at, updated_at \
         FROM media_kit_resources \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a resource and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_media_kit_resource(
    pool: &PgPool,
    resource: &NewMediaKitResource,
) -> Result<MediaKitResourceRow, DbError> {
    let row = sqlx::query_as::<_, MediaKitResourceRow>(
        "INSERT INTO media_kit_resources \
             (name, description, category, url, format, file_size_bytes, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, name, description, category, url, format, file_size_bytes, tags, \
                   is_active, created_at, updated_at",
    )
    .bind(&resource.name)
    .bind(&resource.description)
    .bind(&resource.category)
    .bind(&resource.url)
    .bind(&resource.format)
    .bind(resource.file_size_bytes)
    .bind(&resource.tags)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse patch to a resource and returns the full updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_media_kit_resource(
    pool: &PgPool,
    id: i64,
    patch: &MediaKitResourcePatch,
) -> Result<MediaKitResourceRow, DbError> {
    let description_supplied = patch.description.is_some();
    let description_val = patch.description.clone().flatten();
    let format_supplied = patch.format.is_some();
    let format_val = patch.format.clone().flatten();
    let size_supplied = patch.file_size_bytes.is_some();
    let size_val = patch.file_size_bytes.flatten();

    let row = sqlx::query_as::<_, MediaKitResourceRow>(
        "UPDATE media_kit_resources \
         SET name            = COALESCE($2, name), \
             description     = CASE WHEN $3::BOOL THEN $4 ELSE description END, \
             category        = COALESCE($5, category), \
             url             = COALESCE($6, url), \
             format          = CASE WHEN $7::BOOL THEN $8 ELSE format END, \
             file_size_bytes = CASE WHEN $9::BOOL THEN $10 ELSE file_size_bytes END, \
             tags            = COALESCE($11, tags), \
             is_active       = COALESCE($12, is_active), \
             updated_at      = NOW() \
         WHERE id = $1 \
         RETURNING id, name, description, category, url, format, file_size_bytes, tags, \
                   is_active, created_at, updated_at",
    )
    .bind(id)
    .bind(&patch.name)
    .bind(description_supplied)
    .bind(description_val)
    .bind(&patch.category)
    .bind(&patch.url)
    .bind(format_supplied)
    .bind(format_val)
    .bind(size_supplied)
    .bind(size_val)
    .bind(&patch.tags)
    .bind(patch.is_active)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a resource.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_media_kit_resource(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM media_kit_resources WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

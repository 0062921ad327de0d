//! Database operations for the `protocols` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `protocols` table. `protocol_type` is a free string
/// ("posting", "crisis", "tone-of-voice", …) rather than an enum.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProtocolRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub protocol_type: String,
    pub content: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProtocol {
    pub title: String,
    pub description: Option<String>,
    pub protocol_type: String,
    pub content: String,
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct ProtocolPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub protocol_type: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

/// Returns all protocols, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_protocols(pool: &PgPool) -> Result<Vec<ProtocolRow>, DbError> {
    let rows = sqlx::query_as::<_, ProtocolRow>(
        "SELECT id, title, description, protocol_type, content, is_active, \
                created_at, updated_at \
         FROM protocols \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single protocol by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_protocol(pool: &PgPool, id: i64) -> Result<Option<ProtocolRow>, DbError> {
    let row = sqlx::query_as::<_, ProtocolRow>(
        "SELECT id, title, description, protocol_type, content, is_active, \
                created_at, updated_at \
         FROM protocols \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a protocol and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_protocol(pool: &PgPool, protocol: &NewProtocol) -> Result<ProtocolRow, DbError> {
    let row = sqlx::query_as::<_, ProtocolRow>(
        "INSERT INTO protocols (title, description, protocol_type, content) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, title, description, protocol_type, content, is_active, \
                   created_at, updated_at",
    )
    .bind(&protocol.title)
    .bind(&protocol.description)
    .bind(&protocol.protocol_type)
    .bind(&protocol.content)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse patch to a protocol and returns the full updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_protocol(
    pool: &PgPool,
    id: i64,
    patch: &ProtocolPatch,
) -> Result<ProtocolRow, DbError> {
    let description_supplied = patch.description.is_some();
    let description_val = patch.description.clone().flatten();

    let row = sqlx::query_as::<_, ProtocolRow>(
        "UPDATE protocols \
         SET title         = COALESCE($2, title), \
             description   = CASE WHEN $3::BOOL THEN $4 ELSE description END, \
             protocol_type = COALESCE($5, protocol_type), \
             content       = COALESCE($6, content), \
             is_active     = COALESCE($7, is_active), \
             updated_at    = NOW() \
         WHERE id = $1 \
         RETURNING id, title, description, protocol_type, content, is_active, \
                   created_at, updated_at",
    )
    .bind(id)
    .bind(&patch.title)
    .bind(description_supplied)
    .bind(description_val)
    .bind(&patch.protocol_type)
    .bind(&patch.content)
    .bind(patch.is_active)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a protocol.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_protocol(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM protocols WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

//! Database operations for the `launches` table.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use postline_core::{LaunchCategory, LaunchStatus};

use crate::DbError;

/// A row from the `launches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LaunchRow {
    pub id: i64,
    pub name: String,
    pub product_id: Option<i64>,
    pub category: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub responsible: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLaunch {
    pub name: String,
    pub product_id: Option<i64>,
    pub category: LaunchCategory,
    pub status: LaunchStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub responsible: Option<String>,
    pub description: Option<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct LaunchPatch {
    pub name: Option<String>,
    pub product_id: Option<Option<i64>>,
    pub category: Option<LaunchCategory>,
    pub status: Option<LaunchStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub responsible: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

/// Returns all launches, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_launches(pool: &PgPool) -> Result<Vec<LaunchRow>, DbError> {
    let rows = sqlx::query_as::<_, LaunchRow>(
        "SELECT id, name, product_id, category, status, start_date, end_date, \
                responsible, description, created_at, updated_at \
         FROM launches \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single launch by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_launch(pool: &PgPool, id: i64) -> Result<Option<LaunchRow>, DbError> {
    let row = sqlx::query_as::<_, LaunchRow>(
        "SELECT id, name, product_id, category, status, start_date, end_date, \
                responsible, description, created_at, updated_at \
         FROM launches \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a launch and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_launch(pool: &PgPool, launch: &NewLaunch) -> Result<LaunchRow, DbError> {
    let row = sqlx::query_as::<_, LaunchRow>(
        "INSERT INTO launches \
             (name, product_id, category, status, start_date, end_date, responsible, description) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, name, product_id, category, status, start_date, end_date, \
                   responsible, description, created_at, updated_at",
    )
    .bind(&launch.name)
    .bind(launch.product_id)
    .bind(launch.category.as_str())
    .bind(launch.status.as_str())
    .bind(launch.start_date)
    .bind(launch.end_date)
    .bind(&launch.responsible)
    .bind(&launch.description)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse patch to a launch and returns the full updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_launch(
    pool: &PgPool,
    id: i64,
    patch: &LaunchPatch,
) -> Result<LaunchRow, DbError> {
    let product_supplied = patch.product_id.is_some();
    let product_val = patch.product_id.flatten();
    let responsible_supplied = patch.responsible.is_some();
    let responsible_val = patch.responsible.clone().flatten();
    let description_supplied = patch.description.is_some();
    let description_val = patch.description.clone().flatten();

    let row = sqlx::query_as::<_, LaunchRow>(
        "UPDATE launches \
         SET name        = COALESCE($2, name), \
             product_id  = CASE WHEN $3::BOOL THEN $4 ELSE product_id END, \
             category    = COALESCE($5, category), \
             status      = COALESCE($6, status), \
             start_date  = COALESCE($7, start_date), \
             end_date    = COALESCE($8, end_date), \
             responsible = CASE WHEN $9::BOOL  THEN $10 ELSE responsible END, \
             description = CASE WHEN $11::BOOL THEN $12 ELSE description END, \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING id, name, product_id, category, status, start_date, end_date, \
                   responsible, description, created_at, updated_at",
    )
    .bind(id)
    .bind(&patch.name)
    .bind(product_supplied)
    .bind(product_val)
    .bind(patch.category.map(LaunchCategory::as_str))
    .bind(patch.status.map(LaunchStatus::as_str))
    .bind(patch.start_date)
    .bind(patch.end_date)
    .bind(responsible_supplied)
    .bind(responsible_val)
    .bind(description_supplied)
    .bind(description_val)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a launch. The schema cascades the launch's phases and detaches
/// its posts (`launch_id = NULL`), so the one delete path carries the whole
/// policy.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_launch(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM launches WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

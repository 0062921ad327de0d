//! Database operations for the `launch_phases` table.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use postline_core::PhaseStatus;

use crate::DbError;

/// A row from the `launch_phases` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LaunchPhaseRow {
    pub id: i64,
    pub launch_id: i64,
    pub name: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLaunchPhase {
    pub launch_id: i64,
    pub name: String,
    pub status: PhaseStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct LaunchPhasePatch {
    pub name: Option<String>,
    pub status: Option<PhaseStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub responsible: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

/// Returns a launch's phases in plan order (start date first, unplanned
/// phases last).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_launch_phases(
    pool: &PgPool,
    launch_id: i64,
) -> Result<Vec<LaunchPhaseRow>, DbError> {
    let rows = sqlx::query_as::<_, LaunchPhaseRow>(
        "SELECT id, launch_id, name, status, start_date, end_date, responsible, notes, \
                created_at, updated_at \
         FROM launch_phases \
         WHERE launch_id = $1 \
         ORDER BY start_date ASC NULLS LAST, id",
    )
    .bind(launch_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single phase by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_launch_phase(pool: &PgPool, id: i64) -> Result<Option<LaunchPhaseRow>, DbError> {
    let row = sqlx::query_as::<_, LaunchPhaseRow>(
        "SELECT id, launch_id, name, status, start_date, end_date, responsible, notes, \
                created_at, updated_at \
         FROM launch_phases \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a phase under a launch and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a missing
/// launch, via the foreign key).
pub async fn create_launch_phase(
    pool: &PgPool,
    phase: &NewLaunchPhase,
) -> Result<LaunchPhaseRow, DbError> {
    let row = sqlx::query_as::<_, LaunchPhaseRow>(
        "INSERT INTO launch_phases \
             (launch_id, name, status, start_date, end_date, responsible, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, launch_id, name, status, start_date, end_date, responsible, notes, \
                   created_at, updated_at",
    )
    .bind(phase.launch_id)
    .bind(&phase.name)
    .bind(phase.status.as_str())
    .bind(phase.start_date)
    .bind(phase.end_date)
    .bind(&phase.responsible)
    .bind(&phase.notes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse patch to a phase and returns the full updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_launch_phase(
    pool: &PgPool,
    id: i64,
    patch: &LaunchPhasePatch,
) -> Result<LaunchPhaseRow, DbError> {
    let start_supplied = patch.start_date.is_some();
    let start_val = patch.start_date.flatten();
    let end_supplied = patch.end_date.is_some();
    let end_val = patch.end_date.flatten();
    let responsible_supplied = patch.responsible.is_some();
    let responsible_val = patch.responsible.clone().flatten();
    let notes_supplied = patch.notes.is_some();
    let notes_val = patch.notes.clone().flatten();

    let row = sqlx::query_as::<_, LaunchPhaseRow>(
        "UPDATE launch_phases \
         SET name        = COALESCE($2, name), \
             status      = COALESCE($3, status), \
             start_date  = CASE WHEN $4::BOOL  THEN $5  ELSE start_date END, \
             end_date    = CASE WHEN $6::BOOL  THEN $7  ELSE end_date END, \
             responsible = CASE WHEN $8::BOOL  THEN $9  ELSE responsible END, \
             notes       = CASE WHEN $10::BOOL THEN $11 ELSE notes END, \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING id, launch_id, name, status, start_date, end_date, responsible, notes, \
                   created_at, updated_at",
    )
    .bind(id)
    .bind(&patch.name)
    .bind(patch.status.map(PhaseStatus::as_str))
    .bind(start_supplied)
    .bind(start_val)
    .bind(end_supplied)
    .bind(end_val)
    .bind(responsible_supplied)
    .bind(responsible_val)
    .bind(notes_supplied)
    .bind(notes_val)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a phase.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_launch_phase(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM launch_phases WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

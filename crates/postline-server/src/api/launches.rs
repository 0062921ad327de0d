//! Launch and launch-phase handlers.
//!
//! Launch detail joins in the phase list; deleting a launch removes its
//! phases and detaches its posts (the policy lives in the schema).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use postline_core::{LaunchCategory, LaunchStatus, PhaseStatus};
use postline_db::{LaunchPatch, LaunchPhasePatch, LaunchPhaseRow, LaunchRow, NewLaunch, NewLaunchPhase};

use crate::middleware::RequestId;

use super::{map_db_error, map_reference_violation, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct LaunchItem {
    id: i64,
    name: String,
    product_id: Option<i64>,
    category: String,
    status: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    responsible: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&LaunchRow> for LaunchItem {
    fn from(row: &LaunchRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            product_id: row.product_id,
            category: row.category.clone(),
            status: row.status.clone(),
            start_date: row.start_date,
            end_date: row.end_date,
            responsible: row.responsible.clone(),
            description: row.description.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PhaseItem {
    id: i64,
    launch_id: i64,
    name: String,
    status: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    responsible: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&LaunchPhaseRow> for PhaseItem {
    fn from(row: &LaunchPhaseRow) -> Self {
        Self {
            id: row.id,
            launch_id: row.launch_id,
            name: row.name.clone(),
            status: row.status.clone(),
            start_date: row.start_date,
            end_date: row.end_date,
            responsible: row.responsible.clone(),
            notes: row.notes.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LaunchDetail {
    #[serde(flatten)]
    launch: LaunchItem,
    phases: Vec<PhaseItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateLaunchRequest {
    pub name: String,
    pub product_id: Option<i64>,
    pub category: LaunchCategory,
    pub status: Option<LaunchStatus>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub responsible: Option<String>,
    pub description: Option<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateLaunchRequest {
    pub name: Option<String>,
    pub product_id: Option<Option<i64>>,
    pub category: Option<LaunchCategory>,
    pub status: Option<LaunchStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub responsible: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatePhaseRequest {
    pub name: String,
    pub status: Option<PhaseStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdatePhaseRequest {
    pub name: Option<String>,
    pub status: Option<PhaseStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub responsible: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

fn validate_name(req_id: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "'name' must be 1–200 characters",
        ));
    }
    Ok(trimmed.to_owned())
}

fn validate_window(
    req_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "'end_date' must not precede 'start_date'",
        ));
    }
    Ok(())
}

/// GET /api/v1/launches
pub(super) async fn list_launches(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<LaunchItem>>>, ApiError> {
    let rows = state
        .store
        .launches()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.iter().map(LaunchItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/launches/:id — launch plus its phases.
pub(super) async fn get_launch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LaunchDetail>>, ApiError> {
    let rid = &req_id.0;

    let row = state
        .store
        .launch(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid.clone(), "not_found", "launch not found"))?;

    let phases = state
        .store
        .launch_phases(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: LaunchDetail {
            launch: LaunchItem::from(row.as_ref()),
            phases: phases.iter().map(PhaseItem::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/launches
pub(super) async fn create_launch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateLaunchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LaunchItem>>), ApiError> {
    let rid = &req_id.0;

    let name = validate_name(rid, &body.name)?;
    validate_window(rid, body.start_date, body.end_date)?;

    let row = state
        .store
        .create_launch(&NewLaunch {
            name,
            product_id: body.product_id,
            category: body.category,
            status: body.status.unwrap_or(LaunchStatus::Planned),
            start_date: body.start_date,
            end_date: body.end_date,
            responsible: body.responsible,
            description: body.description,
        })
        .await
        .map_err(|e| map_reference_violation(rid, "product_id", &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: LaunchItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/launches/:id
pub(super) async fn update_launch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateLaunchRequest>,
) -> Result<Json<ApiResponse<LaunchItem>>, ApiError> {
    let rid = &req_id.0;

    let name = body
        .name
        .as_deref()
        .map(|v| validate_name(rid, v))
        .transpose()?;
    if let (Some(start), Some(end)) = (body.start_date, body.end_date) {
        validate_window(rid, start, end)?;
    }

    let row = state
        .store
        .update_launch(
            id,
            &LaunchPatch {
                name,
                product_id: body.product_id,
                category: body.category,
                status: body.status,
                start_date: body.start_date,
                end_date: body.end_date,
                responsible: body.responsible,
                description: body.description,
            },
        )
        .await
        .map_err(|e| map_reference_violation(rid, "product_id", &e))?;

    Ok(Json(ApiResponse {
        data: LaunchItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/launches/:id — phases go with it, posts are detached.
pub(super) async fn delete_launch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_launch(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/launches/:id/phases
pub(super) async fn list_phases(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<PhaseItem>>>, ApiError> {
    let rid = &req_id.0;

    // Distinguish "launch has no phases" from "launch does not exist".
    state
        .store
        .launch(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid.clone(), "not_found", "launch not found"))?;

    let phases = state
        .store
        .launch_phases(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: phases.iter().map(PhaseItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/launches/:id/phases
pub(super) async fn create_phase(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<CreatePhaseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PhaseItem>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, &body.name)?;

    let row = state
        .store
        .create_launch_phase(&NewLaunchPhase {
            launch_id: id,
            name,
            status: body.status.unwrap_or(PhaseStatus::NotStarted),
            start_date: body.start_date,
            end_date: body.end_date,
            responsible: body.responsible,
            notes: body.notes,
        })
        .await
        .map_err(|e| map_reference_violation(rid, "launch_id", &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PhaseItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/phases/:id
pub(super) async fn update_phase(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePhaseRequest>,
) -> Result<Json<ApiResponse<PhaseItem>>, ApiError> {
    let rid = &req_id.0;
    let name = body
        .name
        .as_deref()
        .map(|v| validate_name(rid, v))
        .transpose()?;

    let row = state
        .store
        .update_launch_phase(
            id,
            &LaunchPhasePatch {
                name,
                status: body.status,
                start_date: body.start_date,
                end_date: body.end_date,
                responsible: body.responsible,
                notes: body.notes,
            },
        )
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PhaseItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/phases/:id
pub(super) async fn delete_phase(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_launch_phase(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

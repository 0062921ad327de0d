//! Protocol handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postline_db::{NewProtocol, ProtocolPatch, ProtocolRow};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProtocolItem {
    id: i64,
    title: String,
    description: Option<String>,
    protocol_type: String,
    content: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&ProtocolRow> for ProtocolItem {
    fn from(row: &ProtocolRow) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            protocol_type: row.protocol_type.clone(),
            content: row.content.clone(),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProtocolRequest {
    pub title: String,
    pub description: Option<String>,
    pub protocol_type: String,
    #[serde(default)]
    pub content: String,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateProtocolRequest {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub protocol_type: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

fn validate_title(req_id: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "'title' must be 1–200 characters",
        ));
    }
    Ok(trimmed.to_owned())
}

/// GET /api/v1/protocols
pub(super) async fn list_protocols(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProtocolItem>>>, ApiError> {
    let rows = state
        .store
        .protocols()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.iter().map(ProtocolItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/protocols/:id
pub(super) async fn get_protocol(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProtocolItem>>, ApiError> {
    let row = state
        .store
        .protocol(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "protocol not found"))?;

    Ok(Json(ApiResponse {
        data: ProtocolItem::from(row.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/protocols
pub(super) async fn create_protocol(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProtocolRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProtocolItem>>), ApiError> {
    let rid = &req_id.0;
    let title = validate_title(rid, &body.title)?;

    let row = state
        .store
        .create_protocol(&NewProtocol {
            title,
            description: body.description,
            protocol_type: body.protocol_type,
            content: body.content,
        })
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProtocolItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/protocols/:id
pub(super) async fn update_protocol(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProtocolRequest>,
) -> Result<Json<ApiResponse<ProtocolItem>>, ApiError> {
    let rid = &req_id.0;
    let title = body
        .title
        .as_deref()
        .map(|v| validate_title(rid, v))
        .transpose()?;

    let row = state
        .store
        .update_protocol(
            id,
            &ProtocolPatch {
                title,
                description: body.description,
                protocol_type: body.protocol_type,
                content: body.content,
                is_active: body.is_active,
            },
        )
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProtocolItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/protocols/:id
pub(super) async fn delete_protocol(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_protocol(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

//! Media kit resource handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postline_db::{MediaKitResourcePatch, MediaKitResourceRow, NewMediaKitResource};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ResourceItem {
    id: i64,
    name: String,
    description: Option<String>,
    category: String,
    url: String,
    format: Option<String>,
    file_size_bytes: Option<i64>,
    tags: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&MediaKitResourceRow> for ResourceItem {
    fn from(row: &MediaKitResourceRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            description: row.description.clone(),
            category: row.category.clone(),
            url: row.url.clone(),
            format: row.format.clone(),
            file_size_bytes: row.file_size_bytes,
            tags: row.tags.clone(),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateResourceRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub url: String,
    pub format: Option<String>,
    pub file_size_bytes: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateResourceRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub url: Option<String>,
    pub format: Option<Option<String>>,
    pub file_size_bytes: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

fn validate_resource_name(req_id: &str, name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "'name' must be 1–200 characters",
        ));
    }
    Ok(trimmed.to_owned())
}

fn validate_resource_url(req_id: &str, url: &str) -> Result<(), ApiError> {
    if url.trim().is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "'url' must be non-empty",
        ));
    }
    Ok(())
}

/// GET /api/v1/media-kit
pub(super) async fn list_resources(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ResourceItem>>>, ApiError> {
    let rows = state
        .store
        .media_kit_resources()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.iter().map(ResourceItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/media-kit/:id
pub(super) async fn get_resource(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ResourceItem>>, ApiError> {
    let row = state
        .store
        .media_kit_resource(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "resource not found"))?;

    Ok(Json(ApiResponse {
        data: ResourceItem::from(row.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/media-kit
pub(super) async fn create_resource(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ResourceItem>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_resource_name(rid, &body.name)?;
    validate_resource_url(rid, &body.url)?;

    let row = state
        .store
        .create_media_kit_resource(&NewMediaKitResource {
            name,
            description: body.description,
            category: body.category,
            url: body.url,
            format: body.format,
            file_size_bytes: body.file_size_bytes,
            tags: body.tags,
        })
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ResourceItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/media-kit/:id
pub(super) async fn update_resource(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateResourceRequest>,
) -> Result<Json<ApiResponse<ResourceItem>>, ApiError> {
    let rid = &req_id.0;

    let name = body
        .name
        .as_deref()
        .map(|v| validate_resource_name(rid, v))
        .transpose()?;
    if let Some(ref url) = body.url {
        validate_resource_url(rid, url)?;
    }

    let row = state
        .store
        .update_media_kit_resource(
            id,
            &MediaKitResourcePatch {
                name,
                description: body.description,
                category: body.category,
                url: body.url,
                format: body.format,
                file_size_bytes: body.file_size_bytes,
                tags: body.tags,
                is_active: body.is_active,
            },
        )
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ResourceItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/media-kit/:id
pub(super) async fn delete_resource(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_media_kit_resource(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

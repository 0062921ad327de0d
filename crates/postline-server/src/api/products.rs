//! Product handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postline_db::{NewProduct, ProductPatch, ProductRow};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: i64,
    name: String,
    description: Option<String>,
    creative_concept: Option<String>,
    landing_url: Option<String>,
    comkit_url: Option<String>,
    countries: Vec<String>,
    hashtags: Vec<String>,
    sales_objectives: Vec<String>,
    briefing: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&ProductRow> for ProductItem {
    fn from(row: &ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            description: row.description.clone(),
            creative_concept: row.creative_concept.clone(),
            landing_url: row.landing_url.clone(),
            comkit_url: row.comkit_url.clone(),
            countries: row.countries.clone(),
            hashtags: row.hashtags.clone(),
            sales_objectives: row.sales_objectives.clone(),
            briefing: row.briefing.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub creative_concept: Option<String>,
    pub landing_url: Option<String>,
    pub comkit_url: Option<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub sales_objectives: Vec<String>,
    pub briefing: Option<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub creative_concept: Option<Option<String>>,
    pub landing_url: Option<Option<String>>,
    pub comkit_url: Option<Option<String>>,
    pub countries: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
    pub sales_objectives: Option<Vec<String>>,
    pub briefing: Option<Option<String>>,
}

fn validate_product_name(req_id: &str, value: &str) -> Result<String, ApiError> {
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

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = state
        .store
        .products()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.iter().map(ProductItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/products/:id
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let row = state
        .store
        .product(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "product not found"))?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(row.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_product_name(rid, &body.name)?;

    let row = state
        .store
        .create_product(&NewProduct {
            name,
            description: body.description,
            creative_concept: body.creative_concept,
            landing_url: body.landing_url,
            comkit_url: body.comkit_url,
            countries: body.countries,
            hashtags: body.hashtags,
            sales_objectives: body.sales_objectives,
            briefing: body.briefing,
        })
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/products/:id
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let name = body
        .name
        .as_deref()
        .map(|v| validate_product_name(rid, v))
        .transpose()?;

    let row = state
        .store
        .update_product(
            id,
            &ProductPatch {
                name,
                description: body.description,
                creative_concept: body.creative_concept,
                landing_url: body.landing_url,
                comkit_url: body.comkit_url,
                countries: body.countries,
                hashtags: body.hashtags,
                sales_objectives: body.sales_objectives,
                briefing: body.briefing,
            },
        )
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/products/:id
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_product(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `products` table.
///
/// `countries`, `hashtags` and `sales_objectives` are ordered string lists
/// stored as `TEXT[]`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub creative_concept: Option<String>,
    pub landing_url: Option<String>,
    pub comkit_url: Option<String>,
    pub countries: Vec<String>,
    pub hashtags: Vec<String>,
    pub sales_objectives: Vec<String>,
    pub briefing: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub creative_concept: Option<String>,
    pub landing_url: Option<String>,
    pub comkit_url: Option<String>,
    pub countries: Vec<String>,
    pub hashtags: Vec<String>,
    pub sales_objectives: Vec<String>,
    pub briefing: Option<String>,
}

// List fields replace wholesale on update; there is no sparse merge inside
// an ordered list.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
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

/// Returns all products, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, description, creative_concept, landing_url, comkit_url, \
                countries, hashtags, sales_objectives, briefing, created_at, updated_at \
         FROM products \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single product by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, description, creative_concept, landing_url, comkit_url, \
                countries, hashtags, sales_objectives, briefing, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a product and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products \
             (name, description, creative_concept, landing_url, comkit_url, \
              countries, hashtags, sales_objectives, briefing) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id, name, description, creative_concept, landing_url, comkit_url, \
                   countries, hashtags, sales_objectives, briefing, created_at, updated_at",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.creative_concept)
    .bind(&product.landing_url)
    .bind(&product.comkit_url)
    .bind(&product.countries)
    .bind(&product.hashtags)
    .bind(&product.sales_objectives)
    .bind(&product.briefing)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse patch to a product and returns the full updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    patch: &ProductPatch,
) -> Result<ProductRow, DbError> {
    let description_supplied = patch.description.is_some();
    let description_val = patch.description.clone().flatten();
    let concept_supplied = patch.creative_concept.is_some();
    let concept_val = patch.creative_concept.clone().flatten();
    let landing_supplied = patch.landing_url.is_some();
    let landing_val = patch.landing_url.clone().flatten();
    let comkit_supplied = patch.comkit_url.is_some();
    let comkit_val = patch.comkit_url.clone().flatten();
    let briefing_supplied = patch.briefing.is_some();
    let briefing_val = patch.briefing.clone().flatten();

    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products \
         SET name             = COALESCE($2, name), \
             description      = CASE WHEN $3::BOOL  THEN $4  ELSE description END, \
             creative_concept = CASE WHEN $5::BOOL  THEN $6  ELSE creative_concept END, \
             landing_url      = CASE WHEN $7::BOOL  THEN $8  ELSE landing_url END, \
             comkit_url       = CASE WHEN $9::BOOL  THEN $10 ELSE comkit_url END, \
             countries        = COALESCE($11, countries), \
             hashtags         = COALESCE($12, hashtags), \
             sales_objectives = COALESCE($13, sales_objectives), \
             briefing         = CASE WHEN $14::BOOL THEN $15 ELSE briefing END, \
             updated_at       = NOW() \
         WHERE id = $1 \
         RETURNING id, name, description, creative_concept, landing_url, comkit_url, \
                   countries, hashtags, sales_objectives, briefing, created_at, updated_at",
    )
    .bind(id)
    .bind(&patch.name)
    .bind(description_supplied)
    .bind(description_val)
    .bind(concept_supplied)
    .bind(concept_val)
    .bind(landing_supplied)
    .bind(landing_val)
    .bind(comkit_supplied)
    .bind(comkit_val)
    .bind(&patch.countries)
    .bind(&patch.hashtags)
    .bind(&patch.sales_objectives)
    .bind(briefing_supplied)
    .bind(briefing_val)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a product. Posts and launches referencing it are detached by the
/// schema (`ON DELETE SET NULL`).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

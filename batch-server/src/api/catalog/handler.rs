//! Catalog API Handlers

use axum::extract::{Query, State};
use serde::Deserialize;
use shared::models::{ProductListing, TitleOption};
use shared::{AppError, ErrorCode};

use crate::api::{ApiResult, ok};
use crate::catalog::{CatalogReader, DOWNLOADS_PREFIX};
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub collection: Option<String>,
}

/// GET /api/titles - 标题列表
pub async fn titles(State(state): State<ServerState>) -> ApiResult<Vec<TitleOption>> {
    if let Some(reason) = &state.titles_error {
        return Err(AppError::with_message(
            ErrorCode::TitleCatalogUnavailable,
            reason.clone(),
        )
        .with_detail("path", state.config.titles_csv.display().to_string()));
    }
    ok(state.titles.all().to_vec())
}

/// GET /api/collections - 系列列表
pub async fn collections(State(state): State<ServerState>) -> ApiResult<Vec<String>> {
    ok(state.catalog.collections()?)
}

/// GET /api/products?collection= - 系列下的商品
pub async fn products(
    State(state): State<ServerState>,
    Query(query): Query<ProductsQuery>,
) -> ApiResult<Vec<ProductListing>> {
    let collection = query
        .collection
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::validation("collection is required").with_detail("field", "collection"))?;
    let products = state.catalog.products(&collection)?;
    ok(products
        .iter()
        .map(|p| CatalogReader::listing(p, DOWNLOADS_PREFIX))
        .collect())
}

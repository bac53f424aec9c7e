use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogMatch, CatalogQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    year: Option<i32>,
}

/// Direct catalog search, outside the recommendation pipeline
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> AppResult<Json<Vec<CatalogMatch>>> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;

    let query = params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("q required".to_string()))?;

    let query = CatalogQuery {
        query,
        year: params.year,
        locale: state.locale.clone(),
    };

    let matches = state.catalog.search(&query).await?;
    tracing::debug!(
        query = %query,
        catalog = state.catalog.name(),
        results = matches.len(),
        "Catalog search"
    );

    Ok(Json(matches))
}

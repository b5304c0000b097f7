// handlers/protected/property/search.rs - GET /search?query=

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::Property;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub records: Vec<Property>,
}

/// Substring match on address, APN or pincode. No match is an empty list.
pub async fn search_get(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResults> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter is required"))?;

    let records = state.store.search_properties(query).await?;
    Ok(ApiResponse::success(SearchResults { records }))
}

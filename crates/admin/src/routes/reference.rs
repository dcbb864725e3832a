//! Branch and customer lookups used by the booking and trip forms.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use lorry_desk_core::models::{Branch, Customer};

use crate::error::AppError;
use crate::state::AppState;

/// Build the reference data router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/branches", get(branches))
        .route("/api/customers", get(customers))
}

#[derive(Debug, Deserialize)]
pub struct CustomersQuery {
    /// Matches name or mobile, case-insensitively.
    pub search: Option<String>,
}

/// # Errors
///
/// Returns 502 if the store rejects the read.
pub async fn branches(State(state): State<AppState>) -> Result<Json<Vec<Branch>>, AppError> {
    let org = &state.config().organization_id;
    let mut branches = state.store().list_branches(org).await?;
    branches.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(branches))
}

/// # Errors
///
/// Returns 502 if the store rejects the read.
pub async fn customers(
    State(state): State<AppState>,
    Query(query): Query<CustomersQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let org = &state.config().organization_id;
    let customers = state.store().list_customers(org).await?;
    let needle = query
        .search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let matching = match needle {
        Some(needle) => customers
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&needle) || c.mobile.contains(&needle))
            .collect(),
        None => customers,
    };
    Ok(Json(matching))
}

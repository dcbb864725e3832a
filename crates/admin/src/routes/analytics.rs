//! Analytics route handlers.
//!
//! Every handler computes over a fresh snapshot of the booking register.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use lorry_desk_core::analytics::{
    DashboardSummary, DayBucket, MonthBucket, RevenueEntry, StatusDistribution,
};

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_DAYS: u32 = 30;
const DEFAULT_MONTHS: u32 = 6;

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/summary", get(summary))
        .route("/api/analytics/daily", get(daily))
        .route("/api/analytics/monthly", get(monthly))
        .route("/api/analytics/status", get(status))
        .route("/api/analytics/branches", get(branches))
        .route("/api/analytics/payment-types", get(payment_types))
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub months: Option<u32>,
}

// =============================================================================
// Handlers
// =============================================================================

/// # Errors
///
/// Returns 502 if the store rejects the read.
pub async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(state.analytics().summary(&ctx).await?))
}

/// # Errors
///
/// Returns 422 for a window outside the supported range.
pub async fn daily(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<Vec<DayBucket>>, AppError> {
    let ctx = state.query_context(None);
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    Ok(Json(state.analytics().daily(&ctx, days).await?))
}

/// # Errors
///
/// Returns 422 for a window outside the supported range.
pub async fn monthly(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthBucket>>, AppError> {
    let ctx = state.query_context(None);
    let months = query.months.unwrap_or(DEFAULT_MONTHS);
    Ok(Json(state.analytics().monthly(&ctx, months).await?))
}

/// # Errors
///
/// Returns 502 if the store rejects the read.
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusDistribution>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(state.analytics().status(&ctx).await?))
}

/// # Errors
///
/// Returns 502 if the store rejects the read.
pub async fn branches(State(state): State<AppState>) -> Result<Json<Vec<RevenueEntry>>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(state.analytics().branches(&ctx).await?))
}

/// # Errors
///
/// Returns 502 if the store rejects the read.
pub async fn payment_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<RevenueEntry>>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(state.analytics().payment_types(&ctx).await?))
}

//! HTTP route handlers for the admin JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check
//! GET  /api/tables/{table_id}               - Data table configuration
//!
//! # Bookings
//! GET  /api/bookings                        - Filtered, sorted, paginated register
//! POST /api/bookings                        - Create booking
//! GET  /api/bookings/export                 - CSV of the filtered register
//! GET  /api/bookings/{id}                   - Booking detail
//! PUT  /api/bookings/{id}                   - Modify open booking
//! POST /api/bookings/{id}/dispatch          - Move to in transit
//! POST /api/bookings/{id}/deliver           - Record proof of delivery
//! POST /api/bookings/{id}/cancel            - Cancel with reason
//!
//! # Articles
//! GET  /api/articles                        - Catalog
//! POST /api/articles                        - Create article
//! PUT  /api/articles/{id}                   - Edit article
//! GET  /api/articles/{id}/customer-rates    - Negotiated rates
//! POST /api/articles/bulk-rate/preview      - Preview bulk adjustment
//! POST /api/articles/bulk-rate/apply        - Apply bulk adjustment
//! POST /api/articles/import                 - CSV import
//! GET  /api/articles/export                 - CSV export
//!
//! # Trips
//! GET  /api/ogpls                           - Trip manifests
//! POST /api/ogpls                           - Load bookings onto a trip
//! GET  /api/ogpls/{id}                      - Manifest detail
//! POST /api/ogpls/{id}/unload               - Record unloading
//!
//! # Analytics
//! GET  /api/analytics/summary
//! GET  /api/analytics/daily?days=
//! GET  /api/analytics/monthly?months=
//! GET  /api/analytics/status
//! GET  /api/analytics/branches
//! GET  /api/analytics/payment-types
//!
//! # Reference data
//! GET  /api/branches
//! GET  /api/customers?search=
//! ```

pub mod analytics;
pub mod articles;
pub mod bookings;
pub mod ogpls;
pub mod reference;
pub mod tables;

use axum::{
    Router,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};

use chrono::NaiveDate;

use lorry_desk_core::BranchId;
use lorry_desk_core::filter::{DateRange, DateRangePreset};
use lorry_desk_core::sort::{SortDirection, SortField, SortState};

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(tables::router())
        .merge(bookings::router())
        .merge(articles::router())
        .merge(ogpls::router())
        .merge(analytics::router())
        .merge(reference::router())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Parse an optional query value, answering 400 on a bad one.
fn parse_query<T>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lorry_desk_core::filter::parse_filter_value(raw)
        .map_err(|e: T::Err| AppError::BadRequest(e.to_string()))
}

/// Sort state from `sort` and `dir` query values. A column without a
/// direction starts in its default direction.
fn parse_sort<F>(sort: Option<&str>, dir: Option<&str>) -> Result<SortState<F>, AppError>
where
    F: SortField + Default + std::str::FromStr,
    F::Err: std::fmt::Display,
{
    let field: F = parse_query(sort)?.unwrap_or_default();
    let direction = parse_query::<SortDirection>(dir)?.unwrap_or_else(|| field.default_direction());
    Ok(SortState::new(field, direction))
}

/// Date range from `range`, `start` and `end` query values. Dates without
/// a preset imply a custom range.
fn parse_date_range(
    range: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DateRange, AppError> {
    let preset = parse_query::<DateRangePreset>(range)?;
    Ok(match preset {
        Some(DateRangePreset::Custom) => DateRange::custom(start, end),
        None if start.is_some() || end.is_some() => DateRange::custom(start, end),
        Some(preset) => DateRange::preset(preset),
        None => DateRange::default(),
    })
}

/// Branch filter value; blank or `all` means every branch.
fn parse_branch(raw: Option<&str>) -> Option<BranchId> {
    raw.map(str::trim)
        .filter(|b| !b.is_empty() && *b != "all")
        .map(BranchId::new)
}

/// A CSV download.
fn csv_response(filename: &str, body: Vec<u8>) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

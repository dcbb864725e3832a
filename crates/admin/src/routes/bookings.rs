//! Booking register handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use lorry_desk_core::filter::BookingFilter;
use lorry_desk_core::models::{BookingView, CreateBookingInput, ProofOfDelivery, UpdateBookingInput};
use lorry_desk_core::sort::{BookingSortField, Page, SortState};
use lorry_desk_core::{BookingId, BookingStatus, PaymentType};

use super::{csv_response, parse_branch, parse_date_range, parse_query, parse_sort};
use crate::error::AppError;
use crate::import_export::export_bookings;
use crate::state::AppState;

/// Largest page a client may ask for.
const MAX_PER_PAGE: usize = 200;

/// Build the bookings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(index).post(create))
        .route("/api/bookings/export", get(export))
        .route("/api/bookings/{id}", get(show).put(modify))
        .route("/api/bookings/{id}/dispatch", post(dispatch))
        .route("/api/bookings/{id}/deliver", post(deliver))
        .route("/api/bookings/{id}/cancel", post(cancel))
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Filter, sort and page parameters for the register.
#[derive(Debug, Default, Deserialize)]
pub struct BookingsQuery {
    pub search: Option<String>,
    /// Date range preset, e.g. `today` or `last_week`.
    pub range: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: Option<String>,
    pub payment_type: Option<String>,
    pub branch: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl BookingsQuery {
    fn filter(&self) -> Result<BookingFilter, AppError> {
        Ok(BookingFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            date_range: parse_date_range(self.range.as_deref(), self.start, self.end)?,
            status: parse_query::<BookingStatus>(self.status.as_deref())?,
            payment_type: parse_query::<PaymentType>(self.payment_type.as_deref())?,
            branch: parse_branch(self.branch.as_deref()),
        })
    }

    fn sort(&self) -> Result<SortState<BookingSortField>, AppError> {
        parse_sort(self.sort.as_deref(), self.dir.as_deref())
    }
}

/// Body for a cancellation.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// List bookings.
///
/// # Errors
///
/// Returns 400 for unknown filter or sort values.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Page<BookingView>>, AppError> {
    let ctx = state.query_context(None);
    let per_page = query
        .per_page
        .unwrap_or(state.config().default_page_size)
        .min(MAX_PER_PAGE);
    let page = state
        .bookings()
        .list(&ctx, &query.filter()?, query.sort()?, query.page.unwrap_or(1), per_page)
        .await?;
    Ok(Json(page))
}

/// Download the filtered register as CSV.
///
/// # Errors
///
/// Returns 400 for unknown filter or sort values.
#[instrument(skip(state))]
pub async fn export(
    State(state): State<AppState>,
    Query(query): Query<BookingsQuery>,
) -> Result<Response, AppError> {
    let ctx = state.query_context(None);
    let records = state
        .bookings()
        .filtered(&ctx, &query.filter()?, query.sort()?)
        .await?;
    let mut body = Vec::new();
    export_bookings(&mut body, &records, &ctx).map_err(|e| AppError::Internal(e.to_string()))?;
    let filename = format!("bookings-{}.csv", ctx.today());
    Ok(csv_response(&filename, body))
}

/// # Errors
///
/// Returns 422 for invalid input.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateBookingInput>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let ctx = state.query_context(None);
    let view = state.bookings().create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// # Errors
///
/// Returns 404 for an unknown booking.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(state.bookings().get(&ctx, &BookingId::new(id)).await?))
}

/// # Errors
///
/// Returns 409 for a closed booking and 422 for invalid edits.
pub async fn modify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateBookingInput>,
) -> Result<Json<BookingView>, AppError> {
    let ctx = state.query_context(None);
    let view = state
        .bookings()
        .modify(&ctx, &BookingId::new(id), input)
        .await?;
    Ok(Json(view))
}

/// # Errors
///
/// Returns 409 unless the booking is booked.
pub async fn dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(state.bookings().dispatch(&ctx, &BookingId::new(id)).await?))
}

/// # Errors
///
/// Returns 409 unless the booking is in transit and 422 for an incomplete
/// proof of delivery.
pub async fn deliver(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(proof): Json<ProofOfDelivery>,
) -> Result<Json<BookingView>, AppError> {
    let ctx = state.query_context(None);
    let view = state
        .bookings()
        .deliver(&ctx, &BookingId::new(id), proof)
        .await?;
    Ok(Json(view))
}

/// # Errors
///
/// Returns 409 for a delivered or cancelled booking and 422 for a blank
/// reason.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<BookingView>, AppError> {
    let ctx = state.query_context(None);
    let view = state
        .bookings()
        .cancel(&ctx, &BookingId::new(id), &body.reason)
        .await?;
    Ok(Json(view))
}

//! Trip manifest handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use lorry_desk_core::OgplId;
use lorry_desk_core::filter::OgplFilter;
use lorry_desk_core::models::{CreateOgplInput, Ogpl, UnloadingEntry};

use super::{parse_branch, parse_date_range, parse_sort};
use crate::error::AppError;
use crate::state::AppState;

/// Build the OGPL router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ogpls", get(index).post(create))
        .route("/api/ogpls/{id}", get(show))
        .route("/api/ogpls/{id}/unload", post(unload))
}

/// Manifest list parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OgplsQuery {
    pub search: Option<String>,
    pub range: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Departure or arrival station.
    pub station: Option<String>,
    pub unloaded: Option<bool>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

/// Unloading submission: one entry per loaded booking.
#[derive(Debug, Deserialize)]
pub struct UnloadRequest {
    pub entries: Vec<UnloadingEntry>,
}

/// # Errors
///
/// Returns 400 for unknown filter or sort values.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<OgplsQuery>,
) -> Result<Json<Vec<Ogpl>>, AppError> {
    let ctx = state.query_context(None);
    let filter = OgplFilter {
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        date_range: parse_date_range(query.range.as_deref(), query.start, query.end)?,
        station: parse_branch(query.station.as_deref()),
        unloaded: query.unloaded,
    };
    let sort = parse_sort(query.sort.as_deref(), query.dir.as_deref())?;
    Ok(Json(state.ogpls().list(&ctx, &filter, sort).await?))
}

/// # Errors
///
/// Returns 404 for an unknown manifest.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ogpl>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(state.ogpls().get(&ctx, &OgplId::new(id)).await?))
}

/// Load bookings onto a new trip.
///
/// # Errors
///
/// Returns 422 for invalid input and 409 if any booking is not booked.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateOgplInput>,
) -> Result<(StatusCode, Json<Ogpl>), AppError> {
    let ctx = state.query_context(None);
    let ogpl = state.ogpls().create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(ogpl)))
}

/// # Errors
///
/// Returns 409 if already unloaded and 422 for incomplete entries.
pub async fn unload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UnloadRequest>,
) -> Result<Json<Ogpl>, AppError> {
    let ctx = state.query_context(None);
    let ogpl = state
        .ogpls()
        .unload(&ctx, &OgplId::new(id), body.entries)
        .await?;
    Ok(Json(ogpl))
}

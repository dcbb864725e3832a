//! Article catalog handlers, including bulk repricing and CSV transfer.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use lorry_desk_core::filter::ArticleFilter;
use lorry_desk_core::models::{Article, CreateArticleInput, CustomerRate, UpdateArticleInput};
use lorry_desk_core::pricing::RateAdjustment;
use lorry_desk_core::sort::{ArticleSortField, SortState};
use lorry_desk_core::ArticleId;

use super::{csv_response, parse_branch, parse_sort};
use crate::error::AppError;
use crate::import_export::export_articles;
use crate::services::{BulkApplied, BulkPreview};
use crate::state::AppState;

/// Build the articles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/articles", get(index).post(create))
        .route("/api/articles/export", get(export))
        .route("/api/articles/import", post(import))
        .route("/api/articles/bulk-rate/preview", post(bulk_preview))
        .route("/api/articles/bulk-rate/apply", post(bulk_apply))
        .route("/api/articles/{id}", put(update))
        .route("/api/articles/{id}/customer-rates", get(customer_rates))
}

/// Catalog filter and sort parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ArticlesQuery {
    pub search: Option<String>,
    pub branch: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

impl ArticlesQuery {
    fn filter(&self) -> ArticleFilter {
        ArticleFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            branch: parse_branch(self.branch.as_deref()),
        }
    }

    fn sort(&self) -> Result<SortState<ArticleSortField>, AppError> {
        parse_sort(self.sort.as_deref(), self.dir.as_deref())
    }
}

/// Bulk adjustment request: how to change rates and which articles.
#[derive(Debug, Deserialize)]
pub struct BulkRateRequest {
    pub adjustment: RateAdjustment,
    #[serde(default)]
    pub filter: ArticleFilter,
}

/// Target branch for an import.
#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub branch: Option<String>,
}

/// Result of a CSV import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub articles: Vec<Article>,
}

/// # Errors
///
/// Returns 400 for unknown sort values.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ArticlesQuery>,
) -> Result<Json<Vec<Article>>, AppError> {
    let ctx = state.query_context(None);
    let articles = state
        .articles()
        .list(&ctx, &query.filter(), query.sort()?)
        .await?;
    Ok(Json(articles))
}

/// # Errors
///
/// Returns 422 for invalid input.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateArticleInput>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    let ctx = state.query_context(None);
    let article = state.articles().create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// # Errors
///
/// Returns 404 for an unknown article and 422 for invalid edits.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateArticleInput>,
) -> Result<Json<Article>, AppError> {
    let ctx = state.query_context(None);
    let article = state
        .articles()
        .update(&ctx, &ArticleId::new(id), input)
        .await?;
    Ok(Json(article))
}

/// # Errors
///
/// Returns 404 for an unknown article.
pub async fn customer_rates(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CustomerRate>>, AppError> {
    let ctx = state.query_context(None);
    Ok(Json(
        state
            .articles()
            .customer_rates(&ctx, &ArticleId::new(id))
            .await?,
    ))
}

/// # Errors
///
/// Returns error if the store rejects the read.
pub async fn bulk_preview(
    State(state): State<AppState>,
    Json(body): Json<BulkRateRequest>,
) -> Result<Json<BulkPreview>, AppError> {
    let ctx = state.query_context(None);
    let preview = state
        .articles()
        .preview_bulk(&ctx, &body.filter, body.adjustment)
        .await?;
    Ok(Json(preview))
}

/// # Errors
///
/// Returns 502 if the store rejects the update; no rate changes then.
#[instrument(skip(state, body))]
pub async fn bulk_apply(
    State(state): State<AppState>,
    Json(body): Json<BulkRateRequest>,
) -> Result<Json<BulkApplied>, AppError> {
    let ctx = state.query_context(None);
    let applied = state
        .articles()
        .apply_bulk(&ctx, &body.filter, body.adjustment)
        .await?;
    Ok(Json(applied))
}

/// Import a CSV body into `?branch=` (or the configured default branch).
///
/// # Errors
///
/// Returns 400 without a branch and 422 with per-line problems.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn import(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let ctx = state.query_context(parse_branch(query.branch.as_deref()));
    let branch = ctx
        .branch_id
        .clone()
        .ok_or_else(|| AppError::BadRequest("branch is required for an import".to_string()))?;
    let articles = state.articles().import_csv(&ctx, &branch, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            imported: articles.len(),
            articles,
        }),
    ))
}

/// # Errors
///
/// Returns 400 for unknown sort values.
pub async fn export(
    State(state): State<AppState>,
    Query(query): Query<ArticlesQuery>,
) -> Result<Response, AppError> {
    let ctx = state.query_context(None);
    let articles = state
        .articles()
        .list(&ctx, &query.filter(), query.sort()?)
        .await?;
    let mut body = Vec::new();
    export_articles(&mut body, &articles).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(csv_response("articles.csv", body))
}

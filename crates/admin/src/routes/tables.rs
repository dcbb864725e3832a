//! Data table configuration handlers.

use axum::{Json, Router, extract::Path, routing::get};

use crate::components::{DataTableConfig, TABLE_IDS, table_config};
use crate::error::AppError;
use crate::state::AppState;

/// Build the tables router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/tables/{table_id}", get(show))
}

/// Columns, filters and bulk actions for one table.
///
/// # Errors
///
/// Returns 404 for an unknown table.
pub async fn show(Path(table_id): Path<String>) -> Result<Json<DataTableConfig>, AppError> {
    table_config(&table_id).map(Json).ok_or_else(|| {
        AppError::NotFound(format!(
            "table {table_id} (known: {})",
            TABLE_IDS.join(", ")
        ))
    })
}

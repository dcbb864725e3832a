//! Article CSV import.

use std::io::Write;
use std::path::Path;

use tracing::info;

use lorry_desk_admin::error::AppError;
use lorry_desk_admin::import_export::{ImportError, parse_articles};
use lorry_desk_core::{BranchId, format_amount};

use super::{CliError, Dataset};

/// Check an article CSV for `branch`. With a dataset the rows are also
/// imported into it; without one the file is only validated.
///
/// Every bad row is listed on `out` before the error is returned.
///
/// # Errors
///
/// Returns `CliError::Import` if any row is invalid; nothing is imported then.
pub async fn articles<W: Write>(
    out: &mut W,
    csv_path: &Path,
    branch: &BranchId,
    target: Option<&Dataset>,
) -> Result<usize, CliError> {
    let body = std::fs::read(csv_path)?;

    let imported = match target {
        Some(data) => data
            .articles()
            .import_csv(&data.ctx, branch, &body)
            .await
            .map(|articles| {
                articles
                    .into_iter()
                    .map(|a| (a.name, a.base_rate))
                    .collect::<Vec<_>>()
            })
            .map_err(|e| match e {
                AppError::Import(inner) => CliError::Import(inner),
                other => CliError::App(other),
            }),
        None => parse_articles(body.as_slice(), branch)
            .map(|inputs| {
                inputs
                    .into_iter()
                    .map(|i| (i.name, i.base_rate))
                    .collect::<Vec<_>>()
            })
            .map_err(CliError::Import),
    };

    let rows = match imported {
        Ok(rows) => rows,
        Err(CliError::Import(ImportError::Rows(problems))) => {
            for problem in &problems {
                writeln!(out, "{problem}")?;
            }
            return Err(CliError::Import(ImportError::Rows(problems)));
        }
        Err(e) => return Err(e),
    };

    for (name, rate) in &rows {
        writeln!(out, "{name:<24}{:>14}", format_amount(*rate))?;
    }
    info!(
        rows = rows.len(),
        branch = %branch,
        imported = target.is_some(),
        "Article CSV accepted"
    );
    Ok(rows.len())
}

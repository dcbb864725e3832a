//! Bulk rate adjustment over a catalog fixture.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use lorry_desk_admin::import_export::export_articles;
use lorry_desk_core::filter::ArticleFilter;
use lorry_desk_core::format_amount;
use lorry_desk_core::pricing::RateAdjustment;
use lorry_desk_core::sort::{ArticleSortField, SortField, SortState};

use super::{CliError, Dataset};

/// Print the projected rates. With `apply_to`, reprice the in-memory
/// catalog and write it to that path as CSV.
///
/// # Errors
///
/// Returns `CliError` if the store rejects the update or the output cannot
/// be written.
pub async fn run<W: Write>(
    out: &mut W,
    data: &Dataset,
    filter: &ArticleFilter,
    adjustment: RateAdjustment,
    apply_to: Option<&Path>,
) -> Result<(), CliError> {
    let service = data.articles();
    let preview = service.preview_bulk(&data.ctx, filter, adjustment).await?;

    writeln!(
        out,
        "{:<24}{:>14}{:>14}{:>10}",
        "Article", "Current", "New", "Change"
    )?;
    for row in &preview.articles {
        writeln!(
            out,
            "{:<24}{:>14}{:>14}{:>9}%",
            row.name,
            format_amount(row.rate.old_rate),
            format_amount(row.rate.new_rate),
            row.rate.percent_change.round_dp(1)
        )?;
    }
    let summary = &preview.summary;
    writeln!(
        out,
        "{} article(s): {} up, {} down, {} floored at zero",
        summary.articles, summary.increased, summary.decreased, summary.floored_at_zero
    )?;

    let Some(path) = apply_to else {
        return Ok(());
    };
    let applied = service.apply_bulk(&data.ctx, filter, adjustment).await?;
    let by_name = SortState::new(
        ArticleSortField::Name,
        ArticleSortField::Name.default_direction(),
    );
    let catalog = service.list(&data.ctx, &ArticleFilter::default(), by_name).await?;
    export_articles(File::create(path)?, &catalog)
        .map_err(|e| CliError::Invalid(format!("failed to write {}: {e}", path.display())))?;
    info!(updated = applied.updated, path = %path.display(), "Repriced catalog written");
    Ok(())
}

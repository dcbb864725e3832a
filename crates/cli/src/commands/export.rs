//! CSV export from a fixture.

use std::fs::File;
use std::path::Path;

use tracing::info;

use lorry_desk_admin::import_export::{export_articles, export_bookings};
use lorry_desk_core::filter::{ArticleFilter, BookingFilter};
use lorry_desk_core::sort::{ArticleSortField, BookingSortField, SortField, SortState};

use super::{CliError, Dataset};

/// Write the filtered booking register to `path`, newest first.
///
/// # Errors
///
/// Returns `CliError` if the output file cannot be written.
pub async fn bookings(
    data: &Dataset,
    filter: &BookingFilter,
    path: &Path,
) -> Result<usize, CliError> {
    let newest_first = SortState::new(
        BookingSortField::CreatedAt,
        BookingSortField::CreatedAt.default_direction(),
    );
    let records = data
        .bookings()
        .filtered(&data.ctx, filter, newest_first)
        .await?;
    export_bookings(File::create(path)?, &records, &data.ctx).map_err(|e| write_failed(path, &e))?;
    info!(rows = records.len(), path = %path.display(), "Bookings exported");
    Ok(records.len())
}

/// Write the whole catalog to `path`, by name.
///
/// # Errors
///
/// Returns `CliError` if the output file cannot be written.
pub async fn articles(data: &Dataset, path: &Path) -> Result<usize, CliError> {
    let by_name = SortState::new(
        ArticleSortField::Name,
        ArticleSortField::Name.default_direction(),
    );
    let catalog = data
        .articles()
        .list(&data.ctx, &ArticleFilter::default(), by_name)
        .await?;
    export_articles(File::create(path)?, &catalog).map_err(|e| write_failed(path, &e))?;
    info!(rows = catalog.len(), path = %path.display(), "Articles exported");
    Ok(catalog.len())
}

fn write_failed(path: &Path, err: &csv::Error) -> CliError {
    CliError::Invalid(format!("failed to write {}: {err}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lorry_desk_core::PaymentType;

    use super::*;
    use crate::commands::fixtures::{SEED, booking_input, temp_file};

    #[tokio::test]
    async fn test_export_filtered_bookings() {
        let seed = temp_file("seed.json", SEED);
        let data = Dataset::load(&seed).unwrap();
        let bookings = data.bookings();
        bookings.create(&data.ctx, booking_input("Paid")).await.unwrap();
        bookings.create(&data.ctx, booking_input("To Pay")).await.unwrap();

        let target = seed.with_file_name("to-pay.csv");
        let filter = BookingFilter {
            payment_type: Some(PaymentType::ToPay),
            ..BookingFilter::default()
        };
        assert_eq!(super::bookings(&data, &filter, &target).await.unwrap(), 1);

        let csv = std::fs::read_to_string(&target).unwrap();
        let rows: Vec<_> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("lr_number,booking_date"));
        assert!(rows[1].starts_with("LR000002,"));
        assert!(rows[1].contains("Ravi Traders"));
    }

    #[tokio::test]
    async fn test_export_articles_by_name() {
        let seed = temp_file("seed.json", SEED);
        let data = Dataset::load(&seed).unwrap();
        let target = seed.with_file_name("articles.csv");
        assert_eq!(articles(&data, &target).await.unwrap(), 2);

        let csv = std::fs::read_to_string(&target).unwrap();
        let names: Vec<_> = csv
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap().to_owned())
            .collect();
        assert_eq!(names, ["Cartons", "Drums"]);
    }
}

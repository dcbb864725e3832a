//! Dashboard figures computed over a fresh snapshot of the booking register.

use std::sync::Arc;

use tracing::debug;

use lorry_desk_core::QueryContext;
use lorry_desk_core::analytics::{
    DashboardSummary, DayBucket, MonthBucket, RevenueEntry, StatusDistribution, aggregate_by_day,
    aggregate_by_month, revenue_by_branch, revenue_by_payment_type, status_distribution,
    summarize,
};
use lorry_desk_core::models::BookingView;

use crate::db::{DataStore, Scope};
use crate::error::AppError;

/// Longest daily trend served.
pub const MAX_DAYS: u32 = 366;
/// Longest monthly trend served.
pub const MAX_MONTHS: u32 = 36;

pub struct AnalyticsService {
    store: Arc<dyn DataStore>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    async fn snapshot(&self, ctx: &QueryContext) -> Result<Vec<BookingView>, AppError> {
        let records = self.store.list_bookings(&Scope::from(ctx)).await?;
        debug!(records = records.len(), "analytics snapshot");
        Ok(records)
    }

    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn summary(&self, ctx: &QueryContext) -> Result<DashboardSummary, AppError> {
        Ok(summarize(&self.snapshot(ctx).await?, ctx))
    }

    /// Zero-filled daily buckets ending today.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` unless `1 <= days <= MAX_DAYS`.
    pub async fn daily(&self, ctx: &QueryContext, days: u32) -> Result<Vec<DayBucket>, AppError> {
        check_window("days", days, MAX_DAYS)?;
        Ok(aggregate_by_day(&self.snapshot(ctx).await?, days, ctx))
    }

    /// Zero-filled monthly buckets ending this month.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` unless `1 <= months <= MAX_MONTHS`.
    pub async fn monthly(
        &self,
        ctx: &QueryContext,
        months: u32,
    ) -> Result<Vec<MonthBucket>, AppError> {
        check_window("months", months, MAX_MONTHS)?;
        Ok(aggregate_by_month(&self.snapshot(ctx).await?, months, ctx))
    }

    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn status(&self, ctx: &QueryContext) -> Result<StatusDistribution, AppError> {
        Ok(status_distribution(&self.snapshot(ctx).await?))
    }

    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn branches(&self, ctx: &QueryContext) -> Result<Vec<RevenueEntry>, AppError> {
        Ok(revenue_by_branch(&self.snapshot(ctx).await?))
    }

    /// # Errors
    ///
    /// Returns error if the store rejects the read.
    pub async fn payment_types(&self, ctx: &QueryContext) -> Result<Vec<RevenueEntry>, AppError> {
        Ok(revenue_by_payment_type(&self.snapshot(ctx).await?))
    }
}

fn check_window(field: &str, value: u32, max: u32) -> Result<(), AppError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(AppError::validation(
            field,
            format!("must be between 1 and {max}, got {value}"),
        ))
    }
}

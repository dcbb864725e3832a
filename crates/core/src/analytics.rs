//! Time-bucketed and categorical aggregation for dashboard charts.
//!
//! Bucket series are zero-filled and look backward from `ctx.now`, so a chart
//! never shows gaps. Records outside the window are skipped, never clamped.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::context::QueryContext;
use crate::models::BookingView;
use crate::types::{BookingStatus, PaymentType};

/// Group label for records whose relation is not resolved.
pub const UNKNOWN_LABEL: &str = "Unknown";

// =============================================================================
// Daily
// =============================================================================

/// Bookings created on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub count: usize,
    pub delivered_count: usize,
    pub revenue: Decimal,
}

impl DayBucket {
    const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            delivered_count: 0,
            revenue: Decimal::ZERO,
        }
    }

    /// Bucket key, e.g. `2024-03-15`.
    #[must_use]
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// `days` consecutive day buckets ending today, oldest first.
#[must_use]
pub fn aggregate_by_day(records: &[BookingView], days: u32, ctx: &QueryContext) -> Vec<DayBucket> {
    let today = ctx.today();
    let Some(first) = today.checked_sub_signed(Duration::days(i64::from(days) - 1)) else {
        return Vec::new();
    };
    let mut buckets: Vec<DayBucket> = first
        .iter_days()
        .take(days as usize)
        .map(DayBucket::empty)
        .collect();

    for view in records {
        let booking = &view.booking;
        let date = ctx.local_date(booking.created_at);
        let Ok(offset) = usize::try_from((date - first).num_days()) else {
            continue;
        };
        if let Some(bucket) = buckets.get_mut(offset) {
            bucket.count += 1;
            if booking.status == BookingStatus::Delivered {
                bucket.delivered_count += 1;
            }
            bucket.revenue += booking.total_amount;
        }
    }
    buckets
}

// =============================================================================
// Monthly
// =============================================================================

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl MonthKey {
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month before this one.
    #[must_use]
    pub const fn pred(self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Display label, e.g. `Mar 2024`. Never used for lookups.
    #[must_use]
    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).map_or_else(
            || format!("{:04}-{:02}", self.year, self.month),
            |d| d.format("%b %Y").to_string(),
        )
    }
}

/// Bookings created in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub key: MonthKey,
    pub label: String,
    pub count: usize,
    pub delivered_count: usize,
    pub revenue: Decimal,
}

/// `months` consecutive month buckets ending with the current month, oldest first.
#[must_use]
pub fn aggregate_by_month(
    records: &[BookingView],
    months: u32,
    ctx: &QueryContext,
) -> Vec<MonthBucket> {
    let mut keys = Vec::with_capacity(months as usize);
    let mut key = MonthKey::of(ctx.today());
    for _ in 0..months {
        keys.push(key);
        key = key.pred();
    }
    keys.reverse();

    let index: HashMap<MonthKey, usize> = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let mut buckets: Vec<MonthBucket> = keys
        .into_iter()
        .map(|key| MonthBucket {
            key,
            label: key.label(),
            count: 0,
            delivered_count: 0,
            revenue: Decimal::ZERO,
        })
        .collect();

    for view in records {
        let booking = &view.booking;
        let key = MonthKey::of(ctx.local_date(booking.created_at));
        if let Some(bucket) = index.get(&key).and_then(|&i| buckets.get_mut(i)) {
            bucket.count += 1;
            if booking.status == BookingStatus::Delivered {
                bucket.delivered_count += 1;
            }
            bucket.revenue += booking.total_amount;
        }
    }
    buckets
}

// =============================================================================
// Status Distribution
// =============================================================================

/// Count and amount for one status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: String,
    pub count: usize,
    pub amount: Decimal,
}

/// Bookings per status. Known statuses always appear, in lifecycle order;
/// unrecognized values are appended as they are first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDistribution {
    pub entries: Vec<StatusEntry>,
}

impl Default for StatusDistribution {
    fn default() -> Self {
        Self {
            entries: BookingStatus::ALL
                .iter()
                .map(|s| StatusEntry {
                    status: s.as_str().to_owned(),
                    count: 0,
                    amount: Decimal::ZERO,
                })
                .collect(),
        }
    }
}

impl StatusDistribution {
    /// Tally raw `(status, amount)` pairs.
    pub fn from_statuses<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Decimal)>,
    {
        let mut dist = Self::default();
        for (status, amount) in items {
            dist.add(status, amount);
        }
        dist
    }

    fn add(&mut self, status: &str, amount: Decimal) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.status == status) {
            entry.count += 1;
            entry.amount += amount;
        } else {
            self.entries.push(StatusEntry {
                status: status.to_owned(),
                count: 1,
                amount,
            });
        }
    }

    #[must_use]
    pub fn count(&self, status: &str) -> usize {
        self.entries
            .iter()
            .find(|e| e.status == status)
            .map_or(0, |e| e.count)
    }

    #[must_use]
    pub fn amount(&self, status: &str) -> Decimal {
        self.entries
            .iter()
            .find(|e| e.status == status)
            .map_or(Decimal::ZERO, |e| e.amount)
    }
}

#[must_use]
pub fn status_distribution(records: &[BookingView]) -> StatusDistribution {
    StatusDistribution::from_statuses(
        records
            .iter()
            .map(|v| (v.booking.status.as_str(), v.booking.total_amount)),
    )
}

// =============================================================================
// Categorical Revenue
// =============================================================================

/// Summed amount for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueEntry {
    pub name: String,
    pub count: usize,
    pub amount: Decimal,
}

fn group_revenue<'a, I>(items: I) -> Vec<RevenueEntry>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    let mut entries: Vec<RevenueEntry> = Vec::new();
    for (name, amount) in items {
        if let Some(entry) = entries.iter_mut().find(|e| e.name == name) {
            entry.count += 1;
            entry.amount += amount;
        } else {
            entries.push(RevenueEntry {
                name: name.to_owned(),
                count: 1,
                amount,
            });
        }
    }
    // Stable: equal amounts keep first-seen order.
    entries.sort_by(|a, b| b.amount.cmp(&a.amount));
    entries
}

/// Revenue by origin branch name, largest first.
#[must_use]
pub fn revenue_by_branch(records: &[BookingView]) -> Vec<RevenueEntry> {
    group_revenue(records.iter().map(|v| {
        (
            v.from_branch_name().unwrap_or(UNKNOWN_LABEL),
            v.booking.total_amount,
        )
    }))
}

/// Revenue by payment type, largest first.
#[must_use]
pub fn revenue_by_payment_type(records: &[BookingView]) -> Vec<RevenueEntry> {
    group_revenue(
        records
            .iter()
            .map(|v| (v.booking.payment_type.as_str(), v.booking.total_amount)),
    )
}

// =============================================================================
// Summary
// =============================================================================

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DashboardSummary {
    pub total_bookings: usize,
    /// Sum of every booking's total, cancelled included.
    pub gross_amount: Decimal,
    /// Sum over bookings that were not cancelled.
    pub revenue: Decimal,
    /// `revenue` divided by the number of bookings that were not cancelled.
    pub average_booking_value: Decimal,
    pub booked: usize,
    pub in_transit: usize,
    pub delivered: usize,
    pub cancelled: usize,
    /// "To Pay" freight still to be collected on open bookings.
    pub to_pay_outstanding: Decimal,
    pub today_bookings: usize,
    pub today_revenue: Decimal,
}

#[must_use]
pub fn summarize(records: &[BookingView], ctx: &QueryContext) -> DashboardSummary {
    let today = ctx.today();
    let mut summary = DashboardSummary::default();

    for view in records {
        let booking = &view.booking;
        let amount = booking.total_amount;
        summary.total_bookings += 1;
        summary.gross_amount += amount;

        match booking.status {
            BookingStatus::Booked => summary.booked += 1,
            BookingStatus::InTransit => summary.in_transit += 1,
            BookingStatus::Delivered => summary.delivered += 1,
            BookingStatus::Cancelled => summary.cancelled += 1,
        }
        if booking.status != BookingStatus::Cancelled {
            summary.revenue += amount;
        }
        if booking.status.is_open() && booking.payment_type == PaymentType::ToPay {
            summary.to_pay_outstanding += amount;
        }
        if ctx.local_date(booking.created_at) == today {
            summary.today_bookings += 1;
            if booking.status != BookingStatus::Cancelled {
                summary.today_revenue += amount;
            }
        }
    }

    let earning = summary.total_bookings - summary.cancelled;
    if earning > 0 {
        summary.average_booking_value = summary.revenue / Decimal::from(earning);
    }
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::BranchRef;
    use crate::models::booking::tests::booking;
    use crate::types::{BranchId, OrganizationId};

    fn ctx() -> QueryContext {
        QueryContext::new(
            OrganizationId::new("org-1"),
            Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap(),
        )
    }

    fn view(status: BookingStatus, amount: Decimal, created: DateTime<Utc>) -> BookingView {
        let mut b = booking();
        b.status = status;
        b.total_amount = amount;
        b.created_at = created;
        BookingView::new(b)
    }

    fn at(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, 9, 0, 0).unwrap()
    }

    // =========================================================================
    // Buckets
    // =========================================================================

    #[test]
    fn test_empty_day_series_is_zero_filled() {
        let buckets = aggregate_by_day(&[], 30, &ctx());
        assert_eq!(buckets.len(), 30);
        assert!(buckets.iter().all(|b| b.count == 0 && b.revenue.is_zero()));
        assert_eq!(buckets.last().unwrap().key(), "2024-03-20");
        assert_eq!(buckets.first().unwrap().key(), "2024-02-20");
    }

    #[test]
    fn test_day_buckets_skip_out_of_window() {
        let records = vec![
            view(BookingStatus::Delivered, dec!(100), at(3, 20)),
            view(BookingStatus::Booked, dec!(50), at(3, 20)),
            view(BookingStatus::Booked, dec!(70), at(3, 18)),
            view(BookingStatus::Booked, dec!(999), at(3, 10)),
            view(BookingStatus::Booked, dec!(999), at(3, 21)),
        ];
        let buckets = aggregate_by_day(&records, 7, &ctx());
        assert_eq!(buckets.len(), 7);

        let today = buckets.last().unwrap();
        assert_eq!(today.count, 2);
        assert_eq!(today.delivered_count, 1);
        assert_eq!(today.revenue, dec!(150));

        let total: usize = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_zero_days_is_empty() {
        assert!(aggregate_by_day(&[], 0, &ctx()).is_empty());
    }

    #[test]
    fn test_month_buckets_cross_year() {
        let records = vec![
            view(BookingStatus::Delivered, dec!(10), at(3, 1)),
            view(
                BookingStatus::Booked,
                dec!(20),
                Utc.with_ymd_and_hms(2023, 12, 31, 9, 0, 0).unwrap(),
            ),
            view(
                BookingStatus::Booked,
                dec!(40),
                Utc.with_ymd_and_hms(2023, 11, 30, 9, 0, 0).unwrap(),
            ),
        ];
        let buckets = aggregate_by_month(&records, 4, &ctx());
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Dec 2023", "Jan 2024", "Feb 2024", "Mar 2024"]);
        assert_eq!(buckets[0].revenue, dec!(20));
        assert_eq!(buckets[3].delivered_count, 1);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_month_key_pred_wraps() {
        let jan = MonthKey { year: 2024, month: 1 };
        assert_eq!(jan.pred(), MonthKey { year: 2023, month: 12 });
        assert!(jan.pred() < jan);
    }

    // =========================================================================
    // Distribution
    // =========================================================================

    #[test]
    fn test_status_distribution_scenario() {
        let records = vec![
            view(BookingStatus::Delivered, dec!(100), at(3, 1)),
            view(BookingStatus::Booked, dec!(50), at(3, 1)),
            view(BookingStatus::Cancelled, dec!(30), at(3, 1)),
        ];
        let dist = status_distribution(&records);
        assert_eq!(dist.count("booked"), 1);
        assert_eq!(dist.count("in_transit"), 0);
        assert_eq!(dist.count("delivered"), 1);
        assert_eq!(dist.count("cancelled"), 1);
        assert_eq!(dist.amount("delivered"), dec!(100));
        assert_eq!(dist.entries.len(), 4);
    }

    #[test]
    fn test_unknown_status_gets_its_own_entry() {
        let dist = StatusDistribution::from_statuses([
            ("booked", dec!(5)),
            ("on_hold", dec!(7)),
            ("on_hold", dec!(3)),
        ]);
        assert_eq!(dist.entries.len(), 5);
        assert_eq!(dist.count("on_hold"), 2);
        assert_eq!(dist.amount("on_hold"), dec!(10));
        assert_eq!(dist.entries[4].status, "on_hold");
    }

    #[test]
    fn test_revenue_by_branch_with_unknown() {
        let mut mumbai = view(BookingStatus::Booked, dec!(100), at(3, 1));
        mumbai.from_branch_details = Some(BranchRef {
            id: BranchId::new("br-mum"),
            name: "Mumbai".to_owned(),
            code: None,
            city: None,
        });
        let mut mumbai2 = mumbai.clone();
        mumbai2.booking.total_amount = dec!(25);
        let orphan = view(BookingStatus::Booked, dec!(300), at(3, 1));

        let entries = revenue_by_branch(&[mumbai, orphan, mumbai2]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, UNKNOWN_LABEL);
        assert_eq!(entries[0].amount, dec!(300));
        assert_eq!(entries[1].name, "Mumbai");
        assert_eq!(entries[1].count, 2);
        assert_eq!(entries[1].amount, dec!(125));
    }

    #[test]
    fn test_revenue_by_payment_type_sorted_desc() {
        let mut to_pay = view(BookingStatus::Booked, dec!(80), at(3, 1));
        to_pay.booking.payment_type = PaymentType::ToPay;
        let paid = view(BookingStatus::Booked, dec!(20), at(3, 1));
        let entries = revenue_by_payment_type(&[paid, to_pay]);
        assert_eq!(entries[0].name, "To Pay");
        assert_eq!(entries[1].name, "Paid");
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn test_summarize() {
        let mut to_pay = view(BookingStatus::InTransit, dec!(60), at(3, 20));
        to_pay.booking.payment_type = PaymentType::ToPay;
        let records = vec![
            view(BookingStatus::Delivered, dec!(100), at(3, 1)),
            view(BookingStatus::Cancelled, dec!(30), at(3, 20)),
            to_pay,
        ];
        let summary = summarize(&records, &ctx());
        assert_eq!(summary.total_bookings, 3);
        assert_eq!(summary.gross_amount, dec!(190));
        assert_eq!(summary.revenue, dec!(160));
        assert_eq!(summary.average_booking_value, dec!(80));
        assert_eq!(summary.in_transit, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.to_pay_outstanding, dec!(60));
        assert_eq!(summary.today_bookings, 2);
        assert_eq!(summary.today_revenue, dec!(60));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], &ctx());
        assert_eq!(summary, DashboardSummary::default());
    }
}

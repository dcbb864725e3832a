//! Multi-criteria filtering for bookings, articles and OGPLs.
//!
//! Every active predicate is ANDed. Filters never reorder their input and
//! never fail: missing optional fields simply do not match a search.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::context::QueryContext;
use crate::models::{Article, BookingView, Ogpl};
use crate::types::{BookingStatus, BranchId, ParseEnumError, PaymentType};

// =============================================================================
// Date Ranges
// =============================================================================

/// Named date windows offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateRangePreset {
    #[default]
    All,
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    #[serde(rename = "last_3_months")]
    Last3Months,
    Custom,
}

impl DateRangePreset {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::LastWeek => "last_week",
            Self::LastMonth => "last_month",
            Self::Last3Months => "last_3_months",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for DateRangePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DateRangePreset {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "last_week" | "week" => Ok(Self::LastWeek),
            "last_month" | "month" => Ok(Self::LastMonth),
            "last_3_months" | "3months" => Ok(Self::Last3Months),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseEnumError {
                kind: "date range",
                value: s.to_owned(),
            }),
        }
    }
}

/// A preset plus the bounds used when it is [`DateRangePreset::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DateRange {
    #[serde(default)]
    pub preset: DateRangePreset,
    /// First included day (custom only).
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last included day (custom only); the whole day is included.
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub const fn preset(preset: DateRangePreset) -> Self {
        Self {
            preset,
            start: None,
            end: None,
        }
    }

    /// Custom range; either side may be open.
    #[must_use]
    pub const fn custom(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            preset: DateRangePreset::Custom,
            start,
            end,
        }
    }

    /// Lower bound of a rolling window.
    fn rolling_floor(self, ctx: &QueryContext) -> Option<DateTime<Utc>> {
        match self.preset {
            DateRangePreset::LastWeek => Some(ctx.now - Duration::days(7)),
            DateRangePreset::LastMonth => ctx.now.checked_sub_months(Months::new(1)),
            DateRangePreset::Last3Months => ctx.now.checked_sub_months(Months::new(3)),
            _ => None,
        }
    }

    /// Whether a timestamp falls inside the range.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>, ctx: &QueryContext) -> bool {
        match self.preset {
            DateRangePreset::All => true,
            DateRangePreset::Today => ctx.local_date(at) == ctx.today(),
            DateRangePreset::Yesterday => ctx
                .today()
                .pred_opt()
                .is_some_and(|yesterday| ctx.local_date(at) == yesterday),
            DateRangePreset::LastWeek
            | DateRangePreset::LastMonth
            | DateRangePreset::Last3Months => {
                self.rolling_floor(ctx).is_none_or(|floor| at >= floor)
            }
            DateRangePreset::Custom => {
                self.start.is_none_or(|start| at >= ctx.start_of_day(start))
                    && self.end.is_none_or(|end| at <= ctx.end_of_day(end))
            }
        }
    }

    /// Whether a calendar date falls inside the range.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate, ctx: &QueryContext) -> bool {
        match self.preset {
            DateRangePreset::All => true,
            DateRangePreset::Today => date == ctx.today(),
            DateRangePreset::Yesterday => ctx.today().pred_opt() == Some(date),
            DateRangePreset::LastWeek
            | DateRangePreset::LastMonth
            | DateRangePreset::Last3Months => self
                .rolling_floor(ctx)
                .is_none_or(|floor| date >= ctx.local_date(floor)),
            DateRangePreset::Custom => {
                self.start.is_none_or(|start| date >= start)
                    && self.end.is_none_or(|end| date <= end)
            }
        }
    }
}

/// Parse an optional categorical filter value where `"all"` or blank means no filter.
///
/// # Errors
///
/// Propagates the value's own parse error.
pub fn parse_filter_value<T>(raw: Option<&str>) -> Result<Option<T>, T::Err>
where
    T: std::str::FromStr,
{
    match raw.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn normalized(search: Option<&str>) -> Option<String> {
    search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Bookings
// =============================================================================

/// Booking list filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookingFilter {
    /// Free text over LR number, party names and mobiles.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
    /// Matches bookings leaving from or going to this branch.
    #[serde(default)]
    pub branch: Option<BranchId>,
}

impl BookingFilter {
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub const fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    #[must_use]
    pub fn with_branch(mut self, branch: BranchId) -> Self {
        self.branch = Some(branch);
        self
    }

    /// Whether a booking passes every active predicate.
    #[must_use]
    pub fn matches(&self, view: &BookingView, ctx: &QueryContext) -> bool {
        let booking = &view.booking;
        if booking.organization_id != ctx.organization_id {
            return false;
        }
        if let Some(needle) = normalized(self.search.as_deref()) {
            let hit = booking.lr_number.to_lowercase().contains(&needle)
                || contains_ci(view.sender_name(), &needle)
                || contains_ci(view.receiver_name(), &needle)
                || contains_ci(view.sender_mobile(), &needle)
                || contains_ci(view.receiver_mobile(), &needle);
            if !hit {
                return false;
            }
        }
        if !self.date_range.contains(booking.created_at, ctx) {
            return false;
        }
        if self.status.is_some_and(|s| s != booking.status) {
            return false;
        }
        if self.payment_type.is_some_and(|p| p != booking.payment_type) {
            return false;
        }
        self.branch
            .as_ref()
            .is_none_or(|b| *b == booking.from_branch || *b == booking.to_branch)
    }
}

/// Bookings passing `filter`, in input order.
#[must_use]
pub fn filter_bookings(
    records: &[BookingView],
    filter: &BookingFilter,
    ctx: &QueryContext,
) -> Vec<BookingView> {
    records
        .iter()
        .filter(|view| filter.matches(view, ctx))
        .cloned()
        .collect()
}

// =============================================================================
// Articles
// =============================================================================

/// Article catalog filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArticleFilter {
    /// Free text over name, description and HSN code.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub branch: Option<BranchId>,
}

impl ArticleFilter {
    #[must_use]
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(needle) = normalized(self.search.as_deref()) {
            let hit = article.name.to_lowercase().contains(&needle)
                || contains_ci(article.description.as_deref(), &needle)
                || contains_ci(article.hsn_code.as_deref(), &needle);
            if !hit {
                return false;
            }
        }
        self.branch.as_ref().is_none_or(|b| *b == article.branch_id)
    }
}

#[must_use]
pub fn filter_articles(articles: &[Article], filter: &ArticleFilter) -> Vec<Article> {
    articles
        .iter()
        .filter(|a| filter.matches(a))
        .cloned()
        .collect()
}

// =============================================================================
// OGPLs
// =============================================================================

/// Trip manifest filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OgplFilter {
    /// Free text over OGPL number, vehicle, driver and stations.
    #[serde(default)]
    pub search: Option<String>,
    /// Applied to the transit date.
    #[serde(default)]
    pub date_range: DateRange,
    /// Matches trips leaving from or arriving at this branch.
    #[serde(default)]
    pub station: Option<BranchId>,
    /// `Some(false)` keeps only trips still awaiting unloading.
    #[serde(default)]
    pub unloaded: Option<bool>,
}

impl OgplFilter {
    #[must_use]
    pub fn matches(&self, ogpl: &Ogpl, ctx: &QueryContext) -> bool {
        if ogpl.organization_id != ctx.organization_id {
            return false;
        }
        if let Some(needle) = normalized(self.search.as_deref()) {
            let hit = [
                ogpl.ogpl_number.as_str(),
                ogpl.vehicle.as_str(),
                ogpl.primary_driver_name.as_str(),
                ogpl.primary_driver_mobile.as_str(),
                ogpl.from_station.as_str(),
                ogpl.to_station.as_str(),
            ]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if !self.date_range.contains_date(ogpl.transit_date, ctx) {
            return false;
        }
        if self.unloaded.is_some_and(|u| u != ogpl.is_unloaded()) {
            return false;
        }
        self.station
            .as_ref()
            .is_none_or(|s| *s == ogpl.from_station || *s == ogpl.to_station)
    }
}

#[must_use]
pub fn filter_ogpls(ogpls: &[Ogpl], filter: &OgplFilter, ctx: &QueryContext) -> Vec<Ogpl> {
    ogpls
        .iter()
        .filter(|o| filter.matches(o, ctx))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::models::PartyRef;
    use crate::models::booking::tests::booking;
    use crate::types::{BookingId, CustomerId, OrganizationId};

    fn ctx() -> QueryContext {
        QueryContext::new(
            OrganizationId::new("org-1"),
            Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap(),
        )
    }

    fn view(
        id: &str,
        created: DateTime<Utc>,
        status: BookingStatus,
        payment: PaymentType,
        sender: &str,
    ) -> BookingView {
        let mut b = booking();
        b.id = BookingId::new(id);
        b.lr_number = format!("LR-{id}");
        b.created_at = created;
        b.status = status;
        b.payment_type = payment;
        let mut v = BookingView::new(b);
        v.sender = Some(PartyRef {
            id: CustomerId::new("cust-1"),
            name: sender.to_owned(),
            mobile: Some("9876543210".to_owned()),
        });
        v
    }

    fn fixture() -> Vec<BookingView> {
        let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap();
        vec![
            view(
                "1",
                day(20, 9),
                BookingStatus::Booked,
                PaymentType::Paid,
                "Ravi Traders",
            ),
            view(
                "2",
                day(19, 23),
                BookingStatus::Delivered,
                PaymentType::ToPay,
                "Mehta & Sons",
            ),
            view(
                "3",
                day(15, 8),
                BookingStatus::Booked,
                PaymentType::ToPay,
                "Ravi Traders",
            ),
            view(
                "4",
                day(1, 8),
                BookingStatus::Cancelled,
                PaymentType::Paid,
                "Kapoor",
            ),
        ]
    }

    fn ids(views: &[BookingView]) -> Vec<&str> {
        views.iter().map(|v| v.booking.id.as_str()).collect()
    }

    // =========================================================================
    // Search
    // =========================================================================

    #[test]
    fn test_empty_search_matches_everything() {
        let blank = BookingFilter::default().with_search("  ");
        let out = filter_bookings(&fixture(), &blank, &ctx());
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive_over_names_and_lr() {
        let records = fixture();
        let search = |term: &str| BookingFilter::default().with_search(term);
        let by_name = filter_bookings(&records, &search("RAVI"), &ctx());
        assert_eq!(ids(&by_name), vec!["1", "3"]);

        let by_lr = filter_bookings(&records, &search("lr-4"), &ctx());
        assert_eq!(ids(&by_lr), vec!["4"]);
    }

    #[test]
    fn test_missing_party_does_not_match_search() {
        let mut records = fixture();
        records[0].sender = None;
        let out = filter_bookings(&records, &BookingFilter::default().with_search("ravi"), &ctx());
        assert_eq!(ids(&out), vec!["3"]);
    }

    #[test]
    fn test_other_organization_is_excluded() {
        let mut records = fixture();
        records[1].booking.organization_id = OrganizationId::new("org-2");
        let out = filter_bookings(&records, &BookingFilter::default(), &ctx());
        assert_eq!(ids(&out), vec!["1", "3", "4"]);
    }

    // =========================================================================
    // Date Ranges
    // =========================================================================

    #[test]
    fn test_today_and_yesterday_presets() {
        let records = fixture();
        let today = filter_bookings(
            &records,
            &BookingFilter::default().with_date_range(DateRange::preset(DateRangePreset::Today)),
            &ctx(),
        );
        assert_eq!(ids(&today), vec!["1"]);

        let yesterday = filter_bookings(
            &records,
            &BookingFilter::default()
                .with_date_range(DateRange::preset(DateRangePreset::Yesterday)),
            &ctx(),
        );
        assert_eq!(ids(&yesterday), vec!["2"]);
    }

    #[test]
    fn test_calendar_day_uses_context_offset() {
        // 23:00 UTC on the 19th is the 20th in IST.
        let ist = ctx().with_utc_offset(FixedOffset::east_opt(330 * 60).unwrap());
        let out = filter_bookings(
            &fixture(),
            &BookingFilter::default().with_date_range(DateRange::preset(DateRangePreset::Today)),
            &ist,
        );
        assert_eq!(ids(&out), vec!["1", "2"]);
    }

    #[test]
    fn test_rolling_windows() {
        let records = fixture();
        let week = filter_bookings(
            &records,
            &BookingFilter::default().with_date_range(DateRange::preset(DateRangePreset::LastWeek)),
            &ctx(),
        );
        assert_eq!(ids(&week), vec!["1", "2", "3"]);

        let month = filter_bookings(
            &records,
            &BookingFilter::default()
                .with_date_range(DateRange::preset(DateRangePreset::LastMonth)),
            &ctx(),
        );
        assert_eq!(month.len(), 4);
    }

    #[test]
    fn test_custom_range_includes_whole_end_day() {
        let mut b = booking();
        b.created_at = Utc.with_ymd_and_hms(2024, 3, 15, 23, 50, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let range = DateRange::custom(Some(day), Some(day));
        assert!(range.contains(b.created_at, &ctx()));

        let out = filter_bookings(
            &[BookingView::new(b)],
            &BookingFilter::default().with_date_range(range),
            &ctx(),
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_custom_range_open_sides() {
        let c = ctx();
        let start_only = DateRange::custom(NaiveDate::from_ymd_opt(2024, 3, 15), None);
        assert!(start_only.contains(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(), &c));
        assert!(!start_only.contains(Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap(), &c));

        let neither = DateRange::custom(None, None);
        assert!(neither.contains(Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap(), &c));
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(
            "last_3_months".parse::<DateRangePreset>().unwrap(),
            DateRangePreset::Last3Months
        );
        assert_eq!("".parse::<DateRangePreset>().unwrap(), DateRangePreset::All);
        assert!("fortnight".parse::<DateRangePreset>().is_err());
        let json = serde_json::to_string(&DateRangePreset::Last3Months).unwrap();
        assert_eq!(json, "\"last_3_months\"");
    }

    // =========================================================================
    // Categorical
    // =========================================================================

    #[test]
    fn test_composition_equals_intersection() {
        let records = fixture();
        let c = ctx();
        let by_status = BookingFilter::default().with_status(BookingStatus::Booked);
        let by_payment = BookingFilter::default().with_payment_type(PaymentType::ToPay);
        let both = BookingFilter::default()
            .with_status(BookingStatus::Booked)
            .with_payment_type(PaymentType::ToPay);

        let left = filter_bookings(&records, &by_status, &c);
        let right = filter_bookings(&records, &by_payment, &c);
        let expected: Vec<&str> = ids(&left)
            .into_iter()
            .filter(|id| ids(&right).contains(id))
            .collect();

        assert_eq!(ids(&filter_bookings(&records, &both, &c)), expected);
        assert_eq!(expected, vec!["3"]);
    }

    #[test]
    fn test_branch_matches_either_end() {
        let records = fixture();
        let at = |branch: &str| BookingFilter::default().with_branch(BranchId::new(branch));
        let from = filter_bookings(&records, &at("br-mum"), &ctx());
        let to = filter_bookings(&records, &at("br-pun"), &ctx());
        let neither = filter_bookings(&records, &at("br-del"), &ctx());
        assert_eq!(from.len(), 4);
        assert_eq!(to.len(), 4);
        assert!(neither.is_empty());
    }

    #[test]
    fn test_parse_filter_value_all_sentinel() {
        assert_eq!(parse_filter_value::<BookingStatus>(Some("all")).unwrap(), None);
        assert_eq!(parse_filter_value::<BookingStatus>(None).unwrap(), None);
        assert_eq!(
            parse_filter_value::<BookingStatus>(Some("in_transit")).unwrap(),
            Some(BookingStatus::InTransit)
        );
        assert!(parse_filter_value::<BookingStatus>(Some("lost")).is_err());
    }
}

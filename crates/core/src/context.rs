//! Explicit query context.
//!
//! The organization, the acting branch and the clock are passed into every
//! filter and aggregation call instead of being read from ambient state.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use crate::types::{BranchId, OrganizationId};

/// Who is asking, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    /// Organization whose records are in scope.
    pub organization_id: OrganizationId,
    /// Acting branch, if the user works from one.
    pub branch_id: Option<BranchId>,
    /// The instant treated as "now".
    pub now: DateTime<Utc>,
    /// Offset used to decide which calendar day a timestamp falls on.
    pub utc_offset: FixedOffset,
}

impl QueryContext {
    /// Context for an organization at `now`, with calendar days in UTC.
    #[must_use]
    pub fn new(organization_id: OrganizationId, now: DateTime<Utc>) -> Self {
        Self {
            organization_id,
            branch_id: None,
            now,
            utc_offset: Utc.fix(),
        }
    }

    #[must_use]
    pub fn with_branch(mut self, branch_id: Option<BranchId>) -> Self {
        self.branch_id = branch_id;
        self
    }

    #[must_use]
    pub const fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    /// Calendar day containing `now`.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now)
    }

    /// Calendar day a timestamp falls on in this context's offset.
    #[must_use]
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }

    /// First instant of a local calendar day.
    #[must_use]
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        (local - Duration::seconds(i64::from(self.utc_offset.local_minus_utc()))).and_utc()
    }

    /// Last millisecond (23:59:59.999) of a local calendar day.
    #[must_use]
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ctx(offset_minutes: i32) -> QueryContext {
        QueryContext::new(
            OrganizationId::new("org"),
            Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap(),
        )
        .with_utc_offset(FixedOffset::east_opt(offset_minutes * 60).unwrap())
    }

    #[test]
    fn test_today_in_utc() {
        assert_eq!(ctx(0).today(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_today_rolls_over_in_ist() {
        // 20:00 UTC is 01:30 the next day in IST.
        assert_eq!(ctx(330).today(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    }

    #[test]
    fn test_day_bounds_utc() {
        let c = ctx(0);
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            c.start_of_day(day),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            c.end_of_day(day),
            Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_day_bounds_shift_with_offset() {
        let c = ctx(330);
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            c.start_of_day(day),
            Utc.with_ymd_and_hms(2024, 3, 14, 18, 30, 0).unwrap()
        );
    }
}

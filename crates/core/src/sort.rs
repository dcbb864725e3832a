//! Sorting and pagination for list views.
//!
//! Sorting always returns a new vector and is stable, so equal keys keep
//! their filtered order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Article, BookingView, Ogpl};
use crate::types::ParseEnumError;

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseEnumError {
                kind: "sort direction",
                value: s.to_owned(),
            }),
        }
    }
}

/// A comparable cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortValue {
    Text(String),
    Number(Decimal),
    Date(DateTime<Utc>),
    /// Missing values sort lowest.
    Missing,
}

impl SortValue {
    /// Text from an optional field; `None` becomes [`SortValue::Missing`].
    #[must_use]
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Self::Missing, |v| Self::Text(v.to_owned()))
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Less,
            (_, Self::Missing) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            // Mixed kinds only happen with a broken Sortable impl; keep them stable.
            _ => Ordering::Equal,
        }
    }
}

/// A sortable column.
pub trait SortField: Copy + Eq {
    /// Direction applied when the column is first clicked.
    fn default_direction(self) -> SortDirection;

    /// Query-string name; parses back to the same field.
    fn key(self) -> &'static str;
}

/// Records that expose values for the columns `F`.
pub trait Sortable<F: SortField> {
    fn sort_value(&self, field: F) -> SortValue;
}

/// Current sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: SortField> SortState<F> {
    #[must_use]
    pub const fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Handle a header click: the same column flips, a new column starts
    /// in its default direction.
    #[must_use]
    pub fn click(self, field: F) -> Self {
        if field == self.field {
            Self::new(field, self.direction.flip())
        } else {
            Self::new(field, field.default_direction())
        }
    }
}

/// A sorted copy of `records`.
#[must_use]
pub fn sort_records<T, F>(records: &[T], state: SortState<F>) -> Vec<T>
where
    T: Sortable<F> + Clone,
    F: SortField,
{
    let mut keyed: Vec<(SortValue, &T)> = records
        .iter()
        .map(|r| (r.sort_value(state.field), r))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let ord = a.compare(b);
        match state.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Slice out one page. `page` is clamped into range and `per_page` to at least 1.
#[must_use]
pub fn paginate<T: Clone>(records: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = records.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let items = records
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Booking list columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingSortField {
    LrNumber,
    #[default]
    CreatedAt,
    SenderName,
    ReceiverName,
    FromBranch,
    ToBranch,
    TotalAmount,
    Quantity,
    Status,
    PaymentType,
}

impl SortField for BookingSortField {
    fn default_direction(self) -> SortDirection {
        match self {
            Self::CreatedAt | Self::TotalAmount | Self::Quantity => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::LrNumber => "lr_number",
            Self::CreatedAt => "created_at",
            Self::SenderName => "sender_name",
            Self::ReceiverName => "receiver_name",
            Self::FromBranch => "from_branch",
            Self::ToBranch => "to_branch",
            Self::TotalAmount => "total_amount",
            Self::Quantity => "quantity",
            Self::Status => "status",
            Self::PaymentType => "payment_type",
        }
    }
}

impl std::str::FromStr for BookingSortField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lr_number" => Ok(Self::LrNumber),
            "created_at" | "date" => Ok(Self::CreatedAt),
            "sender_name" | "sender" => Ok(Self::SenderName),
            "receiver_name" | "receiver" => Ok(Self::ReceiverName),
            "from_branch" => Ok(Self::FromBranch),
            "to_branch" => Ok(Self::ToBranch),
            "total_amount" | "amount" => Ok(Self::TotalAmount),
            "quantity" => Ok(Self::Quantity),
            "status" => Ok(Self::Status),
            "payment_type" => Ok(Self::PaymentType),
            _ => Err(ParseEnumError {
                kind: "booking sort field",
                value: s.to_owned(),
            }),
        }
    }
}

impl Sortable<BookingSortField> for BookingView {
    fn sort_value(&self, field: BookingSortField) -> SortValue {
        let b = &self.booking;
        match field {
            BookingSortField::LrNumber => SortValue::Text(b.lr_number.clone()),
            BookingSortField::CreatedAt => SortValue::Date(b.created_at),
            BookingSortField::SenderName => SortValue::text(self.sender_name()),
            BookingSortField::ReceiverName => SortValue::text(self.receiver_name()),
            BookingSortField::FromBranch => SortValue::text(self.from_branch_name()),
            BookingSortField::ToBranch => SortValue::text(self.to_branch_name()),
            BookingSortField::TotalAmount => SortValue::Number(b.total_amount),
            BookingSortField::Quantity => SortValue::Number(Decimal::from(b.quantity)),
            BookingSortField::Status => SortValue::Text(b.status.as_str().to_owned()),
            BookingSortField::PaymentType => SortValue::Text(b.payment_type.as_str().to_owned()),
        }
    }
}

/// Article catalog columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSortField {
    #[default]
    Name,
    BaseRate,
    HsnCode,
    CreatedAt,
}

impl SortField for ArticleSortField {
    fn default_direction(self) -> SortDirection {
        match self {
            Self::Name | Self::HsnCode => SortDirection::Asc,
            Self::BaseRate | Self::CreatedAt => SortDirection::Desc,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::BaseRate => "base_rate",
            Self::HsnCode => "hsn_code",
            Self::CreatedAt => "created_at",
        }
    }
}

impl std::str::FromStr for ArticleSortField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "base_rate" | "rate" => Ok(Self::BaseRate),
            "hsn_code" => Ok(Self::HsnCode),
            "created_at" => Ok(Self::CreatedAt),
            _ => Err(ParseEnumError {
                kind: "article sort field",
                value: s.to_owned(),
            }),
        }
    }
}

impl Sortable<ArticleSortField> for Article {
    fn sort_value(&self, field: ArticleSortField) -> SortValue {
        match field {
            ArticleSortField::Name => SortValue::Text(self.name.clone()),
            ArticleSortField::BaseRate => SortValue::Number(self.base_rate),
            ArticleSortField::HsnCode => SortValue::text(self.hsn_code.as_deref()),
            ArticleSortField::CreatedAt => SortValue::Date(self.created_at),
        }
    }
}

/// OGPL list columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OgplSortField {
    OgplNumber,
    Vehicle,
    #[default]
    TransitDate,
    Bookings,
}

impl SortField for OgplSortField {
    fn default_direction(self) -> SortDirection {
        match self {
            Self::OgplNumber | Self::Vehicle => SortDirection::Asc,
            Self::TransitDate | Self::Bookings => SortDirection::Desc,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::OgplNumber => "ogpl_number",
            Self::Vehicle => "vehicle",
            Self::TransitDate => "transit_date",
            Self::Bookings => "bookings",
        }
    }
}

impl std::str::FromStr for OgplSortField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ogpl_number" => Ok(Self::OgplNumber),
            "vehicle" => Ok(Self::Vehicle),
            "transit_date" | "date" => Ok(Self::TransitDate),
            "bookings" => Ok(Self::Bookings),
            _ => Err(ParseEnumError {
                kind: "ogpl sort field",
                value: s.to_owned(),
            }),
        }
    }
}

impl Sortable<OgplSortField> for Ogpl {
    fn sort_value(&self, field: OgplSortField) -> SortValue {
        match field {
            OgplSortField::OgplNumber => SortValue::Text(self.ogpl_number.clone()),
            OgplSortField::Vehicle => SortValue::Text(self.vehicle.clone()),
            OgplSortField::TransitDate => SortValue::Date(
                self.transit_date
                    .and_time(self.departure_time.unwrap_or_default())
                    .and_utc(),
            ),
            OgplSortField::Bookings => SortValue::Number(Decimal::from(self.loading_records.len())),
        }
    }
}

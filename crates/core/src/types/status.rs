//! Status and option enums for bookings and trip manifests.
//!
//! String forms match what the hosted database stores, so every enum here
//! round-trips through serde and `FromStr` with the same spelling.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known enum value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lifecycle status of a booking.
///
/// ```text
/// booked ──> in_transit ──> delivered
///    │            │
///    └────────────┴──────> cancelled
/// ```
///
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Booked,
    InTransit,
    Delivered,
    Cancelled,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Booked,
        Self::InTransit,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Booked => "Booked",
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the booking may still be modified or cancelled.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Booked | Self::InTransit)
    }

    /// Validates a single forward step of the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Booked, Self::InTransit | Self::Cancelled)
                | (Self::InTransit, Self::Delivered | Self::Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(Self::Booked),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::new("booking status", s)),
        }
    }
}

/// Who pays the freight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentType {
    /// Sender paid at booking.
    #[default]
    Paid,
    /// Receiver pays on delivery.
    #[serde(rename = "To Pay")]
    ToPay,
    /// Priced but not yet confirmed.
    Quotation,
}

impl PaymentType {
    pub const ALL: [Self; 3] = [Self::Paid, Self::ToPay, Self::Quotation];

    /// Stored string form, which doubles as the display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::ToPay => "To Pay",
            Self::Quotation => "Quotation",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paid" | "paid" => Ok(Self::Paid),
            "To Pay" | "to_pay" | "topay" => Ok(Self::ToPay),
            "Quotation" | "quotation" => Ok(Self::Quotation),
            _ => Err(ParseEnumError::new("payment type", s)),
        }
    }
}

/// Booking handling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" | "normal" => Ok(Self::Normal),
            "High" | "high" => Ok(Self::High),
            "Urgent" | "urgent" => Ok(Self::Urgent),
            _ => Err(ParseEnumError::new("priority", s)),
        }
    }
}

/// Requested delivery speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryType {
    #[default]
    Standard,
    Express,
    #[serde(rename = "Same Day")]
    SameDay,
}

impl DeliveryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Express => "Express",
            Self::SameDay => "Same Day",
        }
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" | "standard" => Ok(Self::Standard),
            "Express" | "express" => Ok(Self::Express),
            "Same Day" | "same_day" => Ok(Self::SameDay),
            _ => Err(ParseEnumError::new("delivery type", s)),
        }
    }
}

/// Condition of a consignment when it is unloaded from a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    #[default]
    Good,
    Damaged,
    Missing,
}

impl ItemCondition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Damaged => "damaged",
            Self::Missing => "missing",
        }
    }

    /// Damaged and missing items must be explained.
    #[must_use]
    pub const fn requires_remarks(self) -> bool {
        matches!(self, Self::Damaged | Self::Missing)
    }
}

impl std::str::FromStr for ItemCondition {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(Self::Good),
            "damaged" => Ok(Self::Damaged),
            "missing" => Ok(Self::Missing),
            _ => Err(ParseEnumError::new("item condition", s)),
        }
    }
}

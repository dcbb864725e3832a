//! OGPL (outward goods pass list) trip manifests.
//!
//! An OGPL is created when bookings are loaded onto a vehicle and is
//! unloaded exactly once at the destination station.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::booking::Booking;
use crate::types::{BookingId, BranchId, ItemCondition, MobileNumber, OgplId, OrganizationId};

/// Errors raised while building or unloading a manifest.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OgplError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("OGPL {ogpl_number} has already been unloaded")]
    AlreadyUnloaded { ogpl_number: String },
    #[error("booking {0} is not loaded on this OGPL")]
    UnknownBooking(BookingId),
    #[error("booking {0} appears more than once")]
    DuplicateEntry(BookingId),
    #[error("no unloading entry for booking {0}")]
    MissingEntry(BookingId),
    #[error("remarks are required for {condition} booking {booking_id}")]
    RemarksRequired {
        booking_id: BookingId,
        condition: &'static str,
    },
}

impl OgplError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether the error comes from the manifest's state rather than the input.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::AlreadyUnloaded { .. })
    }
}

/// A trip manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ogpl {
    pub id: OgplId,
    pub organization_id: OrganizationId,
    pub ogpl_number: String,
    /// Vehicle registration number.
    pub vehicle: String,
    pub from_station: BranchId,
    pub to_station: BranchId,
    pub primary_driver_name: String,
    pub primary_driver_mobile: String,
    pub transit_date: NaiveDate,
    #[serde(default)]
    pub departure_time: Option<NaiveTime>,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    pub loading_records: Vec<LoadingRecord>,
    #[serde(default)]
    pub unloading_records: Vec<UnloadingRecord>,
    #[serde(default)]
    pub unloaded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One booking loaded onto a trip, with a summary kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingRecord {
    pub booking_id: BookingId,
    pub lr_number: String,
    #[serde(default)]
    pub article_name: Option<String>,
    pub quantity: u32,
    pub total_amount: Decimal,
    pub loaded_at: DateTime<Utc>,
}

impl LoadingRecord {
    #[must_use]
    pub fn from_booking(booking: &Booking, loaded_at: DateTime<Utc>) -> Self {
        Self {
            booking_id: booking.id.clone(),
            lr_number: booking.lr_number.clone(),
            article_name: booking.article_name.clone(),
            quantity: booking.quantity,
            total_amount: booking.total_amount,
            loaded_at,
        }
    }
}

/// Condition of one booking recorded at unloading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadingRecord {
    pub booking_id: BookingId,
    pub lr_number: String,
    pub condition: ItemCondition,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    pub unloaded_at: DateTime<Utc>,
}

/// Unloading input for one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadingEntry {
    pub booking_id: BookingId,
    #[serde(default)]
    pub condition: ItemCondition,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl Ogpl {
    /// Whether the trip has been unloaded.
    #[must_use]
    pub const fn is_unloaded(&self) -> bool {
        self.unloaded_at.is_some()
    }

    /// Booking IDs carried on this trip.
    pub fn booking_ids(&self) -> impl Iterator<Item = &BookingId> {
        self.loading_records.iter().map(|r| &r.booking_id)
    }

    /// Check an unloading submission against the manifest.
    ///
    /// Every loaded booking needs exactly one entry, and damaged or missing
    /// items need remarks.
    ///
    /// # Errors
    ///
    /// Returns the first [`OgplError`] found.
    pub fn validate_unloading(&self, entries: &[UnloadingEntry]) -> Result<(), OgplError> {
        if self.is_unloaded() {
            return Err(OgplError::AlreadyUnloaded {
                ogpl_number: self.ogpl_number.clone(),
            });
        }

        let loaded: HashSet<&BookingId> = self.booking_ids().collect();
        let mut seen: HashSet<&BookingId> = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !loaded.contains(&entry.booking_id) {
                return Err(OgplError::UnknownBooking(entry.booking_id.clone()));
            }
            if !seen.insert(&entry.booking_id) {
                return Err(OgplError::DuplicateEntry(entry.booking_id.clone()));
            }
            if entry.condition.requires_remarks()
                && entry.remarks.as_deref().is_none_or(|r| r.trim().is_empty())
            {
                return Err(OgplError::RemarksRequired {
                    booking_id: entry.booking_id.clone(),
                    condition: entry.condition.as_str(),
                });
            }
        }

        if let Some(missing) = self.booking_ids().find(|id| !seen.contains(id)) {
            return Err(OgplError::MissingEntry(missing.clone()));
        }
        Ok(())
    }

    /// Record the unloading. The manifest is unchanged on error.
    ///
    /// # Errors
    ///
    /// See [`Ogpl::validate_unloading`].
    pub fn unload(
        &mut self,
        entries: Vec<UnloadingEntry>,
        at: DateTime<Utc>,
    ) -> Result<(), OgplError> {
        self.validate_unloading(&entries)?;

        let records: Vec<UnloadingRecord> = entries
            .into_iter()
            .map(|entry| {
                let lr_number = self
                    .loading_records
                    .iter()
                    .find(|r| r.booking_id == entry.booking_id)
                    .map(|r| r.lr_number.clone())
                    .unwrap_or_default();
                UnloadingRecord {
                    booking_id: entry.booking_id,
                    lr_number,
                    condition: entry.condition,
                    remarks: entry
                        .remarks
                        .map(|r| r.trim().to_owned())
                        .filter(|r| !r.is_empty()),
                    photo: entry.photo,
                    unloaded_at: at,
                }
            })
            .collect();

        self.unloading_records = records;
        self.unloaded_at = Some(at);
        Ok(())
    }
}

/// Input for loading bookings onto a new trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOgplInput {
    /// Manual OGPL number; generated when absent.
    #[serde(default)]
    pub ogpl_number: Option<String>,
    pub vehicle: String,
    pub from_station: BranchId,
    pub to_station: BranchId,
    pub primary_driver_name: String,
    pub primary_driver_mobile: String,
    pub transit_date: NaiveDate,
    #[serde(default)]
    pub departure_time: Option<NaiveTime>,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    pub booking_ids: Vec<BookingId>,
}

impl CreateOgplInput {
    /// # Errors
    ///
    /// Returns [`OgplError::Validation`] or [`OgplError::DuplicateEntry`].
    pub fn validate(&self) -> Result<(), OgplError> {
        if self.vehicle.trim().is_empty() {
            return Err(OgplError::invalid("vehicle", "vehicle number is required"));
        }
        if self.from_station == self.to_station {
            return Err(OgplError::invalid(
                "to_station",
                "destination must differ from origin",
            ));
        }
        if self.primary_driver_name.trim().is_empty() {
            return Err(OgplError::invalid(
                "primary_driver_name",
                "driver name is required",
            ));
        }
        MobileNumber::parse(&self.primary_driver_mobile)
            .map_err(|e| OgplError::invalid("primary_driver_mobile", e.to_string()))?;
        if self.booking_ids.is_empty() {
            return Err(OgplError::invalid(
                "booking_ids",
                "at least one booking must be loaded",
            ));
        }
        let mut seen = HashSet::with_capacity(self.booking_ids.len());
        for id in &self.booking_ids {
            if !seen.insert(id) {
                return Err(OgplError::DuplicateEntry(id.clone()));
            }
        }
        Ok(())
    }

    /// Build the manifest from the bookings being loaded.
    #[must_use]
    pub fn into_ogpl(
        self,
        id: OgplId,
        organization_id: OrganizationId,
        ogpl_number: String,
        bookings: &[Booking],
        at: DateTime<Utc>,
    ) -> Ogpl {
        Ogpl {
            id,
            organization_id,
            ogpl_number,
            vehicle: self.vehicle.trim().to_uppercase(),
            from_station: self.from_station,
            to_station: self.to_station,
            primary_driver_name: self.primary_driver_name.trim().to_owned(),
            primary_driver_mobile: self.primary_driver_mobile,
            transit_date: self.transit_date,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            loading_records: bookings
                .iter()
                .map(|b| LoadingRecord::from_booking(b, at))
                .collect(),
            unloading_records: Vec::new(),
            unloaded_at: None,
            created_at: at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::booking::tests::booking;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 16, 6, 0, 0).unwrap()
    }

    fn input() -> CreateOgplInput {
        CreateOgplInput {
            ogpl_number: None,
            vehicle: " mh12ab1234 ".to_owned(),
            from_station: BranchId::new("br-mum"),
            to_station: BranchId::new("br-pun"),
            primary_driver_name: "Suresh".to_owned(),
            primary_driver_mobile: "9822012345".to_owned(),
            transit_date: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(),
            departure_time: None,
            arrival_time: None,
            booking_ids: vec![BookingId::new("bk-1"), BookingId::new("bk-2")],
        }
    }

    fn ogpl() -> Ogpl {
        let first = booking();
        let mut second = booking();
        second.id = BookingId::new("bk-2");
        second.lr_number = "LR000002".to_owned();
        input().into_ogpl(
            OgplId::new("og-1"),
            OrganizationId::new("org-1"),
            "OGPL000001".to_owned(),
            &[first, second],
            at(),
        )
    }

    fn entry(id: &str, condition: ItemCondition, remarks: Option<&str>) -> UnloadingEntry {
        UnloadingEntry {
            booking_id: BookingId::new(id),
            condition,
            remarks: remarks.map(str::to_owned),
            photo: None,
        }
    }

    #[test]
    fn test_create_input_validation() {
        assert!(input().validate().is_ok());

        let mut dup = input();
        dup.booking_ids.push(BookingId::new("bk-1"));
        assert_eq!(
            dup.validate(),
            Err(OgplError::DuplicateEntry(BookingId::new("bk-1")))
        );

        let mut empty = input();
        empty.booking_ids.clear();
        assert!(matches!(
            empty.validate(),
            Err(OgplError::Validation { field: "booking_ids", .. })
        ));

        let mut phone = input();
        phone.primary_driver_mobile = "12".to_owned();
        assert!(phone.validate().is_err());
    }

    #[test]
    fn test_into_ogpl_summarizes_bookings() {
        let trip = ogpl();
        assert_eq!(trip.vehicle, "MH12AB1234");
        assert_eq!(trip.loading_records.len(), 2);
        assert_eq!(trip.loading_records[1].lr_number, "LR000002");
        assert!(!trip.is_unloaded());
    }

    #[test]
    fn test_unload_records_conditions() {
        let mut trip = ogpl();
        let later = at() + Duration::hours(6);
        trip.unload(
            vec![
                entry("bk-1", ItemCondition::Good, Some("  ")),
                entry("bk-2", ItemCondition::Damaged, Some("crushed corner")),
            ],
            later,
        )
        .unwrap();

        assert_eq!(trip.unloaded_at, Some(later));
        assert_eq!(trip.unloading_records[0].remarks, None);
        assert_eq!(trip.unloading_records[1].lr_number, "LR000002");
        assert_eq!(trip.unloading_records[1].condition, ItemCondition::Damaged);
    }

    #[test]
    fn test_damaged_requires_remarks() {
        let mut trip = ogpl();
        let err = trip
            .unload(
                vec![
                    entry("bk-1", ItemCondition::Good, None),
                    entry("bk-2", ItemCondition::Missing, None),
                ],
                at(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            OgplError::RemarksRequired {
                booking_id: BookingId::new("bk-2"),
                condition: "missing",
            }
        );
        assert!(!trip.is_unloaded());
    }

    #[test]
    fn test_every_loaded_booking_needs_an_entry() {
        let trip = ogpl();
        assert_eq!(
            trip.validate_unloading(&[entry("bk-1", ItemCondition::Good, None)]),
            Err(OgplError::MissingEntry(BookingId::new("bk-2")))
        );
        assert_eq!(
            trip.validate_unloading(&[entry("bk-9", ItemCondition::Good, None)]),
            Err(OgplError::UnknownBooking(BookingId::new("bk-9")))
        );
    }

    #[test]
    fn test_unload_only_once() {
        let mut trip = ogpl();
        let entries = vec![
            entry("bk-1", ItemCondition::Good, None),
            entry("bk-2", ItemCondition::Good, None),
        ];
        trip.unload(entries.clone(), at()).unwrap();
        let err = trip.unload(entries, at()).unwrap_err();
        assert!(err.is_precondition());
    }
}

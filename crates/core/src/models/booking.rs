//! Booking (lorry receipt) models and the status lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{ChargeError, Charges, compute_total};
use crate::types::{
    ArticleId, BookingId, BookingStatus, BranchId, CustomerId, DeliveryType, MobileNumber,
    OrganizationId, PaymentType, Priority,
};

/// Errors raised by booking validation and status transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// A field is missing or out of range.
    #[error("{field}: {message}")]
    Validation {
        /// Offending field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
    /// The booking's current status forbids the operation.
    #[error("cannot {action} booking {lr_number} while it is {status}")]
    PreconditionFailed {
        /// LR number of the booking.
        lr_number: String,
        /// Status at the time of the attempt.
        status: BookingStatus,
        /// Operation that was refused.
        action: &'static str,
    },
}

impl BookingError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<ChargeError> for BookingError {
    fn from(err: ChargeError) -> Self {
        let field = match err {
            ChargeError::ZeroQuantity => "quantity",
            ChargeError::Negative { field } => field,
        };
        Self::invalid(field, err.to_string())
    }
}

fn default_uom() -> String {
    "Nos".to_owned()
}

// =============================================================================
// Persisted Record
// =============================================================================

/// A freight booking as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking ID.
    pub id: BookingId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Lorry receipt number, unique within the organization.
    pub lr_number: String,
    /// Origin branch.
    pub from_branch: BranchId,
    /// Destination branch.
    pub to_branch: BranchId,
    pub sender_id: CustomerId,
    pub receiver_id: CustomerId,
    /// Catalog article, if one was picked.
    #[serde(default)]
    pub article_id: Option<ArticleId>,
    /// Article name at booking time; kept when the article changes later.
    #[serde(default)]
    pub article_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit of measure (e.g. "Nos", "Kg", "Box").
    #[serde(default = "default_uom")]
    pub uom: String,
    pub quantity: u32,
    /// Weight in kilograms.
    #[serde(default)]
    pub actual_weight: Decimal,
    pub freight_per_qty: Decimal,
    #[serde(default)]
    pub loading_charges: Decimal,
    #[serde(default)]
    pub unloading_charges: Decimal,
    #[serde(default)]
    pub insurance_charge: Decimal,
    #[serde(default)]
    pub packaging_charge: Decimal,
    /// Derived from the charge fields; see [`compute_total`].
    pub total_amount: Decimal,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub insurance_required: bool,
    /// Declared value; required when insurance is requested.
    #[serde(default)]
    pub insurance_value: Option<Decimal>,
    #[serde(default)]
    pub has_invoice: bool,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_amount: Option<Decimal>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub proof_of_delivery: Option<ProofOfDelivery>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A status change together with the audit fields it persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: BookingStatus,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub proof_of_delivery: Option<ProofOfDelivery>,
}

impl Booking {
    /// Charge inputs as the calculator sees them.
    #[must_use]
    pub const fn charges(&self) -> Charges {
        Charges {
            quantity: self.quantity,
            freight_per_qty: self.freight_per_qty,
            loading_charges: Some(self.loading_charges),
            unloading_charges: Some(self.unloading_charges),
            insurance_charge: Some(self.insurance_charge),
            packaging_charge: Some(self.packaging_charge),
        }
    }

    /// Check every field rule on the record as it stands.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] naming the first failing field.
    pub fn validate(&self) -> Result<(), BookingError> {
        CargoRules {
            charges: &self.charges(),
            actual_weight: self.actual_weight,
            uom: &self.uom,
            insurance_required: self.insurance_required,
            insurance_value: self.insurance_value,
            has_invoice: self.has_invoice,
            invoice_number: self.invoice_number.as_deref(),
        }
        .check()
    }

    fn precondition(&self, action: &'static str) -> BookingError {
        BookingError::PreconditionFailed {
            lr_number: self.lr_number.clone(),
            status: self.status,
            action,
        }
    }

    /// Apply a status change after checking the lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PreconditionFailed`] if the current status
    /// cannot move to `update.status`. The booking is unchanged on error.
    pub fn apply_status_update(&mut self, update: StatusUpdate) -> Result<(), BookingError> {
        if !self.status.can_transition_to(update.status) {
            let action = match update.status {
                BookingStatus::Booked => "reopen",
                BookingStatus::InTransit => "dispatch",
                BookingStatus::Delivered => "deliver",
                BookingStatus::Cancelled => "cancel",
            };
            return Err(self.precondition(action));
        }

        self.status = update.status;
        self.updated_at = update.at;
        match update.status {
            BookingStatus::Cancelled => {
                self.cancellation_reason = update.cancellation_reason;
                self.cancelled_at = Some(update.at);
            }
            BookingStatus::Delivered => {
                self.delivered_at = Some(
                    update
                        .proof_of_delivery
                        .as_ref()
                        .map_or(update.at, |pod| pod.delivered_at),
                );
                self.proof_of_delivery = update.proof_of_delivery;
            }
            BookingStatus::Booked | BookingStatus::InTransit => {}
        }
        Ok(())
    }

    /// Move a booked consignment onto the road.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PreconditionFailed`] unless the booking is `booked`.
    pub fn dispatch(&mut self, at: DateTime<Utc>) -> Result<StatusUpdate, BookingError> {
        let update = StatusUpdate {
            status: BookingStatus::InTransit,
            at,
            cancellation_reason: None,
            proof_of_delivery: None,
        };
        self.apply_status_update(update.clone())?;
        Ok(update)
    }

    /// Mark an in-transit booking delivered.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for an incomplete proof of delivery
    /// and [`BookingError::PreconditionFailed`] unless the booking is `in_transit`.
    pub fn deliver(
        &mut self,
        proof: ProofOfDelivery,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate, BookingError> {
        proof.validate()?;
        let update = StatusUpdate {
            status: BookingStatus::Delivered,
            at,
            cancellation_reason: None,
            proof_of_delivery: Some(proof),
        };
        self.apply_status_update(update.clone())?;
        Ok(update)
    }

    /// Cancel an open booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PreconditionFailed`] if the booking is already
    /// delivered or cancelled, and [`BookingError::Validation`] for a blank reason.
    pub fn cancel(
        &mut self,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<StatusUpdate, BookingError> {
        if !self.status.is_open() {
            return Err(self.precondition("cancel"));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(BookingError::invalid(
                "cancellation_reason",
                "a reason is required to cancel a booking",
            ));
        }
        let update = StatusUpdate {
            status: BookingStatus::Cancelled,
            at,
            cancellation_reason: Some(reason.to_owned()),
            proof_of_delivery: None,
        };
        self.apply_status_update(update.clone())?;
        Ok(update)
    }

    /// Apply edits to an open booking and recompute its total.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PreconditionFailed`] for delivered or cancelled
    /// bookings and [`BookingError::Validation`] if the edited record is invalid.
    /// The booking is unchanged on error.
    pub fn apply_modification(
        &mut self,
        input: UpdateBookingInput,
        at: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if !self.status.is_open() {
            return Err(self.precondition("modify"));
        }

        let mut next = self.clone();
        input.apply_to(&mut next);
        if next.from_branch == next.to_branch {
            return Err(BookingError::invalid(
                "to_branch",
                "destination must differ from origin",
            ));
        }
        next.validate()?;
        next.total_amount = compute_total(&next.charges());
        next.updated_at = at;

        *self = next;
        Ok(())
    }
}

struct CargoRules<'a> {
    charges: &'a Charges,
    actual_weight: Decimal,
    uom: &'a str,
    insurance_required: bool,
    insurance_value: Option<Decimal>,
    has_invoice: bool,
    invoice_number: Option<&'a str>,
}

impl CargoRules<'_> {
    fn check(&self) -> Result<(), BookingError> {
        self.charges.validate()?;
        if self.actual_weight.is_sign_negative() && !self.actual_weight.is_zero() {
            return Err(BookingError::invalid(
                "actual_weight",
                "weight cannot be negative",
            ));
        }
        if self.uom.trim().is_empty() {
            return Err(BookingError::invalid("uom", "unit of measure is required"));
        }
        if self.insurance_required && !self.insurance_value.is_some_and(|v| v > Decimal::ZERO) {
            return Err(BookingError::invalid(
                "insurance_value",
                "a positive declared value is required when insurance is requested",
            ));
        }
        if self.has_invoice && self.invoice_number.is_none_or(|n| n.trim().is_empty()) {
            return Err(BookingError::invalid(
                "invoice_number",
                "invoice number is required when an invoice is attached",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Proof of Delivery
// =============================================================================

/// Evidence captured when a consignment is handed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfDelivery {
    /// Person who collected the goods.
    pub receiver_name: String,
    /// Their mobile number.
    pub receiver_phone: String,
    pub delivered_at: DateTime<Utc>,
    /// Signature image as a data URL.
    pub signature: String,
    /// Optional photo as a data URL.
    #[serde(default)]
    pub photo: Option<String>,
}

impl ProofOfDelivery {
    /// Name, phone and signature are mandatory.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for the first missing or invalid field.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.receiver_name.trim().is_empty() {
            return Err(BookingError::invalid(
                "receiver_name",
                "receiver name is required",
            ));
        }
        MobileNumber::parse(&self.receiver_phone)
            .map_err(|e| BookingError::invalid("receiver_phone", e.to_string()))?;
        if self.signature.trim().is_empty() {
            return Err(BookingError::invalid("signature", "signature is required"));
        }
        Ok(())
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Input for creating a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookingInput {
    /// Manually entered LR number; generated when absent.
    #[serde(default)]
    pub lr_number: Option<String>,
    pub from_branch: BranchId,
    pub to_branch: BranchId,
    pub sender_id: CustomerId,
    pub receiver_id: CustomerId,
    #[serde(default)]
    pub article_id: Option<ArticleId>,
    #[serde(default)]
    pub article_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_uom")]
    pub uom: String,
    #[serde(default)]
    pub actual_weight: Decimal,
    #[serde(flatten)]
    pub charges: Charges,
    #[serde(default)]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub insurance_required: bool,
    #[serde(default)]
    pub insurance_value: Option<Decimal>,
    #[serde(default)]
    pub has_invoice: bool,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_amount: Option<Decimal>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl CreateBookingInput {
    /// Manual LR number, trimmed, if one was entered.
    #[must_use]
    pub fn manual_lr_number(&self) -> Option<&str> {
        self.lr_number
            .as_deref()
            .map(str::trim)
            .filter(|lr| !lr.is_empty())
    }

    /// Check the form before anything is reserved or written.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] naming the first failing field.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self
            .lr_number
            .as_deref()
            .is_some_and(|lr| lr.trim().is_empty())
        {
            return Err(BookingError::invalid(
                "lr_number",
                "manual LR number cannot be blank",
            ));
        }
        if self.from_branch == self.to_branch {
            return Err(BookingError::invalid(
                "to_branch",
                "destination must differ from origin",
            ));
        }
        CargoRules {
            charges: &self.charges,
            actual_weight: self.actual_weight,
            uom: &self.uom,
            insurance_required: self.insurance_required,
            insurance_value: self.insurance_value,
            has_invoice: self.has_invoice,
            invoice_number: self.invoice_number.as_deref(),
        }
        .check()
    }

    /// Build the persisted record with status `booked` and a computed total.
    #[must_use]
    pub fn into_booking(
        self,
        id: BookingId,
        organization_id: OrganizationId,
        lr_number: String,
        at: DateTime<Utc>,
    ) -> Booking {
        let total_amount = compute_total(&self.charges);
        let extra = |v: Option<Decimal>| v.unwrap_or_default();
        Booking {
            id,
            organization_id,
            lr_number,
            from_branch: self.from_branch,
            to_branch: self.to_branch,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            article_id: self.article_id,
            article_name: self.article_name,
            description: self.description,
            uom: self.uom,
            quantity: self.charges.quantity,
            actual_weight: self.actual_weight,
            freight_per_qty: self.charges.freight_per_qty,
            loading_charges: extra(self.charges.loading_charges),
            unloading_charges: extra(self.charges.unloading_charges),
            insurance_charge: extra(self.charges.insurance_charge),
            packaging_charge: extra(self.charges.packaging_charge),
            total_amount,
            payment_type: self.payment_type,
            status: BookingStatus::Booked,
            fragile: self.fragile,
            insurance_required: self.insurance_required,
            insurance_value: self.insurance_value,
            has_invoice: self.has_invoice,
            invoice_number: self.invoice_number,
            invoice_date: self.invoice_date,
            invoice_amount: self.invoice_amount,
            priority: self.priority,
            delivery_type: self.delivery_type,
            remarks: self.remarks,
            cancellation_reason: None,
            cancelled_at: None,
            delivered_at: None,
            proof_of_delivery: None,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Input for modifying an open booking. Absent fields are left as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpdateBookingInput {
    pub to_branch: Option<BranchId>,
    pub receiver_id: Option<CustomerId>,
    pub article_id: Option<ArticleId>,
    pub article_name: Option<String>,
    pub description: Option<String>,
    pub uom: Option<String>,
    pub quantity: Option<u32>,
    pub actual_weight: Option<Decimal>,
    pub freight_per_qty: Option<Decimal>,
    pub loading_charges: Option<Decimal>,
    pub unloading_charges: Option<Decimal>,
    pub insurance_charge: Option<Decimal>,
    pub packaging_charge: Option<Decimal>,
    pub payment_type: Option<PaymentType>,
    pub fragile: Option<bool>,
    pub insurance_required: Option<bool>,
    pub insurance_value: Option<Decimal>,
    pub has_invoice: Option<bool>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_amount: Option<Decimal>,
    pub priority: Option<Priority>,
    pub delivery_type: Option<DeliveryType>,
    pub remarks: Option<String>,
}

impl UpdateBookingInput {
    fn apply_to(self, booking: &mut Booking) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut booking.to_branch, self.to_branch);
        set(&mut booking.receiver_id, self.receiver_id);
        set_opt(&mut booking.article_id, self.article_id);
        set_opt(&mut booking.article_name, self.article_name);
        set_opt(&mut booking.description, self.description);
        set(&mut booking.uom, self.uom);
        set(&mut booking.quantity, self.quantity);
        set(&mut booking.actual_weight, self.actual_weight);
        set(&mut booking.freight_per_qty, self.freight_per_qty);
        set(&mut booking.loading_charges, self.loading_charges);
        set(&mut booking.unloading_charges, self.unloading_charges);
        set(&mut booking.insurance_charge, self.insurance_charge);
        set(&mut booking.packaging_charge, self.packaging_charge);
        set(&mut booking.payment_type, self.payment_type);
        set(&mut booking.fragile, self.fragile);
        set(&mut booking.insurance_required, self.insurance_required);
        set_opt(&mut booking.insurance_value, self.insurance_value);
        set(&mut booking.has_invoice, self.has_invoice);
        set_opt(&mut booking.invoice_number, self.invoice_number);
        set_opt(&mut booking.invoice_date, self.invoice_date);
        set_opt(&mut booking.invoice_amount, self.invoice_amount);
        set(&mut booking.priority, self.priority);
        set(&mut booking.delivery_type, self.delivery_type);
        set_opt(&mut booking.remarks, self.remarks);
    }
}

// =============================================================================
// View
// =============================================================================

/// A branch as shown next to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    pub id: BranchId,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// A sender or receiver as shown next to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRef {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub mobile: Option<String>,
}

/// A booking with its branch, party and article joins resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(default)]
    pub from_branch_details: Option<BranchRef>,
    #[serde(default)]
    pub to_branch_details: Option<BranchRef>,
    #[serde(default)]
    pub sender: Option<PartyRef>,
    #[serde(default)]
    pub receiver: Option<PartyRef>,
}

impl BookingView {
    /// A view with no joins resolved.
    #[must_use]
    pub const fn new(booking: Booking) -> Self {
        Self {
            booking,
            from_branch_details: None,
            to_branch_details: None,
            sender: None,
            receiver: None,
        }
    }

    #[must_use]
    pub fn sender_name(&self) -> Option<&str> {
        self.sender.as_ref().map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn receiver_name(&self) -> Option<&str> {
        self.receiver.as_ref().map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn sender_mobile(&self) -> Option<&str> {
        self.sender.as_ref().and_then(|p| p.mobile.as_deref())
    }

    #[must_use]
    pub fn receiver_mobile(&self) -> Option<&str> {
        self.receiver.as_ref().and_then(|p| p.mobile.as_deref())
    }

    /// Origin branch display name.
    #[must_use]
    pub fn from_branch_name(&self) -> Option<&str> {
        self.from_branch_details.as_ref().map(|b| b.name.as_str())
    }

    /// Destination branch display name.
    #[must_use]
    pub fn to_branch_name(&self) -> Option<&str> {
        self.to_branch_details.as_ref().map(|b| b.name.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use super::*;

    pub(crate) fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    pub(crate) fn input() -> CreateBookingInput {
        CreateBookingInput {
            lr_number: None,
            from_branch: BranchId::new("br-mum"),
            to_branch: BranchId::new("br-pun"),
            sender_id: CustomerId::new("cust-1"),
            receiver_id: CustomerId::new("cust-2"),
            article_id: None,
            article_name: Some("Cartons".to_owned()),
            description: None,
            uom: default_uom(),
            actual_weight: dec!(12.5),
            charges: Charges {
                loading_charges: Some(dec!(10)),
                unloading_charges: Some(dec!(10)),
                ..Charges::new(2, dec!(50))
            },
            payment_type: PaymentType::Paid,
            fragile: false,
            insurance_required: false,
            insurance_value: None,
            has_invoice: false,
            invoice_number: None,
            invoice_date: None,
            invoice_amount: None,
            priority: Priority::Normal,
            delivery_type: DeliveryType::Standard,
            remarks: None,
        }
    }

    pub(crate) fn booking() -> Booking {
        input().into_booking(
            BookingId::new("bk-1"),
            OrganizationId::new("org-1"),
            "LR000001".to_owned(),
            created_at(),
        )
    }

    fn proof() -> ProofOfDelivery {
        ProofOfDelivery {
            receiver_name: "Anil".to_owned(),
            receiver_phone: "9876543210".to_owned(),
            delivered_at: created_at() + Duration::days(2),
            signature: "data:image/png;base64,AAAA".to_owned(),
            photo: None,
        }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    #[test]
    fn test_into_booking_computes_total() {
        let b = booking();
        assert_eq!(b.status, BookingStatus::Booked);
        assert_eq!(b.total_amount, dec!(120));
        assert_eq!(b.insurance_charge, Decimal::ZERO);
    }

    #[test]
    fn test_validate_rejects_same_branch() {
        let mut i = input();
        i.to_branch = i.from_branch.clone();
        assert!(matches!(
            i.validate(),
            Err(BookingError::Validation { field: "to_branch", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let mut i = input();
        i.charges.quantity = 0;
        assert!(matches!(
            i.validate(),
            Err(BookingError::Validation { field: "quantity", .. })
        ));
    }

    #[test]
    fn test_validate_requires_insurance_value() {
        let mut i = input();
        i.insurance_required = true;
        assert!(matches!(
            i.validate(),
            Err(BookingError::Validation { field: "insurance_value", .. })
        ));
        i.insurance_value = Some(dec!(5000));
        assert!(i.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_invoice_number() {
        let mut i = input();
        i.has_invoice = true;
        i.invoice_number = Some("  ".to_owned());
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_blank_manual_lr_number_rejected() {
        let mut i = input();
        i.lr_number = Some(" ".to_owned());
        assert!(i.validate().is_err());
        i.lr_number = Some(" LR-77 ".to_owned());
        assert_eq!(i.manual_lr_number(), Some("LR-77"));
    }

    #[test]
    fn test_create_input_deserializes_flat_charges() {
        let json = r#"{
            "from_branch": "a", "to_branch": "b",
            "sender_id": "s", "receiver_id": "r",
            "quantity": 3, "freight_per_qty": "20", "loading_charges": "5",
            "payment_type": "To Pay"
        }"#;
        let i: CreateBookingInput = serde_json::from_str(json).unwrap();
        assert_eq!(i.charges.quantity, 3);
        assert_eq!(compute_total(&i.charges), dec!(65));
        assert_eq!(i.payment_type, PaymentType::ToPay);
        assert_eq!(i.uom, "Nos");
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    #[test]
    fn test_full_lifecycle() {
        let mut b = booking();
        b.dispatch(created_at() + Duration::hours(1)).unwrap();
        assert_eq!(b.status, BookingStatus::InTransit);

        let update = b.deliver(proof(), created_at() + Duration::days(2)).unwrap();
        assert_eq!(update.status, BookingStatus::Delivered);
        assert_eq!(b.status, BookingStatus::Delivered);
        assert_eq!(b.delivered_at, Some(created_at() + Duration::days(2)));
        assert!(b.proof_of_delivery.is_some());
    }

    #[test]
    fn test_deliver_from_booked_is_precondition_failure() {
        let mut b = booking();
        let err = b.deliver(proof(), created_at()).unwrap_err();
        assert!(matches!(err, BookingError::PreconditionFailed { action: "deliver", .. }));
        assert_eq!(b.status, BookingStatus::Booked);
    }

    #[test]
    fn test_deliver_requires_signature() {
        let mut b = booking();
        b.dispatch(created_at()).unwrap();
        let mut p = proof();
        p.signature = String::new();
        assert!(matches!(
            b.deliver(p, created_at()),
            Err(BookingError::Validation { field: "signature", .. })
        ));
        assert_eq!(b.status, BookingStatus::InTransit);
    }

    #[test]
    fn test_deliver_rejects_bad_phone() {
        let mut p = proof();
        p.receiver_phone = "123".to_owned();
        assert!(matches!(
            p.validate(),
            Err(BookingError::Validation { field: "receiver_phone", .. })
        ));
    }

    #[test]
    fn test_cancel_records_reason() {
        let mut b = booking();
        let at = created_at() + Duration::hours(3);
        b.cancel("  customer request ", at).unwrap();
        assert_eq!(b.status, BookingStatus::Cancelled);
        assert_eq!(b.cancellation_reason.as_deref(), Some("customer request"));
        assert_eq!(b.cancelled_at, Some(at));
    }

    #[test]
    fn test_cancel_requires_reason() {
        let mut b = booking();
        assert!(matches!(
            b.cancel("   ", created_at()),
            Err(BookingError::Validation { .. })
        ));
        assert_eq!(b.status, BookingStatus::Booked);
    }

    #[test]
    fn test_cancel_delivered_booking_leaves_it_untouched() {
        let mut b = booking();
        b.dispatch(created_at()).unwrap();
        b.deliver(proof(), created_at()).unwrap();
        let before = b.clone();

        let err = b.cancel("too late", created_at() + Duration::days(5)).unwrap_err();

        assert!(matches!(err, BookingError::PreconditionFailed { action: "cancel", .. }));
        assert_eq!(b, before);
        assert_eq!(b.status, BookingStatus::Delivered);
        assert_eq!(b.total_amount, dec!(120));
        assert_eq!(b.cancellation_reason, None);
    }

    #[test]
    fn test_dispatch_twice_fails() {
        let mut b = booking();
        b.dispatch(created_at()).unwrap();
        assert!(b.dispatch(created_at()).is_err());
    }

    // =========================================================================
    // Modification
    // =========================================================================

    #[test]
    fn test_modification_recomputes_total() {
        let mut b = booking();
        let at = created_at() + Duration::hours(1);
        b.apply_modification(
            UpdateBookingInput {
                quantity: Some(4),
                packaging_charge: Some(dec!(15.5)),
                ..UpdateBookingInput::default()
            },
            at,
        )
        .unwrap();
        assert_eq!(b.total_amount, dec!(235.5));
        assert_eq!(b.updated_at, at);
    }

    #[test]
    fn test_invalid_modification_leaves_booking_untouched() {
        let mut b = booking();
        let before = b.clone();
        let err = b
            .apply_modification(
                UpdateBookingInput {
                    quantity: Some(9),
                    freight_per_qty: Some(dec!(-1)),
                    ..UpdateBookingInput::default()
                },
                created_at(),
            )
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation { field: "freight_per_qty", .. }));
        assert_eq!(b, before);
    }

    #[test]
    fn test_modification_of_cancelled_booking_fails() {
        let mut b = booking();
        b.cancel("duplicate", created_at()).unwrap();
        assert!(matches!(
            b.apply_modification(UpdateBookingInput::default(), created_at()),
            Err(BookingError::PreconditionFailed { action: "modify", .. })
        ));
    }

    #[test]
    fn test_view_flattens_booking_on_the_wire() {
        let mut view = BookingView::new(booking());
        view.sender = Some(PartyRef {
            id: CustomerId::new("cust-1"),
            name: "Ravi Traders".to_owned(),
            mobile: Some("9876543210".to_owned()),
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["lr_number"], "LR000001");
        assert_eq!(json["sender"]["name"], "Ravi Traders");

        let back: BookingView = serde_json::from_value(json).unwrap();
        assert_eq!(back.sender_name(), Some("Ravi Traders"));
        assert_eq!(back.booking.total_amount, dec!(120));
    }
}

//! SMS messages to senders and receivers.
//!
//! Delivery is best-effort. Callers log a failed send and carry on; a
//! booking is never rolled back because a message did not go out.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use lorry_desk_core::models::BookingView;
use lorry_desk_core::{BookingStatus, MobileNumber, format_amount};

/// Errors sending a message.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The party has no usable mobile number.
    #[error("no valid mobile number for {0}")]
    NoRecipient(String),

    /// The gateway refused or dropped the message.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Sends booking SMS messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Confirmation to the sender after a booking is created.
    async fn send_booking_sms(&self, view: &BookingView) -> Result<(), MessagingError>;

    /// Progress update to the receiver after a status change.
    async fn send_status_update_sms(&self, view: &BookingView) -> Result<(), MessagingError>;
}

/// Text of the booking confirmation.
#[must_use]
pub fn booking_message(view: &BookingView) -> String {
    let booking = &view.booking;
    format!(
        "LR {} booked from {} to {}. {} x {}, amount {} ({}).",
        booking.lr_number,
        view.from_branch_name().unwrap_or("origin"),
        view.to_branch_name().unwrap_or("destination"),
        booking.quantity,
        booking.article_name.as_deref().unwrap_or("packages"),
        format_amount(booking.total_amount),
        booking.payment_type,
    )
}

/// Text of a status update.
#[must_use]
pub fn status_message(view: &BookingView) -> String {
    let booking = &view.booking;
    match booking.status {
        BookingStatus::Booked => format!("LR {} is booked.", booking.lr_number),
        BookingStatus::InTransit => format!(
            "LR {} is on its way to {}.",
            booking.lr_number,
            view.to_branch_name().unwrap_or("destination")
        ),
        BookingStatus::Delivered => format!("LR {} has been delivered.", booking.lr_number),
        BookingStatus::Cancelled => format!(
            "LR {} has been cancelled: {}.",
            booking.lr_number,
            booking.cancellation_reason.as_deref().unwrap_or("no reason given")
        ),
    }
}

fn recipient(mobile: Option<&str>, party: &str) -> Result<MobileNumber, MessagingError> {
    mobile
        .and_then(|m| MobileNumber::parse(m).ok())
        .ok_or_else(|| MessagingError::NoRecipient(party.to_owned()))
}

/// Logs each message instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send_booking_sms(&self, view: &BookingView) -> Result<(), MessagingError> {
        let to = recipient(view.sender_mobile(), "sender")?;
        info!(
            to = %to.international(),
            lr_number = %view.booking.lr_number,
            body = %booking_message(view),
            "sms"
        );
        Ok(())
    }

    async fn send_status_update_sms(&self, view: &BookingView) -> Result<(), MessagingError> {
        let to = recipient(view.receiver_mobile(), "receiver")?;
        info!(
            to = %to.international(),
            lr_number = %view.booking.lr_number,
            body = %status_message(view),
            "sms"
        );
        Ok(())
    }
}

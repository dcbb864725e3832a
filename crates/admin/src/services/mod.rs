//! Business logic services for the admin API.
//!
//! # Services
//!
//! - `analytics` - Dashboard summary and trends
//! - `articles` - Article catalog, bulk repricing and CSV import
//! - `bookings` - Booking creation, edits and status transitions
//! - `messaging` - SMS to senders and receivers
//! - `notify` - User-facing success and error notices
//! - `ogpl` - Trip manifests: loading and unloading

pub mod analytics;
pub mod articles;
pub mod bookings;
pub mod messaging;
pub mod notify;
pub mod ogpl;

pub use analytics::AnalyticsService;
pub use articles::{ArticleService, BulkApplied, BulkPreview};
pub use bookings::BookingService;
pub use messaging::{LogMessenger, Messenger, MessagingError};
pub use notify::{Notifier, TracingNotifier};
pub use ogpl::OgplService;

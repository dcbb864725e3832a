//! Operator-facing feedback.
//!
//! Notifications are fire-and-forget: callers never branch on them.

use tracing::{info, warn};

/// Receives success and failure notices for completed operations.
pub trait Notifier: Send + Sync {
    fn success(&self, title: &str, message: &str);
    fn error(&self, title: &str, message: &str);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, title: &str, message: &str) {
        info!(title, message, "notification");
    }

    fn error(&self, title: &str, message: &str) {
        warn!(title, message, "notification");
    }
}

//! Integration tests for Lorry Desk.
//!
//! Each test builds the full admin router over a fresh in-memory store
//! loaded from `fixtures/seed.yaml` and drives it in process, so no server
//! or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lorry-desk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `booking_lifecycle` - create, dispatch, deliver and cancel over HTTP
//! - `trip_manifest` - OGPL loading and unloading
//! - `catalog_csv` - article import, bulk repricing and export
//! - `register_queries` - filtering, sorting, paging and table configs
//! - `storage_failures` - collaborator failures surface as 502s

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use lorry_desk_admin::config::AdminConfig;
use lorry_desk_admin::db::{LrNumberSource, MemoryStore, RepositoryError, SeedData};
use lorry_desk_admin::routes::routes;
use lorry_desk_admin::services::{Messenger, MessagingError, TracingNotifier};
use lorry_desk_admin::state::AppState;
use lorry_desk_core::models::BookingView;
use lorry_desk_core::OrganizationId;

/// Organization in `fixtures/seed.yaml`.
pub const ORG: &str = "org-demo";

/// Path of the shared seed fixture.
#[must_use]
pub fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/seed.yaml")
}

/// Config for the demo organization with no acting branch, so every
/// branch's records are in scope.
#[must_use]
pub fn config() -> AdminConfig {
    AdminConfig {
        organization_id: OrganizationId::new(ORG),
        ..AdminConfig::for_tests()
    }
}

/// A fresh store holding the seed fixture.
///
/// # Panics
///
/// Panics if the fixture is missing or invalid.
#[must_use]
#[allow(clippy::expect_used)]
pub fn seeded_store() -> MemoryStore {
    let seed = SeedData::from_path(&seed_path()).expect("seed fixture should load");
    MemoryStore::from_seed(seed).expect("seed fixture should be consistent")
}

// =============================================================================
// Collaborators
// =============================================================================

/// One SMS handed to the messenger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    pub kind: &'static str,
    pub lr_number: String,
}

/// Records every message; optionally fails each send.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentSms>>,
    fail: bool,
}

impl RecordingMessenger {
    /// A messenger whose gateway rejects everything.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentSms> {
        self.sent.lock().await.clone()
    }

    async fn record(&self, kind: &'static str, view: &BookingView) -> Result<(), MessagingError> {
        self.sent.lock().await.push(SentSms {
            kind,
            lr_number: view.booking.lr_number.clone(),
        });
        if self.fail {
            Err(MessagingError::Delivery("gateway down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_booking_sms(&self, view: &BookingView) -> Result<(), MessagingError> {
        self.record("booking", view).await
    }

    async fn send_status_update_sms(&self, view: &BookingView) -> Result<(), MessagingError> {
        self.record("status", view).await
    }
}

/// A number source whose backing counter is unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableNumbers;

#[async_trait]
impl LrNumberSource for UnavailableNumbers {
    async fn next_lr_number(&self, _: &OrganizationId) -> Result<String, RepositoryError> {
        Err(RepositoryError::Unavailable("counter offline".to_string()))
    }

    async fn next_ogpl_number(&self, _: &OrganizationId) -> Result<String, RepositoryError> {
        Err(RepositoryError::Unavailable("counter offline".to_string()))
    }
}

// =============================================================================
// Test Context
// =============================================================================

/// The admin API over a seeded store, plus handles on its collaborators.
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub sms: Arc<RecordingMessenger>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_messenger(RecordingMessenger::default())
    }

    #[must_use]
    pub fn with_messenger(messenger: RecordingMessenger) -> Self {
        let store = Arc::new(seeded_store());
        let sms = Arc::new(messenger);
        let state = AppState::new(
            config(),
            store.clone(),
            store.clone(),
            sms.clone(),
            Arc::new(TracingNotifier),
        );
        Self {
            app: routes().with_state(state),
            store,
            sms,
        }
    }

    /// The API with a custom number source over the seeded store.
    #[must_use]
    pub fn with_numbers(numbers: Arc<dyn LrNumberSource>) -> Self {
        let store = Arc::new(seeded_store());
        let sms = Arc::new(RecordingMessenger::default());
        let state = AppState::new(
            config(),
            store.clone(),
            numbers,
            sms.clone(),
            Arc::new(TracingNotifier),
        );
        Self {
            app: routes().with_state(state),
            store,
            sms,
        }
    }

    /// Send a request and return the status and raw body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::expect_used)]
    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        content_type: &str,
        body: Option<Vec<u8>>,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(body.map_or_else(Body::empty, Body::from))
            .expect("request should build");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, bytes.to_vec())
    }

    /// Send an optional JSON body and parse a JSON reply (`Null` if empty).
    ///
    /// # Panics
    ///
    /// Panics if the reply is not JSON.
    #[allow(clippy::expect_used)]
    pub async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let bytes = body.map(|b| b.to_string().into_bytes());
        let (status, reply) = self.raw(method, uri, "application/json", bytes).await;
        if reply.is_empty() {
            return (status, Value::Null);
        }
        let value = serde_json::from_slice(&reply).expect("reply should be JSON");
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json("POST", uri, Some(body)).await
    }

    /// Fetch a text body, e.g. a CSV export.
    ///
    /// # Panics
    ///
    /// Panics if the body is not UTF-8.
    #[allow(clippy::expect_used)]
    pub async fn text(&self, uri: &str) -> (StatusCode, String) {
        let (status, body) = self.raw("GET", uri, "text/plain", None).await;
        (status, String::from_utf8(body).expect("body should be UTF-8"))
    }

    /// Create a booking from the standard form and return the reply.
    ///
    /// # Panics
    ///
    /// Panics unless the API answers 201.
    pub async fn book(&self, overrides: Value) -> Value {
        let mut body = booking_form();
        if let (Some(target), Value::Object(fields)) = (body.as_object_mut(), overrides) {
            target.extend(fields);
        }
        let (status, created) = self.post("/api/bookings", body).await;
        assert_eq!(status, StatusCode::CREATED, "booking rejected: {created}");
        created
    }
}

/// Two cartons from Mumbai to Pune at 50 each, plus 10 loading and 10
/// unloading: 120 in total.
#[must_use]
pub fn booking_form() -> Value {
    serde_json::json!({
        "from_branch": "br-mum",
        "to_branch": "br-pun",
        "sender_id": "cust-ravi",
        "receiver_id": "cust-mart",
        "article_id": "art-cartons",
        "article_name": "Cartons",
        "uom": "Nos",
        "actual_weight": "12.5",
        "quantity": 2,
        "freight_per_qty": "50",
        "loading_charges": "10",
        "unloading_charges": "10",
        "payment_type": "Paid",
    })
}

/// A complete proof of delivery.
#[must_use]
pub fn proof_of_delivery() -> Value {
    serde_json::json!({
        "receiver_name": "Sunil",
        "receiver_phone": "9822098220",
        "delivered_at": "2024-03-16T09:00:00Z",
        "signature": "data:image/png;base64,AAAA",
    })
}

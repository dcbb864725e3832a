//! Integration tests for collaborator failures.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use lorry_desk_integration_tests::{TestContext, UnavailableNumbers, booking_form};

#[tokio::test]
async fn test_unreachable_counter_fails_booking() {
    let ctx = TestContext::with_numbers(Arc::new(UnavailableNumbers));

    let (status, error) = ctx.post("/api/bookings", booking_form()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error["error"], "external_service_failure");

    let (_, page) = ctx.get("/api/bookings").await;
    assert_eq!(page["total_items"], 0);
    assert!(ctx.sms.sent().await.is_empty());
}

#[tokio::test]
async fn test_manual_numbers_bypass_counter() {
    let ctx = TestContext::with_numbers(Arc::new(UnavailableNumbers));

    let booking = ctx.book(json!({ "lr_number": "MUM-7" })).await;
    assert_eq!(booking["lr_number"], "MUM-7");
    let id = booking["id"].as_str().unwrap();

    let mut manifest = json!({
        "vehicle": "MH12AB1234",
        "from_station": "br-mum",
        "to_station": "br-pun",
        "primary_driver_name": "Suresh",
        "primary_driver_mobile": "9822012345",
        "transit_date": "2024-03-16",
        "booking_ids": [id],
    });

    let (status, _) = ctx.post("/api/ogpls", manifest.clone()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let (_, shown) = ctx.get(&format!("/api/bookings/{id}")).await;
    assert_eq!(shown["status"], "booked");

    manifest["ogpl_number"] = json!("TRIP-1");
    let (status, ogpl) = ctx.post("/api/ogpls", manifest).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ogpl["ogpl_number"], "TRIP-1");
}

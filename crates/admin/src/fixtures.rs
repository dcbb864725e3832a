//! Shared records for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use lorry_desk_core::models::{
    Article, Booking, Branch, CreateBookingInput, Customer, CustomerRate, CustomerType,
};
use lorry_desk_core::pricing::Charges;
use lorry_desk_core::{
    ArticleId, BookingId, BranchId, CustomerId, CustomerRateId, DeliveryType, OrganizationId,
    PaymentType, Priority,
};

use crate::db::SeedData;

pub fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
}

/// Matches `AdminConfig::for_tests`.
pub fn org() -> OrganizationId {
    OrganizationId::new("org-test")
}

fn branch(id: &str, name: &str, code: &str) -> Branch {
    Branch {
        id: BranchId::new(id),
        organization_id: org(),
        name: name.to_owned(),
        code: Some(code.to_owned()),
        city: Some(name.to_owned()),
        address: None,
        phone: None,
        is_head_office: code == "MUM",
    }
}

fn customer(id: &str, name: &str, mobile: &str) -> Customer {
    Customer {
        id: CustomerId::new(id),
        organization_id: org(),
        name: name.to_owned(),
        mobile: mobile.to_owned(),
        email: None,
        gst_number: None,
        address: None,
        city: None,
        customer_type: CustomerType::Company,
        created_at: at(),
    }
}

pub fn article() -> Article {
    Article {
        id: ArticleId::new("art-cartons"),
        name: "Cartons".to_owned(),
        description: None,
        base_rate: dec!(50),
        branch_id: BranchId::new("br-mum"),
        hsn_code: Some("4819".to_owned()),
        tax_rate: Some(dec!(12)),
        unit_of_measure: Some("Nos".to_owned()),
        min_quantity: None,
        is_fragile: false,
        requires_special_handling: false,
        notes: None,
        created_at: at(),
    }
}

/// Three branches, two customers, one article with one negotiated rate.
pub fn seed() -> SeedData {
    SeedData {
        organization_id: org(),
        branches: vec![
            branch("br-mum", "Mumbai", "MUM"),
            branch("br-pun", "Pune", "PUN"),
            branch("br-del", "Delhi", "DEL"),
        ],
        customers: vec![
            customer("cust-1", "Ravi Traders", "9876543210"),
            customer("cust-2", "Pune Mart", "9822098220"),
        ],
        articles: vec![article()],
        customer_rates: vec![CustomerRate {
            id: CustomerRateId::new("rate-1"),
            customer_id: CustomerId::new("cust-1"),
            article_id: ArticleId::new("art-cartons"),
            rate: dec!(45),
        }],
        bookings: Vec::new(),
        ogpls: Vec::new(),
    }
}

/// Mumbai to Pune, 2 x 50 freight plus 10 loading and 10 unloading: 120.
pub fn booking_input() -> CreateBookingInput {
    CreateBookingInput {
        lr_number: None,
        from_branch: BranchId::new("br-mum"),
        to_branch: BranchId::new("br-pun"),
        sender_id: CustomerId::new("cust-1"),
        receiver_id: CustomerId::new("cust-2"),
        article_id: Some(ArticleId::new("art-cartons")),
        article_name: Some("Cartons".to_owned()),
        description: None,
        uom: "Nos".to_owned(),
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

pub fn booking(id: &str, lr_number: &str) -> Booking {
    booking_input().into_booking(BookingId::new(id), org(), lr_number.to_owned(), at())
}

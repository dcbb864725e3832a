//! Booking register CSV export.

use std::io;

use lorry_desk_core::QueryContext;
use lorry_desk_core::models::BookingView;

const HEADER: [&str; 20] = [
    "lr_number",
    "booking_date",
    "from_branch",
    "to_branch",
    "sender",
    "receiver",
    "article",
    "quantity",
    "uom",
    "actual_weight",
    "freight_per_qty",
    "loading_charges",
    "unloading_charges",
    "insurance_charge",
    "packaging_charge",
    "total_amount",
    "payment_type",
    "status",
    "delivered_at",
    "remarks",
];

/// Write bookings as CSV, one row each, with dates on the context's calendar.
///
/// Relations fall back to their IDs when the view has no resolved names.
///
/// # Errors
///
/// Returns `csv::Error` if writing to `out` fails.
pub fn export_bookings<W: io::Write>(
    out: W,
    records: &[BookingView],
    ctx: &QueryContext,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;
    for view in records {
        let b = &view.booking;
        writer.write_record([
            b.lr_number.clone(),
            ctx.local_date(b.created_at).to_string(),
            view.from_branch_name().unwrap_or(b.from_branch.as_str()).to_owned(),
            view.to_branch_name().unwrap_or(b.to_branch.as_str()).to_owned(),
            view.sender_name().unwrap_or(b.sender_id.as_str()).to_owned(),
            view.receiver_name().unwrap_or(b.receiver_id.as_str()).to_owned(),
            b.article_name.clone().unwrap_or_default(),
            b.quantity.to_string(),
            b.uom.clone(),
            b.actual_weight.to_string(),
            b.freight_per_qty.to_string(),
            b.loading_charges.to_string(),
            b.unloading_charges.to_string(),
            b.insurance_charge.to_string(),
            b.packaging_charge.to_string(),
            b.total_amount.to_string(),
            b.payment_type.to_string(),
            b.status.to_string(),
            b.delivered_at
                .map(|at| ctx.local_date(at).to_string())
                .unwrap_or_default(),
            b.remarks.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

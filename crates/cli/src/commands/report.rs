//! Dashboard figures over a booking fixture.

use std::io::Write;

use lorry_desk_core::format_amount;

use super::{CliError, Dataset};

/// Which figures to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Summary,
    Daily { days: u32 },
    Monthly { months: u32 },
    Status,
    Branches,
    PaymentTypes,
}

/// Print `report` as aligned text, or as JSON when `json` is set.
///
/// # Errors
///
/// Returns `CliError::App` for a window outside the supported range.
pub async fn run<W: Write>(
    out: &mut W,
    data: &Dataset,
    report: Report,
    json: bool,
) -> Result<(), CliError> {
    let analytics = data.analytics();
    let ctx = &data.ctx;

    match report {
        Report::Summary => {
            let s = analytics.summary(ctx).await?;
            if json {
                return write_json(out, &s);
            }
            let rows = [
                ("Bookings", s.total_bookings.to_string()),
                ("Gross amount", format_amount(s.gross_amount)),
                ("Revenue", format_amount(s.revenue)),
                ("Average booking", format_amount(s.average_booking_value)),
                ("Booked", s.booked.to_string()),
                ("In transit", s.in_transit.to_string()),
                ("Delivered", s.delivered.to_string()),
                ("Cancelled", s.cancelled.to_string()),
                ("To pay outstanding", format_amount(s.to_pay_outstanding)),
                ("Today", s.today_bookings.to_string()),
                ("Today revenue", format_amount(s.today_revenue)),
            ];
            for (label, value) in rows {
                writeln!(out, "{label:<20}{value:>18}")?;
            }
        }
        Report::Daily { days } => {
            let buckets = analytics.daily(ctx, days).await?;
            if json {
                return write_json(out, &buckets);
            }
            for b in buckets {
                writeln!(
                    out,
                    "{}  {:>5}  {:>5}  {:>16}",
                    b.key(),
                    b.count,
                    b.delivered_count,
                    format_amount(b.revenue)
                )?;
            }
        }
        Report::Monthly { months } => {
            let buckets = analytics.monthly(ctx, months).await?;
            if json {
                return write_json(out, &buckets);
            }
            for b in buckets {
                writeln!(
                    out,
                    "{:<10}{:>5}  {:>5}  {:>16}",
                    b.label,
                    b.count,
                    b.delivered_count,
                    format_amount(b.revenue)
                )?;
            }
        }
        Report::Status => {
            let dist = analytics.status(ctx).await?;
            if json {
                return write_json(out, &dist);
            }
            for e in dist.entries {
                writeln!(
                    out,
                    "{:<12}{:>5}  {:>16}",
                    e.status,
                    e.count,
                    format_amount(e.amount)
                )?;
            }
        }
        Report::Branches | Report::PaymentTypes => {
            let entries = if report == Report::Branches {
                analytics.branches(ctx).await?
            } else {
                analytics.payment_types(ctx).await?
            };
            if json {
                return write_json(out, &entries);
            }
            for e in entries {
                writeln!(
                    out,
                    "{:<20}{:>5}  {:>16}",
                    e.name,
                    e.count,
                    format_amount(e.amount)
                )?;
            }
        }
    }
    Ok(())
}

fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

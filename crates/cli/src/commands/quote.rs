//! Price a consignment without recording it.

use std::io::Write;

use rust_decimal::Decimal;

use lorry_desk_core::format_amount;
use lorry_desk_core::pricing::{Charges, compute_total};

use super::CliError;

/// Print the freight breakdown and total for `charges`.
///
/// # Errors
///
/// Returns `CliError::Invalid` for a zero quantity or a negative charge.
pub fn run<W: Write>(out: &mut W, charges: &Charges) -> Result<Decimal, CliError> {
    charges
        .validate()
        .map_err(|e| CliError::Invalid(e.to_string()))?;

    let freight = Decimal::from(charges.quantity) * charges.freight_per_qty;
    writeln!(
        out,
        "{:<12}{:>16}  ({} x {})",
        "Freight",
        format_amount(freight),
        charges.quantity,
        format_amount(charges.freight_per_qty)
    )?;
    let extras = [
        ("Loading", charges.loading_charges),
        ("Unloading", charges.unloading_charges),
        ("Insurance", charges.insurance_charge),
        ("Packaging", charges.packaging_charge),
    ];
    for (label, amount) in extras {
        if let Some(amount) = amount.filter(|a| !a.is_zero()) {
            writeln!(out, "{label:<12}{:>16}", format_amount(amount))?;
        }
    }

    let total = compute_total(charges);
    writeln!(out, "{:<12}{:>16}", "Total", format_amount(total))?;
    Ok(total)
}

//! Freight pricing.
//!
//! Totals and rate adjustments are computed at full [`Decimal`] precision.
//! Nothing here rounds; see [`crate::types::money`] for display formatting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::article::{Article, CustomerRate};
use crate::types::{ArticleId, BranchId, CustomerId};

/// Errors raised when charge inputs fail form-level validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChargeError {
    /// A booking must carry at least one unit.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Charges are never negative.
    #[error("{field} cannot be negative")]
    Negative {
        /// Offending field name.
        field: &'static str,
    },
}

/// Inputs to a booking total.
///
/// Optional charges left as `None` count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Charges {
    pub quantity: u32,
    pub freight_per_qty: Decimal,
    #[serde(default)]
    pub loading_charges: Option<Decimal>,
    #[serde(default)]
    pub unloading_charges: Option<Decimal>,
    #[serde(default)]
    pub insurance_charge: Option<Decimal>,
    #[serde(default)]
    pub packaging_charge: Option<Decimal>,
}

impl Charges {
    /// Charges with only quantity and per-unit freight set.
    #[must_use]
    pub const fn new(quantity: u32, freight_per_qty: Decimal) -> Self {
        Self {
            quantity,
            freight_per_qty,
            loading_charges: None,
            unloading_charges: None,
            insurance_charge: None,
            packaging_charge: None,
        }
    }

    /// Reject inputs the calculator does not accept.
    ///
    /// # Errors
    ///
    /// Returns [`ChargeError::ZeroQuantity`] when quantity is 0 and
    /// [`ChargeError::Negative`] for the first negative amount.
    pub fn validate(&self) -> Result<(), ChargeError> {
        if self.quantity == 0 {
            return Err(ChargeError::ZeroQuantity);
        }
        let fields = [
            ("freight_per_qty", Some(self.freight_per_qty)),
            ("loading_charges", self.loading_charges),
            ("unloading_charges", self.unloading_charges),
            ("insurance_charge", self.insurance_charge),
            ("packaging_charge", self.packaging_charge),
        ];
        for (field, value) in fields {
            if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
                return Err(ChargeError::Negative { field });
            }
        }
        Ok(())
    }

    /// Sum of the optional per-booking charges.
    #[must_use]
    pub fn extras(&self) -> Decimal {
        [
            self.loading_charges,
            self.unloading_charges,
            self.insurance_charge,
            self.packaging_charge,
        ]
        .into_iter()
        .map(Option::unwrap_or_default)
        .sum()
    }
}

/// Booking total: `quantity * freight_per_qty + loading + unloading + insurance + packaging`.
///
/// Assumes [`Charges::validate`] has already passed; no clamping happens here.
#[must_use]
pub fn compute_total(charges: &Charges) -> Decimal {
    Decimal::from(charges.quantity) * charges.freight_per_qty + charges.extras()
}

// =============================================================================
// Bulk Rate Adjustment
// =============================================================================

/// How a bulk adjustment value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// `value` is a percentage of the current rate.
    Percentage,
    /// `value` is added to the current rate.
    Fixed,
}

/// A catalog-wide repricing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateAdjustment {
    pub kind: AdjustmentKind,
    pub value: Decimal,
}

impl RateAdjustment {
    #[must_use]
    pub const fn percentage(value: Decimal) -> Self {
        Self {
            kind: AdjustmentKind::Percentage,
            value,
        }
    }

    #[must_use]
    pub const fn fixed(value: Decimal) -> Self {
        Self {
            kind: AdjustmentKind::Fixed,
            value,
        }
    }
}

/// Outcome of adjusting one rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateChange {
    pub old_rate: Decimal,
    pub new_rate: Decimal,
    pub change: Decimal,
    pub percent_change: Decimal,
}

impl RateChange {
    /// True when the floor at zero kicked in.
    #[must_use]
    pub fn was_floored(&self, adjustment: RateAdjustment) -> bool {
        self.new_rate.is_zero() && raw_rate(self.old_rate, adjustment).is_sign_negative()
    }
}

fn raw_rate(base_rate: Decimal, adjustment: RateAdjustment) -> Decimal {
    match adjustment.kind {
        AdjustmentKind::Percentage => {
            base_rate * (Decimal::ONE + adjustment.value / Decimal::ONE_HUNDRED)
        }
        AdjustmentKind::Fixed => base_rate + adjustment.value,
    }
}

/// Apply an adjustment to a single rate. Rates never go below zero.
#[must_use]
pub fn adjust_rate(base_rate: Decimal, adjustment: RateAdjustment) -> RateChange {
    let new_rate = raw_rate(base_rate, adjustment).max(Decimal::ZERO);
    let change = new_rate - base_rate;
    let percent_change = if base_rate > Decimal::ZERO {
        change / base_rate * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    RateChange {
        old_rate: base_rate,
        new_rate,
        change,
        percent_change,
    }
}

/// Projected rate for one catalog article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePreview {
    pub article_id: ArticleId,
    pub name: String,
    pub branch_id: BranchId,
    #[serde(flatten)]
    pub rate: RateChange,
}

/// Project an adjustment over a catalog without touching it.
#[must_use]
pub fn preview_bulk_adjustment(
    articles: &[Article],
    adjustment: RateAdjustment,
) -> Vec<RatePreview> {
    articles
        .iter()
        .map(|article| RatePreview {
            article_id: article.id.clone(),
            name: article.name.clone(),
            branch_id: article.branch_id.clone(),
            rate: adjust_rate(article.base_rate, adjustment),
        })
        .collect()
}

/// Headline numbers for a bulk preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BulkPreviewSummary {
    pub articles: usize,
    pub increased: usize,
    pub decreased: usize,
    pub floored_at_zero: usize,
    pub average_percent_change: Decimal,
}

#[must_use]
pub fn summarize_preview(
    previews: &[RatePreview],
    adjustment: RateAdjustment,
) -> BulkPreviewSummary {
    let mut summary = BulkPreviewSummary {
        articles: previews.len(),
        ..BulkPreviewSummary::default()
    };
    let mut percent_total = Decimal::ZERO;
    for preview in previews {
        if preview.rate.change > Decimal::ZERO {
            summary.increased += 1;
        } else if preview.rate.change < Decimal::ZERO {
            summary.decreased += 1;
        }
        if preview.rate.was_floored(adjustment) {
            summary.floored_at_zero += 1;
        }
        percent_total += preview.rate.percent_change;
    }
    if !previews.is_empty() {
        summary.average_percent_change = percent_total / Decimal::from(previews.len());
    }
    summary
}

/// Per-unit freight to prefill when an article is picked for a sender.
///
/// A negotiated customer rate wins over the article's base rate.
#[must_use]
pub fn resolve_freight_rate(
    article: &Article,
    customer_rates: &[CustomerRate],
    sender: Option<&CustomerId>,
) -> Decimal {
    sender
        .and_then(|sender| {
            customer_rates
                .iter()
                .find(|r| r.article_id == article.id && &r.customer_id == sender)
        })
        .map_or(article.base_rate, |r| r.rate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::CustomerRateId;

    fn article(id: &str, rate: Decimal) -> Article {
        Article {
            id: ArticleId::new(id),
            name: format!("Article {id}"),
            description: None,
            base_rate: rate,
            branch_id: BranchId::new("br-1"),
            hsn_code: None,
            tax_rate: None,
            unit_of_measure: None,
            min_quantity: None,
            is_fragile: false,
            requires_special_handling: false,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    // =========================================================================
    // Totals
    // =========================================================================

    #[test]
    fn test_compute_total_example() {
        let charges = Charges {
            quantity: 2,
            freight_per_qty: dec!(50),
            loading_charges: Some(dec!(10)),
            unloading_charges: Some(dec!(10)),
            insurance_charge: Some(dec!(0)),
            packaging_charge: Some(dec!(0)),
        };
        assert_eq!(compute_total(&charges), dec!(120));

        let charges = Charges {
            freight_per_qty: dec!(55),
            ..charges
        };
        assert_eq!(compute_total(&charges), dec!(130));
    }

    #[test]
    fn test_missing_charges_count_as_zero() {
        let charges = Charges::new(3, dec!(12.5));
        assert_eq!(compute_total(&charges), dec!(37.5));
    }

    #[test]
    fn test_total_keeps_full_precision() {
        let charges = Charges {
            packaging_charge: Some(dec!(0.005)),
            ..Charges::new(1, dec!(10.3333))
        };
        assert_eq!(compute_total(&charges), dec!(10.3383));
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        assert_eq!(
            Charges::new(0, dec!(10)).validate(),
            Err(ChargeError::ZeroQuantity)
        );
    }

    #[test]
    fn test_validate_rejects_negative_charge() {
        let charges = Charges {
            unloading_charges: Some(dec!(-1)),
            ..Charges::new(1, dec!(10))
        };
        assert_eq!(
            charges.validate(),
            Err(ChargeError::Negative {
                field: "unloading_charges"
            })
        );
    }

    #[test]
    fn test_validate_accepts_zero_charges() {
        let charges = Charges {
            loading_charges: Some(Decimal::ZERO),
            ..Charges::new(1, Decimal::ZERO)
        };
        assert!(charges.validate().is_ok());
    }

    // =========================================================================
    // Rate Adjustment
    // =========================================================================

    #[test]
    fn test_percentage_increase() {
        let change = adjust_rate(dec!(200), RateAdjustment::percentage(dec!(10)));
        assert_eq!(change.new_rate, dec!(220));
        assert_eq!(change.change, dec!(20));
        assert_eq!(change.percent_change, dec!(10));
    }

    #[test]
    fn test_fixed_decrease_floors_at_zero() {
        let adjustment = RateAdjustment::fixed(dec!(-100));
        let change = adjust_rate(dec!(50), adjustment);
        assert_eq!(change.new_rate, Decimal::ZERO);
        assert_eq!(change.change, dec!(-50));
        assert_eq!(change.percent_change, dec!(-100));
        assert!(change.was_floored(adjustment));
    }

    #[test]
    fn test_percentage_below_minus_hundred_floors_at_zero() {
        let change = adjust_rate(dec!(80), RateAdjustment::percentage(dec!(-150)));
        assert_eq!(change.new_rate, Decimal::ZERO);
        assert_eq!(change.percent_change, dec!(-100));
    }

    #[test]
    fn test_zero_base_rate_has_zero_percent_change() {
        let change = adjust_rate(Decimal::ZERO, RateAdjustment::fixed(dec!(25)));
        assert_eq!(change.new_rate, dec!(25));
        assert_eq!(change.percent_change, Decimal::ZERO);
    }

    #[test]
    fn test_preview_and_summary() {
        let articles = vec![article("a", dec!(100)), article("b", dec!(20))];
        let adjustment = RateAdjustment::fixed(dec!(-30));
        let previews = preview_bulk_adjustment(&articles, adjustment);

        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].rate.new_rate, dec!(70));
        assert_eq!(previews[1].rate.new_rate, Decimal::ZERO);

        let summary = summarize_preview(&previews, adjustment);
        assert_eq!(summary.articles, 2);
        assert_eq!(summary.decreased, 2);
        assert_eq!(summary.floored_at_zero, 1);
        assert_eq!(summary.average_percent_change, dec!(-65));
    }

    #[test]
    fn test_preview_does_not_mutate_catalog() {
        let articles = vec![article("a", dec!(100))];
        let _ = preview_bulk_adjustment(&articles, RateAdjustment::percentage(dec!(50)));
        assert_eq!(articles[0].base_rate, dec!(100));
    }

    // =========================================================================
    // Customer Rates
    // =========================================================================

    #[test]
    fn test_customer_rate_overrides_base_rate() {
        let item = article("a", dec!(100));
        let rates = vec![CustomerRate {
            id: CustomerRateId::new("cr-1"),
            customer_id: CustomerId::new("cust-1"),
            article_id: ArticleId::new("a"),
            rate: dec!(85),
        }];

        let sender = CustomerId::new("cust-1");
        assert_eq!(resolve_freight_rate(&item, &rates, Some(&sender)), dec!(85));

        let other = CustomerId::new("cust-2");
        assert_eq!(resolve_freight_rate(&item, &rates, Some(&other)), dec!(100));
        assert_eq!(resolve_freight_rate(&item, &rates, None), dec!(100));
    }
}

//! Article catalog models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ArticleId, BranchId, CustomerId, CustomerRateId};

/// Errors raised when article input fails validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArticleError {
    #[error("article name is required")]
    NameRequired,
    #[error("base rate cannot be negative")]
    NegativeRate,
    #[error("tax rate must be between 0 and 100, got {0}")]
    TaxRateOutOfRange(Decimal),
}

impl ArticleError {
    /// Name of the field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NameRequired => "name",
            Self::NegativeRate => "base_rate",
            Self::TaxRateOutOfRange(_) => "tax_rate",
        }
    }
}

/// A freight-rated article in a branch's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Unique article ID.
    pub id: ArticleId,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Default freight per unit.
    pub base_rate: Decimal,
    /// Branch that owns this catalog entry.
    pub branch_id: BranchId,
    /// HSN code for GST.
    #[serde(default)]
    pub hsn_code: Option<String>,
    /// GST rate in percent.
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    #[serde(default)]
    pub min_quantity: Option<u32>,
    #[serde(default)]
    pub is_fragile: bool,
    #[serde(default)]
    pub requires_special_handling: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Re-check the field rules on an edited record.
    ///
    /// # Errors
    ///
    /// Returns the first [`ArticleError`] found.
    pub fn validate(&self) -> Result<(), ArticleError> {
        check_fields(&self.name, self.base_rate, self.tax_rate)
    }
}

fn check_fields(
    name: &str,
    base_rate: Decimal,
    tax_rate: Option<Decimal>,
) -> Result<(), ArticleError> {
    if name.trim().is_empty() {
        return Err(ArticleError::NameRequired);
    }
    if base_rate < Decimal::ZERO {
        return Err(ArticleError::NegativeRate);
    }
    if let Some(tax) = tax_rate
        && !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&tax)
    {
        return Err(ArticleError::TaxRateOutOfRange(tax));
    }
    Ok(())
}

/// A negotiated per-customer freight rate for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRate {
    pub id: CustomerRateId,
    pub customer_id: CustomerId,
    pub article_id: ArticleId,
    pub rate: Decimal,
}

/// Input for creating an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateArticleInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_rate: Decimal,
    pub branch_id: BranchId,
    #[serde(default)]
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    #[serde(default)]
    pub min_quantity: Option<u32>,
    #[serde(default)]
    pub is_fragile: bool,
    #[serde(default)]
    pub requires_special_handling: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateArticleInput {
    /// # Errors
    ///
    /// Returns the first [`ArticleError`] found.
    pub fn validate(&self) -> Result<(), ArticleError> {
        check_fields(&self.name, self.base_rate, self.tax_rate)
    }

    #[must_use]
    pub fn into_article(self, id: ArticleId, at: DateTime<Utc>) -> Article {
        Article {
            id,
            name: self.name.trim().to_owned(),
            description: self.description,
            base_rate: self.base_rate,
            branch_id: self.branch_id,
            hsn_code: self.hsn_code,
            tax_rate: self.tax_rate,
            unit_of_measure: self.unit_of_measure,
            min_quantity: self.min_quantity,
            is_fragile: self.is_fragile,
            requires_special_handling: self.requires_special_handling,
            notes: self.notes,
            created_at: at,
        }
    }
}

/// Input for editing an article. Absent fields are left as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpdateArticleInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_rate: Option<Decimal>,
    pub hsn_code: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub unit_of_measure: Option<String>,
    pub min_quantity: Option<u32>,
    pub is_fragile: Option<bool>,
    pub requires_special_handling: Option<bool>,
    pub notes: Option<String>,
}

impl UpdateArticleInput {
    /// Apply the edits, validating the result before anything changes.
    ///
    /// # Errors
    ///
    /// Returns the first [`ArticleError`]; `article` is unchanged on error.
    pub fn apply(self, article: &mut Article) -> Result<(), ArticleError> {
        let mut next = article.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_owned();
        }
        if let Some(rate) = self.base_rate {
            next.base_rate = rate;
        }
        if let Some(fragile) = self.is_fragile {
            next.is_fragile = fragile;
        }
        if let Some(special) = self.requires_special_handling {
            next.requires_special_handling = special;
        }
        next.description = self.description.or(next.description);
        next.hsn_code = self.hsn_code.or(next.hsn_code);
        next.tax_rate = self.tax_rate.or(next.tax_rate);
        next.unit_of_measure = self.unit_of_measure.or(next.unit_of_measure);
        next.min_quantity = self.min_quantity.or(next.min_quantity);
        next.notes = self.notes.or(next.notes);

        next.validate()?;
        *article = next;
        Ok(())
    }
}

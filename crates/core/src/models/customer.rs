//! Customer reference entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::PartyRef;
use crate::types::{CustomerId, OrganizationId};

/// Individual or business customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    Individual,
    Company,
}

/// A sender or receiver of consignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub mobile: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// The summary embedded in booking views.
    #[must_use]
    pub fn to_ref(&self) -> PartyRef {
        PartyRef {
            id: self.id.clone(),
            name: self.name.clone(),
            mobile: Some(self.mobile.clone()),
        }
    }

    /// Case-insensitive match on name, mobile or GST number.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.mobile.contains(&needle)
            || self
                .gst_number
                .as_deref()
                .is_some_and(|gst| gst.to_lowercase().contains(&needle))
    }
}

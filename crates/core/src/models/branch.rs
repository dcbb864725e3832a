//! Branch reference entity.

use serde::{Deserialize, Serialize};

use super::booking::BranchRef;
use crate::types::{BranchId, OrganizationId};

/// A booking office of the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub organization_id: OrganizationId,
    pub name: String,
    /// Short code printed on LRs, e.g. "MUM".
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_head_office: bool,
}

impl Branch {
    /// The summary embedded in booking views.
    #[must_use]
    pub fn to_ref(&self) -> BranchRef {
        BranchRef {
            id: self.id.clone(),
            name: self.name.clone(),
            code: self.code.clone(),
            city: self.city.clone(),
        }
    }
}

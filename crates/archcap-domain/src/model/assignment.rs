//! BusinessDomainAssignment - Links an L1 capability to a Business Domain

use serde::{Deserialize, Serialize};

use super::id::{AssignmentId, BusinessDomainId, CapabilityId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDomainAssignment {
    pub id: AssignmentId,
    pub business_domain_id: BusinessDomainId,
    /// Must reference an L1 capability at assignment time
    pub capability_id: CapabilityId,
}

impl BusinessDomainAssignment {
    pub fn new(
        id: AssignmentId,
        business_domain_id: BusinessDomainId,
        capability_id: CapabilityId,
    ) -> Self {
        Self {
            id,
            business_domain_id,
            capability_id,
        }
    }
}

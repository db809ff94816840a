//! Assignment Repository - Business-domain links of L1 capabilities

use crate::model::assignment::BusinessDomainAssignment;
use crate::model::id::{BusinessDomainId, CapabilityId};
use crate::repository::error::RepositoryError;

pub trait AssignmentReader: Send + Sync {
    fn get_by_capability_id(
        &self,
        capability_id: &CapabilityId,
    ) -> Result<Vec<BusinessDomainAssignment>, RepositoryError>;

    fn assignment_exists(
        &self,
        business_domain_id: &BusinessDomainId,
        capability_id: &CapabilityId,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .get_by_capability_id(capability_id)?
            .iter()
            .any(|a| &a.business_domain_id == business_domain_id))
    }
}

pub trait AssignmentRepository: AssignmentReader {
    fn save(&self, assignment: BusinessDomainAssignment) -> Result<(), RepositoryError>;

    /// Remove the link, returning whether one existed
    fn unassign(
        &self,
        business_domain_id: &BusinessDomainId,
        capability_id: &CapabilityId,
    ) -> Result<bool, RepositoryError>;
}

//! In-memory business-domain assignment store

use std::sync::{Arc, RwLock};

use archcap_domain::{
    AssignmentReader, AssignmentRepository, BusinessDomainAssignment, BusinessDomainId,
    CapabilityId, RepositoryError,
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAssignmentStore {
    assignments: Arc<RwLock<Vec<BusinessDomainAssignment>>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_all(&self) -> Result<Vec<BusinessDomainAssignment>, RepositoryError> {
        let assignments = self
            .assignments
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        Ok(assignments.clone())
    }
}

impl AssignmentReader for InMemoryAssignmentStore {
    fn get_by_capability_id(
        &self,
        capability_id: &CapabilityId,
    ) -> Result<Vec<BusinessDomainAssignment>, RepositoryError> {
        let assignments = self
            .assignments
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        Ok(assignments
            .iter()
            .filter(|a| &a.capability_id == capability_id)
            .cloned()
            .collect())
    }
}

impl AssignmentRepository for InMemoryAssignmentStore {
    fn save(&self, assignment: BusinessDomainAssignment) -> Result<(), RepositoryError> {
        let mut assignments = self
            .assignments
            .write()
            .map_err(|_| RepositoryError::persistence("Failed to acquire write lock"))?;
        assignments.retain(|a| {
            !(a.business_domain_id == assignment.business_domain_id
                && a.capability_id == assignment.capability_id)
        });
        assignments.push(assignment);
        Ok(())
    }

    fn unassign(
        &self,
        business_domain_id: &BusinessDomainId,
        capability_id: &CapabilityId,
    ) -> Result<bool, RepositoryError> {
        let mut assignments = self
            .assignments
            .write()
            .map_err(|_| RepositoryError::persistence("Failed to acquire write lock"))?;
        let before = assignments.len();
        assignments
            .retain(|a| !(&a.business_domain_id == business_domain_id && &a.capability_id == capability_id));
        Ok(assignments.len() != before)
    }
}

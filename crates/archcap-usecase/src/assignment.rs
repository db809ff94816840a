//! Business-domain assignment handlers

use std::sync::Arc;

use archcap_domain::{
    AssignmentId, AssignmentRepository, BusinessDomainAssignment, CapabilityLevel,
    CapabilityReadModel,
};
use tracing::info;
use uuid::Uuid;

use crate::command::{unexpected, Command, CommandHandler, CommandResult};
use crate::error::{Result, UseCaseError};

/// Links a business domain to an L1 capability
pub struct AssignCapabilityToDomainHandler {
    capabilities: Arc<dyn CapabilityReadModel>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl AssignCapabilityToDomainHandler {
    pub fn new(
        capabilities: Arc<dyn CapabilityReadModel>,
        assignments: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            capabilities,
            assignments,
        }
    }
}

impl CommandHandler for AssignCapabilityToDomainHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        let Command::AssignCapabilityToDomain(cmd) = command else {
            return Err(unexpected(&command));
        };

        let capability = self
            .capabilities
            .get_by_id(&cmd.capability_id)?
            .ok_or_else(|| UseCaseError::CapabilityNotFound(cmd.capability_id.clone()))?;
        if capability.level != CapabilityLevel::L1 {
            return Err(UseCaseError::CapabilityNotL1 {
                capability_id: cmd.capability_id,
                level: capability.level,
            });
        }
        if self
            .assignments
            .assignment_exists(&cmd.business_domain_id, &cmd.capability_id)?
        {
            return Err(UseCaseError::AssignmentAlreadyExists {
                business_domain_id: cmd.business_domain_id,
                capability_id: cmd.capability_id,
            });
        }

        let id = AssignmentId::new(Uuid::new_v4().to_string());
        self.assignments.save(BusinessDomainAssignment::new(
            id.clone(),
            cmd.business_domain_id.clone(),
            cmd.capability_id.clone(),
        ))?;
        info!(
            business_domain_id = %cmd.business_domain_id,
            capability_id = %cmd.capability_id,
            "Business domain assigned"
        );
        Ok(CommandResult::new(id.as_str(), 0))
    }
}

pub struct UnassignCapabilityFromDomainHandler {
    assignments: Arc<dyn AssignmentRepository>,
}

impl UnassignCapabilityFromDomainHandler {
    pub fn new(assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self { assignments }
    }
}

impl CommandHandler for UnassignCapabilityFromDomainHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        let Command::UnassignCapabilityFromDomain(cmd) = command else {
            return Err(unexpected(&command));
        };

        if !self
            .assignments
            .unassign(&cmd.business_domain_id, &cmd.capability_id)?
        {
            return Err(UseCaseError::AssignmentNotFound {
                business_domain_id: cmd.business_domain_id,
                capability_id: cmd.capability_id,
            });
        }
        info!(
            business_domain_id = %cmd.business_domain_id,
            capability_id = %cmd.capability_id,
            "Business domain unassigned"
        );
        Ok(CommandResult::new(cmd.capability_id.as_str(), 0))
    }
}

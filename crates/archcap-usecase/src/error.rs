//! Error types for the use case layer

use archcap_domain::{
    BusinessDomainId, CapabilityError, CapabilityId, CapabilityLevel, RealizationId,
    RepositoryError,
};
use thiserror::Error;

use crate::command::CommandKind;

#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error(transparent)]
    Validation(#[from] CapabilityError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Capability not found: {0}")]
    CapabilityNotFound(CapabilityId),

    #[error("Parent capability not found: {0}")]
    ParentCapabilityNotFound(CapabilityId),

    #[error("Moving capability {capability_id} would exceed the maximum depth of {max_depth}")]
    WouldExceedMaximumDepth {
        capability_id: CapabilityId,
        max_depth: u8,
    },

    #[error("Moving capability {capability_id} under {new_parent_id} would create a circular reference")]
    WouldCreateCircularReference {
        capability_id: CapabilityId,
        new_parent_id: CapabilityId,
    },

    #[error("A {level} capability cannot be placed under a {parent_level} parent")]
    LevelMismatch {
        level: CapabilityLevel,
        parent_level: CapabilityLevel,
    },

    #[error("Capability {0} still has children and cannot be deleted")]
    CapabilityHasChildren(CapabilityId),

    #[error("Capability {capability_id} is {level}; only L1 capabilities can be assigned to a business domain")]
    CapabilityNotL1 {
        capability_id: CapabilityId,
        level: CapabilityLevel,
    },

    #[error("Business domain {business_domain_id} is already assigned to capability {capability_id}")]
    AssignmentAlreadyExists {
        business_domain_id: BusinessDomainId,
        capability_id: CapabilityId,
    },

    #[error("Business domain {business_domain_id} is not assigned to capability {capability_id}")]
    AssignmentNotFound {
        business_domain_id: BusinessDomainId,
        capability_id: CapabilityId,
    },

    #[error("Realization not found: {0}")]
    RealizationNotFound(RealizationId),

    #[error("Realization {0} is inherited; only direct realizations can be unlinked")]
    RealizationNotDirect(RealizationId),

    #[error("No handler registered for {0}")]
    NoHandler(CommandKind),

    #[error("Handler received a {0} command it does not process")]
    UnexpectedCommand(CommandKind),
}

pub type Result<T> = std::result::Result<T, UseCaseError>;

//! Capability Repository - Aggregate persistence and the tree read model
//!
//! The repository rebuilds aggregates from their event stream and appends
//! new events with an optimistic version check. The read model answers the
//! tree-shaped questions (parent, children) the orchestrator asks before
//! it touches the aggregate.

use crate::model::capability::Capability;
use crate::model::id::CapabilityId;
use crate::model::level::CapabilityLevel;
use crate::repository::error::RepositoryError;

/// Capability Repository Trait
///
/// This is a PORT in hexagonal architecture.
pub trait CapabilityRepository: Send + Sync {
    /// Load an aggregate by replaying its stream
    ///
    /// Fails with `RepositoryError::NotFound` for an unknown id.
    fn get_by_id(&self, id: &CapabilityId) -> Result<Capability, RepositoryError>;

    /// Append the aggregate's uncommitted events atomically
    ///
    /// Must reject the save with `RepositoryError::ConcurrencyError` when
    /// the stream version moved past `capability.committed_version()`.
    /// Saving an aggregate with no uncommitted events is a no-op.
    fn save(&self, capability: &mut Capability) -> Result<(), RepositoryError>;
}

/// The projection of a capability the tree algorithms need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySummary {
    pub id: CapabilityId,
    pub name: String,
    pub parent_id: Option<CapabilityId>,
    pub level: CapabilityLevel,
}

impl CapabilitySummary {
    pub fn new(
        id: impl Into<CapabilityId>,
        name: impl Into<String>,
        parent_id: Option<CapabilityId>,
        level: CapabilityLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            level,
        }
    }
}

/// Capability Read Model Trait
///
/// Only active capabilities are visible.
pub trait CapabilityReadModel: Send + Sync {
    /// Find a capability, `None` if missing
    fn get_by_id(&self, id: &CapabilityId) -> Result<Option<CapabilitySummary>, RepositoryError>;

    /// Direct children of a capability
    fn get_children(&self, parent_id: &CapabilityId)
        -> Result<Vec<CapabilitySummary>, RepositoryError>;

    /// Every capability in the tree
    fn list_all(&self) -> Result<Vec<CapabilitySummary>, RepositoryError>;

    /// Check if a capability has children
    fn has_children(&self, id: &CapabilityId) -> Result<bool, RepositoryError> {
        Ok(!self.get_children(id)?.is_empty())
    }
}

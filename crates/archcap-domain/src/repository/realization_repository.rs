//! Realization Repository - Direct links and their inherited copies

use crate::model::id::{CapabilityId, RealizationId};
use crate::model::realization::Realization;
use crate::repository::error::RepositoryError;

/// Realization Read Model Trait
pub trait RealizationReadModel: Send + Sync {
    /// All realizations (Direct and Inherited) attached to a capability
    fn get_by_capability_id(
        &self,
        capability_id: &CapabilityId,
    ) -> Result<Vec<Realization>, RepositoryError>;

    /// Capabilities currently holding an inherited copy of `source_id`
    fn get_inherited_capability_ids_by_source_realization_id(
        &self,
        source_id: &RealizationId,
    ) -> Result<Vec<CapabilityId>, RepositoryError>;

    fn get_by_id(&self, id: &RealizationId) -> Result<Option<Realization>, RepositoryError>;
}

/// Realization Repository Trait
///
/// Stores user-created Direct realizations. Inherited rows are never
/// written through this port; they are projected from capability events.
pub trait RealizationRepository: Send + Sync {
    fn save_direct(&self, realization: Realization) -> Result<(), RepositoryError>;

    /// Remove a Direct realization, returning it if it existed
    fn delete_direct(&self, id: &RealizationId) -> Result<Option<Realization>, RepositoryError>;
}

//! Realization handlers - Linking systems to capabilities
//!
//! Linking stores the Direct realization, then recomputes the owning
//! capability so every ancestor receives its copy. Unlinking drops the
//! Direct row and raises one removal group covering all of its copies.

use std::sync::Arc;

use archcap_domain::{
    CapabilityReadModel, CapabilityRepository, Realization, RealizationId,
    RealizationInheritanceRemoval, RealizationReadModel, RealizationRepository,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::capability::{load_capability, save_capability};
use crate::command::{
    unexpected, Command, CommandHandler, CommandResult, LinkSystemToCapability,
    RecomputeCapabilityInheritance, UnlinkSystemFromCapability,
};
use crate::error::{Result, UseCaseError};
use crate::recompute::RecomputeCapabilityInheritanceHandler;

pub struct LinkSystemToCapabilityHandler {
    capabilities: Arc<dyn CapabilityReadModel>,
    realizations: Arc<dyn RealizationRepository>,
    recompute: Arc<RecomputeCapabilityInheritanceHandler>,
}

impl LinkSystemToCapabilityHandler {
    pub fn new(
        capabilities: Arc<dyn CapabilityReadModel>,
        realizations: Arc<dyn RealizationRepository>,
        recompute: Arc<RecomputeCapabilityInheritanceHandler>,
    ) -> Self {
        Self {
            capabilities,
            realizations,
            recompute,
        }
    }

    pub fn execute(&self, command: LinkSystemToCapability) -> Result<CommandResult> {
        if self.capabilities.get_by_id(&command.capability_id)?.is_none() {
            return Err(UseCaseError::CapabilityNotFound(command.capability_id));
        }

        let id = RealizationId::new(Uuid::new_v4().to_string());
        let realization = Realization::direct(
            id.clone(),
            command.capability_id.clone(),
            command.component_id.clone(),
            command.component_name,
            command.level,
            Utc::now(),
        )
        .with_notes(command.notes);
        self.realizations.save_direct(realization)?;
        info!(
            realization_id = %id,
            capability_id = %command.capability_id,
            component_id = %command.component_id,
            "System linked to capability"
        );

        let recomputed = self.recompute.execute(RecomputeCapabilityInheritance {
            capability_id: command.capability_id,
        })?;
        Ok(CommandResult::new(id.as_str(), recomputed.events_raised))
    }
}

impl CommandHandler for LinkSystemToCapabilityHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::LinkSystemToCapability(cmd) => self.execute(cmd),
            other => Err(unexpected(&other)),
        }
    }
}

pub struct UnlinkSystemFromCapabilityHandler {
    repository: Arc<dyn CapabilityRepository>,
    read_model: Arc<dyn RealizationReadModel>,
    realizations: Arc<dyn RealizationRepository>,
}

impl UnlinkSystemFromCapabilityHandler {
    pub fn new(
        repository: Arc<dyn CapabilityRepository>,
        read_model: Arc<dyn RealizationReadModel>,
        realizations: Arc<dyn RealizationRepository>,
    ) -> Self {
        Self {
            repository,
            read_model,
            realizations,
        }
    }

    pub fn execute(&self, command: UnlinkSystemFromCapability) -> Result<CommandResult> {
        let id = command.realization_id;
        let realization = self
            .read_model
            .get_by_id(&id)?
            .ok_or_else(|| UseCaseError::RealizationNotFound(id.clone()))?;
        if !realization.is_direct() {
            return Err(UseCaseError::RealizationNotDirect(id));
        }

        let mut copies = self
            .read_model
            .get_inherited_capability_ids_by_source_realization_id(&id)?;
        copies.sort();
        copies.dedup();

        let mut capability = load_capability(self.repository.as_ref(), &realization.capability_id)?;
        if !copies.is_empty() {
            capability.record_uninherited_realizations(vec![RealizationInheritanceRemoval {
                source_realization_id: id.clone(),
                capability_ids: copies,
            }]);
        }
        // The Direct row outlives its copies: a failed save leaves both in place.
        let saved = save_capability(self.repository.as_ref(), &mut capability)?;
        self.realizations.delete_direct(&id)?;

        info!(
            realization_id = %id,
            capability_id = %realization.capability_id,
            "System unlinked from capability"
        );
        Ok(CommandResult::new(id.as_str(), saved.events_raised))
    }
}

impl CommandHandler for UnlinkSystemFromCapabilityHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::UnlinkSystemFromCapability(cmd) => self.execute(cmd),
            other => Err(unexpected(&other)),
        }
    }
}

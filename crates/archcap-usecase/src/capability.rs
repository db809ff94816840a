//! Capability lifecycle handlers - create, CRUD mutators, delete
//!
//! Plain single-aggregate commands. Structural moves live in `reparent`.

use std::sync::Arc;

use archcap_domain::{
    Capability, CapabilityId, CapabilityLevel, CapabilityReadModel, CapabilityRepository,
    RepositoryError,
};
use tracing::info;
use uuid::Uuid;

use crate::command::{unexpected, Command, CommandHandler, CommandResult, CreateCapability};
use crate::error::{Result, UseCaseError};

/// Load an aggregate, mapping a missing stream to `CapabilityNotFound`
pub(crate) fn load_capability(
    repository: &dyn CapabilityRepository,
    id: &CapabilityId,
) -> Result<Capability> {
    repository.get_by_id(id).map_err(|error| match error {
        RepositoryError::NotFound { .. } => UseCaseError::CapabilityNotFound(id.clone()),
        other => other.into(),
    })
}

/// Save and report how many events went out
pub(crate) fn save_capability(
    repository: &dyn CapabilityRepository,
    capability: &mut Capability,
) -> Result<CommandResult> {
    let raised = capability.uncommitted_events().len();
    repository.save(capability)?;
    Ok(CommandResult::new(capability.id().as_str(), raised))
}

pub struct CreateCapabilityHandler {
    repository: Arc<dyn CapabilityRepository>,
    capabilities: Arc<dyn CapabilityReadModel>,
}

impl CreateCapabilityHandler {
    pub fn new(
        repository: Arc<dyn CapabilityRepository>,
        capabilities: Arc<dyn CapabilityReadModel>,
    ) -> Self {
        Self {
            repository,
            capabilities,
        }
    }

    pub fn execute(&self, command: CreateCapability) -> Result<CommandResult> {
        let level = CapabilityLevel::parse(&command.level)?;
        let parent_id = command.parent_id.filter(|p| !p.is_empty());

        if let Some(parent_id) = &parent_id {
            let parent = self
                .capabilities
                .get_by_id(parent_id)?
                .ok_or_else(|| UseCaseError::ParentCapabilityNotFound(parent_id.clone()))?;
            if parent.level.child_level() != Some(level) {
                return Err(UseCaseError::LevelMismatch {
                    level,
                    parent_level: parent.level,
                });
            }
        }

        let id = command
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| CapabilityId::new(Uuid::new_v4().to_string()));
        let mut capability =
            Capability::new(id, &command.name, &command.description, parent_id, level)?;

        let result = save_capability(self.repository.as_ref(), &mut capability)?;
        info!(
            capability_id = %capability.id(),
            level = %capability.level(),
            "Capability created"
        );
        Ok(result)
    }
}

impl CommandHandler for CreateCapabilityHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::CreateCapability(cmd) => self.execute(cmd),
            other => Err(unexpected(&other)),
        }
    }
}

/// Update, tags, experts, metadata
pub struct CapabilityCrudHandler {
    repository: Arc<dyn CapabilityRepository>,
}

impl CapabilityCrudHandler {
    pub fn new(repository: Arc<dyn CapabilityRepository>) -> Self {
        Self { repository }
    }

    fn mutate<F>(&self, id: &CapabilityId, mutation: F) -> Result<CommandResult>
    where
        F: FnOnce(&mut Capability) -> Result<()>,
    {
        let mut capability = load_capability(self.repository.as_ref(), id)?;
        mutation(&mut capability)?;
        save_capability(self.repository.as_ref(), &mut capability)
    }
}

impl CommandHandler for CapabilityCrudHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::UpdateCapability(cmd) => self.mutate(&cmd.capability_id, |c| {
                Ok(c.update(&cmd.name, &cmd.description)?)
            }),
            Command::AddCapabilityTag(cmd) => {
                self.mutate(&cmd.capability_id, |c| Ok(c.add_tag(&cmd.tag)?))
            }
            Command::AddCapabilityExpert(cmd) => {
                self.mutate(&cmd.capability_id, |c| Ok(c.add_expert(cmd.expert)?))
            }
            Command::RemoveCapabilityExpert(cmd) => self.mutate(&cmd.capability_id, |c| {
                Ok(c.remove_expert(&cmd.expert_name)?)
            }),
            Command::UpdateCapabilityMetadata(cmd) => self.mutate(&cmd.capability_id, |c| {
                c.update_metadata(cmd.metadata);
                Ok(())
            }),
            other => Err(unexpected(&other)),
        }
    }
}

/// Decides whether a capability may be deleted
pub trait DeletionPolicy: Send + Sync {
    fn check(&self, capability_id: &CapabilityId) -> Result<()>;
}

/// Deletion is blocked while the capability has children
pub struct ChildrenDeletionPolicy {
    capabilities: Arc<dyn CapabilityReadModel>,
}

impl ChildrenDeletionPolicy {
    pub fn new(capabilities: Arc<dyn CapabilityReadModel>) -> Self {
        Self { capabilities }
    }
}

impl DeletionPolicy for ChildrenDeletionPolicy {
    fn check(&self, capability_id: &CapabilityId) -> Result<()> {
        if self.capabilities.has_children(capability_id)? {
            return Err(UseCaseError::CapabilityHasChildren(capability_id.clone()));
        }
        Ok(())
    }
}

pub struct DeleteCapabilityHandler {
    repository: Arc<dyn CapabilityRepository>,
    policy: Arc<dyn DeletionPolicy>,
}

impl DeleteCapabilityHandler {
    pub fn new(repository: Arc<dyn CapabilityRepository>, policy: Arc<dyn DeletionPolicy>) -> Self {
        Self { repository, policy }
    }
}

impl CommandHandler for DeleteCapabilityHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        let Command::DeleteCapability(cmd) = command else {
            return Err(unexpected(&command));
        };
        let mut capability = load_capability(self.repository.as_ref(), &cmd.capability_id)?;
        self.policy.check(&cmd.capability_id)?;
        capability.delete();
        let result = save_capability(self.repository.as_ref(), &mut capability)?;
        info!(capability_id = %cmd.capability_id, "Capability deleted");
        Ok(result)
    }
}

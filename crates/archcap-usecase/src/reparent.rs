//! Reparent Orchestrator - Moving a capability within the tree
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ ChangeCapabilityParent                                   │
//! │  1. validate  (parent exists, no cycle, depth <= 4)      │
//! │  2. aggregate.change_parent                              │
//! │  3. inheritance diff old chain -> new chain              │
//! │  4. save       (one atomic append)                       │
//! │  5. level cascade over descendants (worklist)            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection happens before the aggregate is touched, so a failed
//! move persists nothing.

use std::sync::Arc;

use archcap_domain::service::ancestry::{collect_ancestor_ids, subtree_depth, would_create_cycle};
use archcap_domain::service::inheritance::diff_for_move;
use archcap_domain::{
    CapabilityId, CapabilityLevel, CapabilityReadModel, CapabilityRepository,
    RealizationReadModel, MAX_DEPTH,
};
use tracing::{debug, info};

use crate::capability::{load_capability, save_capability};
use crate::command::{unexpected, ChangeCapabilityParent, Command, CommandHandler, CommandResult};
use crate::error::{Result, UseCaseError};
use crate::traversal::{ErrorPolicy, Worklist};

/// One descendant to re-level
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CascadeStep {
    capability_id: CapabilityId,
    level: CapabilityLevel,
}

pub struct ChangeCapabilityParentHandler {
    repository: Arc<dyn CapabilityRepository>,
    capabilities: Arc<dyn CapabilityReadModel>,
    realizations: Arc<dyn RealizationReadModel>,
}

impl ChangeCapabilityParentHandler {
    pub fn new(
        repository: Arc<dyn CapabilityRepository>,
        capabilities: Arc<dyn CapabilityReadModel>,
        realizations: Arc<dyn RealizationReadModel>,
    ) -> Self {
        Self {
            repository,
            capabilities,
            realizations,
        }
    }

    pub fn execute(&self, command: ChangeCapabilityParent) -> Result<CommandResult> {
        let capability_id = command.capability_id;
        let mut capability = load_capability(self.repository.as_ref(), &capability_id)?;
        let new_parent_id = command.new_parent_id.filter(|p| !p.is_empty());

        let new_level = match &new_parent_id {
            None => CapabilityLevel::L1,
            Some(parent_id) => self.level_under(&capability_id, parent_id)?,
        };

        let depth = subtree_depth(self.capabilities.as_ref(), &capability_id)?;
        if u16::from(new_level.numeric_value()) + u16::from(depth) > u16::from(MAX_DEPTH) {
            return Err(UseCaseError::WouldExceedMaximumDepth {
                capability_id,
                max_depth: MAX_DEPTH,
            });
        }

        let old_chain = self.chain_from(capability.parent_id())?;
        capability.change_parent(new_parent_id.clone(), new_level)?;
        let new_chain = self.chain_from(new_parent_id.as_ref())?;

        let realizations = self.realizations.get_by_capability_id(&capability_id)?;
        let diff = diff_for_move(&capability, &realizations, &old_chain, &new_chain);
        debug!(
            capability_id = %capability_id,
            additions = diff.additions.len(),
            removals = diff.removals.len(),
            "Inheritance diff for move"
        );
        diff.record_on(&mut capability);

        let result = save_capability(self.repository.as_ref(), &mut capability)?;
        info!(
            capability_id = %capability_id,
            new_parent_id = ?new_parent_id.as_ref().map(CapabilityId::as_str),
            new_level = %new_level,
            "Capability reparented"
        );

        self.cascade_levels(&capability_id, new_level)?;
        Ok(result)
    }

    /// Level the capability would take under `parent_id`
    fn level_under(
        &self,
        capability_id: &CapabilityId,
        parent_id: &CapabilityId,
    ) -> Result<CapabilityLevel> {
        let parent = self
            .capabilities
            .get_by_id(parent_id)?
            .ok_or_else(|| UseCaseError::ParentCapabilityNotFound(parent_id.clone()))?;

        if would_create_cycle(self.capabilities.as_ref(), capability_id, parent_id)? {
            return Err(UseCaseError::WouldCreateCircularReference {
                capability_id: capability_id.clone(),
                new_parent_id: parent_id.clone(),
            });
        }

        parent
            .level
            .child_level()
            .ok_or_else(|| UseCaseError::WouldExceedMaximumDepth {
                capability_id: capability_id.clone(),
                max_depth: MAX_DEPTH,
            })
    }

    fn chain_from(&self, parent_id: Option<&CapabilityId>) -> Result<Vec<CapabilityId>> {
        match parent_id {
            Some(parent_id) => Ok(collect_ancestor_ids(self.capabilities.as_ref(), parent_id)?),
            None => Ok(Vec::new()),
        }
    }

    /// Re-level every descendant below `moved`, one load and save each
    ///
    /// A branch whose next level would pass L4 is left as is.
    fn cascade_levels(&self, moved: &CapabilityId, level: CapabilityLevel) -> Result<()> {
        let Some(child_level) = level.child_level() else {
            return Ok(());
        };
        let first = self
            .capabilities
            .get_children(moved)?
            .into_iter()
            .map(|child| CascadeStep {
                capability_id: child.id,
                level: child_level,
            });

        let mut worklist = Worklist::new(first);
        let report = worklist.walk(ErrorPolicy::FailFast, |step| self.relevel(step))?;
        if !report.completed.is_empty() {
            debug!(
                capability_id = %moved,
                descendants = report.completed.len(),
                "Descendant levels cascaded"
            );
        }
        Ok(())
    }

    fn relevel(&self, step: &CascadeStep) -> Result<Vec<CascadeStep>> {
        let mut child = load_capability(self.repository.as_ref(), &step.capability_id)?;
        let parent_id = child.parent_id().cloned();
        child.change_parent(parent_id, step.level)?;
        save_capability(self.repository.as_ref(), &mut child)?;

        let Some(next_level) = step.level.child_level() else {
            debug!(
                capability_id = %step.capability_id,
                "Cascade stopped below L4"
            );
            return Ok(Vec::new());
        };
        Ok(self
            .capabilities
            .get_children(&step.capability_id)?
            .into_iter()
            .map(|grandchild| CascadeStep {
                capability_id: grandchild.id,
                level: next_level,
            })
            .collect())
    }
}

impl CommandHandler for ChangeCapabilityParentHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::ChangeCapabilityParent(cmd) => self.execute(cmd),
            other => Err(unexpected(&other)),
        }
    }
}

//! Recompute - Repairing inherited realization drift
//!
//! Reconciles the copies that exist for a capability's Direct realizations
//! with the copies its current ancestor chain demands. Running it twice in
//! a row raises nothing the second time.

use std::sync::Arc;

use archcap_domain::service::ancestry::collect_ancestor_ids;
use archcap_domain::service::inheritance::diff_for_recompute;
use archcap_domain::{CapabilityId, CapabilityReadModel, CapabilityRepository, RealizationReadModel};
use tracing::{debug, info};

use crate::capability::{load_capability, save_capability};
use crate::command::{
    unexpected, Command, CommandHandler, CommandResult, RecomputeCapabilityInheritance,
};
use crate::error::{Result, UseCaseError};
use crate::traversal::{ErrorPolicy, Worklist};

pub struct RecomputeCapabilityInheritanceHandler {
    repository: Arc<dyn CapabilityRepository>,
    capabilities: Arc<dyn CapabilityReadModel>,
    realizations: Arc<dyn RealizationReadModel>,
}

impl RecomputeCapabilityInheritanceHandler {
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

    pub fn execute(&self, command: RecomputeCapabilityInheritance) -> Result<CommandResult> {
        let capability_id = command.capability_id;
        let mut capability = load_capability(self.repository.as_ref(), &capability_id)?;

        let ancestors = match capability.parent_id() {
            Some(parent_id) => collect_ancestor_ids(self.capabilities.as_ref(), parent_id)?,
            None => Vec::new(),
        };
        let realizations = self.realizations.get_by_capability_id(&capability_id)?;
        let diff = diff_for_recompute(
            &capability,
            &realizations,
            &ancestors,
            self.realizations.as_ref(),
        )?;

        if diff.is_empty() {
            debug!(capability_id = %capability_id, "Inheritance already consistent");
            return Ok(CommandResult::unchanged(capability_id.as_str()));
        }

        info!(
            capability_id = %capability_id,
            additions = diff.additions.len(),
            removals = diff.removals.len(),
            "Recomputed inheritance"
        );
        diff.record_on(&mut capability);
        save_capability(self.repository.as_ref(), &mut capability)
    }
}

impl CommandHandler for RecomputeCapabilityInheritanceHandler {
    fn handle(&self, command: Command) -> Result<CommandResult> {
        match command {
            Command::RecomputeCapabilityInheritance(cmd) => self.execute(cmd),
            other => Err(unexpected(&other)),
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchRecomputeReport {
    /// Every capability visited successfully
    pub recomputed: Vec<CapabilityId>,
    /// The subset that raised events
    pub changed: Vec<CapabilityId>,
    /// Only populated under `ErrorPolicy::BestEffort`
    pub failed: Vec<(CapabilityId, UseCaseError)>,
}

/// Recompute many capabilities one at a time
///
/// Fail-fast by default: the first error aborts the run.
pub struct BatchRecompute {
    recompute: Arc<RecomputeCapabilityInheritanceHandler>,
    capabilities: Arc<dyn CapabilityReadModel>,
    policy: ErrorPolicy,
}

impl BatchRecompute {
    pub fn new(
        recompute: Arc<RecomputeCapabilityInheritanceHandler>,
        capabilities: Arc<dyn CapabilityReadModel>,
    ) -> Self {
        Self {
            recompute,
            capabilities,
            policy: ErrorPolicy::FailFast,
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Recompute every capability in the tree
    pub fn run_all(&self) -> Result<BatchRecomputeReport> {
        let ids = self
            .capabilities
            .list_all()?
            .into_iter()
            .map(|summary| summary.id);
        self.run(ids)
    }

    pub fn run(&self, ids: impl IntoIterator<Item = CapabilityId>) -> Result<BatchRecomputeReport> {
        let mut changed = Vec::new();
        let mut worklist = Worklist::new(ids);
        let walk = worklist.walk(self.policy, |id| {
            let result = self.recompute.execute(RecomputeCapabilityInheritance {
                capability_id: id.clone(),
            })?;
            if result.events_raised > 0 {
                changed.push(id.clone());
            }
            Ok(Vec::new())
        })?;

        info!(
            recomputed = walk.completed.len(),
            changed = changed.len(),
            failed = walk.failed.len(),
            "Batch recompute finished"
        );
        Ok(BatchRecomputeReport {
            recomputed: walk.completed,
            changed,
            failed: walk.failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fakes, TreeBuilder};
    use archcap_domain::CapabilityEvent;

    fn handler(fakes: &Fakes) -> Arc<RecomputeCapabilityInheritanceHandler> {
        Arc::new(RecomputeCapabilityInheritanceHandler::new(
            fakes.repository(),
            fakes.capabilities(),
            fakes.realizations(),
        ))
    }

    fn recompute(id: &str) -> RecomputeCapabilityInheritance {
        RecomputeCapabilityInheritance {
            capability_id: CapabilityId::new(id),
        }
    }

    #[test]
    fn test_consistent_capability_saves_nothing() {
        let fakes = Fakes::new(TreeBuilder::new().root("p").child("x", "p"));
        fakes.add_direct("r1", "x", "c1");
        fakes.add_inherited("r1@p", "p", "r1", "x");

        let result = handler(&fakes).execute(recompute("x")).unwrap();

        assert_eq!(result.events_raised, 0);
        assert!(fakes.all_saved().is_empty());
    }

    #[test]
    fn test_recompute_repairs_then_is_idempotent() {
        let fakes = Fakes::new(
            TreeBuilder::new()
                .root("r")
                .child("p", "r")
                .child("x", "p")
                .root("stray"),
        );
        fakes.add_direct("r1", "x", "c1");
        fakes.add_inherited("r1@stray", "stray", "r1", "x");

        let handler = handler(&fakes);
        let first = handler.execute(recompute("x")).unwrap();
        assert_eq!(first.events_raised, 2);

        let saved = fakes.saved_events(&CapabilityId::new("x"));
        let CapabilityEvent::CapabilityRealizationsInherited {
            inherited_realizations,
            ..
        } = &saved[0]
        else {
            panic!("expected inherited event, got {:?}", saved[0]);
        };
        let targets: Vec<&str> = inherited_realizations
            .iter()
            .map(|i| i.capability_id.as_str())
            .collect();
        assert_eq!(targets, ["p", "r"]);
        assert!(matches!(
            &saved[1],
            CapabilityEvent::CapabilityRealizationsUninherited { removals, .. }
                if removals[0].capability_ids == [CapabilityId::new("stray")]
        ));

        let second = handler.execute(recompute("x")).unwrap();
        assert_eq!(second.events_raised, 0);
        assert_eq!(fakes.all_saved().len(), 2);
    }

    #[test]
    fn test_batch_fail_fast_aborts() {
        let fakes = Fakes::new(TreeBuilder::new().root("p").child("a", "p").child("b", "p"));
        fakes.add_direct("ra", "a", "c1");
        fakes.add_direct("rb", "b", "c2");
        fakes.fail_saves_for("a");

        let batch = BatchRecompute::new(handler(&fakes), fakes.capabilities());
        let result = batch.run([CapabilityId::new("a"), CapabilityId::new("b")]);

        assert!(matches!(result, Err(UseCaseError::Repository(_))));
        assert!(fakes.saved_events(&CapabilityId::new("b")).is_empty());
    }

    #[test]
    fn test_batch_best_effort_reports_failures() {
        let fakes = Fakes::new(TreeBuilder::new().root("p").child("a", "p").child("b", "p"));
        fakes.add_direct("ra", "a", "c1");
        fakes.add_direct("rb", "b", "c2");
        fakes.fail_saves_for("a");

        let report = BatchRecompute::new(handler(&fakes), fakes.capabilities())
            .with_policy(ErrorPolicy::BestEffort)
            .run_all()
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.as_str(), "a");
        assert_eq!(report.changed, [CapabilityId::new("b")]);
        assert_eq!(report.recomputed.len(), 2);
    }
}

//! In-memory catalog - All adapters wired to all handlers
//!
//! ```text
//! ┌──────────────┐      ┌────────────────────┐      ┌──────────────────┐
//! │ CommandBus   │ ───▶ │ handlers (usecase) │ ───▶ │ EventStore       │
//! └──────▲───────┘      └────────────────────┘      └────────┬─────────┘
//!        │                                                   │ post-commit
//!        │   ┌───────────────────────────────────────────────▼─────────┐
//!        └── │ 1. tree projection 2. realization projection 3. domains │
//!            └─────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use archcap_domain::service::invariants::{check_tree, TreeViolation};
use archcap_domain::{CapabilityId, CapabilityReadModel};
use archcap_usecase::{
    AssignCapabilityToDomainHandler, BatchRecompute, BatchRecomputeReport, CapabilityCrudHandler,
    ChangeCapabilityParentHandler, ChildrenDeletionPolicy, Command, CommandBus, CommandKind,
    CommandResult, CreateCapabilityHandler, DeleteCapabilityHandler, DomainReassignmentHandler,
    ErrorPolicy, EventDispatcher, LinkSystemToCapabilityHandler,
    RecomputeCapabilityInheritanceHandler, Result, UnassignCapabilityFromDomainHandler,
    UnlinkSystemFromCapabilityHandler,
};
use tracing::debug;

use crate::bus::InProcessCommandBus;
use crate::projection::{InMemoryCapabilityReadModel, InMemoryRealizationReadModel};
use crate::repository::{EventSourcedCapabilityRepository, InMemoryAssignmentStore, InMemoryEventStore};

pub struct InMemoryCatalog {
    bus: Arc<InProcessCommandBus>,
    store: InMemoryEventStore,
    capabilities: Arc<InMemoryCapabilityReadModel>,
    realizations: Arc<InMemoryRealizationReadModel>,
    assignments: Arc<InMemoryAssignmentStore>,
    batch: BatchRecompute,
}

impl InMemoryCatalog {
    /// Catalog whose batch recompute stops at the first failure
    pub fn new() -> Result<Self> {
        Self::with_policy(ErrorPolicy::FailFast)
    }

    pub fn with_policy(batch_policy: ErrorPolicy) -> Result<Self> {
        let store = InMemoryEventStore::new();
        let dispatcher = Arc::new(EventDispatcher::new());
        let repository = Arc::new(EventSourcedCapabilityRepository::new(
            store.clone(),
            dispatcher.clone(),
        ));
        let capabilities = Arc::new(InMemoryCapabilityReadModel::new());
        let realizations = Arc::new(InMemoryRealizationReadModel::new());
        let assignments = Arc::new(InMemoryAssignmentStore::new());
        let bus = Arc::new(InProcessCommandBus::new());
        let bus_handle: Arc<dyn CommandBus> = bus.clone();

        dispatcher.register(capabilities.clone());
        dispatcher.register(realizations.clone());
        dispatcher.register(Arc::new(DomainReassignmentHandler::new(
            capabilities.clone(),
            assignments.clone(),
            Arc::downgrade(&bus_handle),
        )));
        drop(bus_handle);

        let recompute = Arc::new(RecomputeCapabilityInheritanceHandler::new(
            repository.clone(),
            capabilities.clone(),
            realizations.clone(),
        ));
        let crud = Arc::new(CapabilityCrudHandler::new(repository.clone()));

        bus.register(
            CommandKind::CreateCapability,
            Arc::new(CreateCapabilityHandler::new(repository.clone(), capabilities.clone())),
        )?;
        for kind in [
            CommandKind::UpdateCapability,
            CommandKind::AddCapabilityTag,
            CommandKind::AddCapabilityExpert,
            CommandKind::RemoveCapabilityExpert,
            CommandKind::UpdateCapabilityMetadata,
        ] {
            bus.register(kind, crud.clone())?;
        }
        bus.register(
            CommandKind::DeleteCapability,
            Arc::new(DeleteCapabilityHandler::new(
                repository.clone(),
                Arc::new(ChildrenDeletionPolicy::new(capabilities.clone())),
            )),
        )?;
        bus.register(
            CommandKind::ChangeCapabilityParent,
            Arc::new(ChangeCapabilityParentHandler::new(
                repository.clone(),
                capabilities.clone(),
                realizations.clone(),
            )),
        )?;
        bus.register(CommandKind::RecomputeCapabilityInheritance, recompute.clone())?;
        bus.register(
            CommandKind::LinkSystemToCapability,
            Arc::new(LinkSystemToCapabilityHandler::new(
                capabilities.clone(),
                realizations.clone(),
                recompute.clone(),
            )),
        )?;
        bus.register(
            CommandKind::UnlinkSystemFromCapability,
            Arc::new(UnlinkSystemFromCapabilityHandler::new(
                repository.clone(),
                realizations.clone(),
                realizations.clone(),
            )),
        )?;
        bus.register(
            CommandKind::AssignCapabilityToDomain,
            Arc::new(AssignCapabilityToDomainHandler::new(
                capabilities.clone(),
                assignments.clone(),
            )),
        )?;
        bus.register(
            CommandKind::UnassignCapabilityFromDomain,
            Arc::new(UnassignCapabilityFromDomainHandler::new(assignments.clone())),
        )?;

        let batch = BatchRecompute::new(recompute, capabilities.clone()).with_policy(batch_policy);
        debug!(
            event_handlers = dispatcher.handler_count(),
            batch_policy = ?batch_policy,
            "In-memory catalog wired"
        );

        Ok(Self {
            bus,
            store,
            capabilities,
            realizations,
            assignments,
            batch,
        })
    }

    pub fn dispatch(&self, command: Command) -> Result<CommandResult> {
        self.bus.dispatch(command)
    }

    pub fn recompute_all(&self) -> Result<BatchRecomputeReport> {
        self.batch.run_all()
    }

    pub fn recompute_many(
        &self,
        ids: impl IntoIterator<Item = CapabilityId>,
    ) -> Result<BatchRecomputeReport> {
        self.batch.run(ids)
    }

    /// Structural violations in the current tree
    pub fn check_tree(&self) -> Result<Vec<TreeViolation>> {
        Ok(check_tree(&self.capabilities.list_all()?))
    }

    pub fn capabilities(&self) -> &InMemoryCapabilityReadModel {
        &self.capabilities
    }

    pub fn realizations(&self) -> &InMemoryRealizationReadModel {
        &self.realizations
    }

    pub fn assignments(&self) -> &InMemoryAssignmentStore {
        &self.assignments
    }

    pub fn event_store(&self) -> &InMemoryEventStore {
        &self.store
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use archcap_domain::{
        AssignmentReader, BusinessDomainId, CapabilityLevel, ComponentId, RealizationId,
        RealizationLevel, RealizationReadModel,
    };
    use archcap_usecase::command::{
        AssignCapabilityToDomain, ChangeCapabilityParent, CreateCapability, LinkSystemToCapability,
        UnlinkSystemFromCapability,
    };
    use archcap_usecase::UseCaseError;

    fn create(catalog: &InMemoryCatalog, id: &str, parent: Option<&str>, level: &str) {
        catalog
            .dispatch(Command::CreateCapability(CreateCapability {
                id: Some(CapabilityId::new(id)),
                name: id.to_uppercase(),
                description: String::new(),
                parent_id: parent.map(CapabilityId::new),
                level: level.to_string(),
            }))
            .unwrap();
    }

    fn link(catalog: &InMemoryCatalog, capability: &str, component: &str) -> RealizationId {
        let result = catalog
            .dispatch(Command::LinkSystemToCapability(LinkSystemToCapability {
                capability_id: CapabilityId::new(capability),
                component_id: ComponentId::new(component),
                component_name: component.to_uppercase(),
                level: RealizationLevel::Partial,
                notes: String::new(),
            }))
            .unwrap();
        RealizationId::new(result.id.unwrap())
    }

    fn reparent(catalog: &InMemoryCatalog, id: &str, parent: Option<&str>) -> Result<CommandResult> {
        catalog.dispatch(Command::ChangeCapabilityParent(ChangeCapabilityParent {
            capability_id: CapabilityId::new(id),
            new_parent_id: parent.map(CapabilityId::new),
        }))
    }

    fn copies_of(catalog: &InMemoryCatalog, realization: &RealizationId) -> Vec<String> {
        catalog
            .realizations()
            .get_inherited_capability_ids_by_source_realization_id(realization)
            .unwrap()
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }

    #[test]
    fn test_reparent_moves_inherited_copies() {
        let catalog = InMemoryCatalog::new().unwrap();
        create(&catalog, "p1", None, "L1");
        create(&catalog, "p2", None, "L1");
        create(&catalog, "x", Some("p1"), "L2");
        let r1 = link(&catalog, "x", "c1");
        assert_eq!(copies_of(&catalog, &r1), ["p1"]);

        reparent(&catalog, "x", Some("p2")).unwrap();

        assert_eq!(copies_of(&catalog, &r1), ["p2"]);
        assert!(catalog.check_tree().unwrap().is_empty());
    }

    #[test]
    fn test_promote_and_cascade_then_recompute_is_idempotent() {
        let catalog = InMemoryCatalog::new().unwrap();
        create(&catalog, "r", None, "L1");
        create(&catalog, "a", Some("r"), "L2");
        create(&catalog, "b", Some("a"), "L3");
        create(&catalog, "c", Some("b"), "L4");
        let rc = link(&catalog, "c", "erp");
        assert_eq!(copies_of(&catalog, &rc), ["a", "b", "r"]);

        reparent(&catalog, "a", None).unwrap();

        let level = |id: &str| {
            catalog
                .capabilities()
                .get_by_id(&CapabilityId::new(id))
                .unwrap()
                .unwrap()
                .level
        };
        assert_eq!(level("a"), CapabilityLevel::L1);
        assert_eq!(level("b"), CapabilityLevel::L2);
        assert_eq!(level("c"), CapabilityLevel::L3);
        assert!(catalog.check_tree().unwrap().is_empty());

        // The copy on the old root travelled away with `a`.
        assert_eq!(copies_of(&catalog, &rc), ["a", "b"]);

        let repaired = catalog.recompute_all().unwrap();
        assert_eq!(repaired.recomputed.len(), 4);
        assert!(repaired.changed.is_empty());

        let events_before = catalog.event_store().count().unwrap();
        let again = catalog.recompute_all().unwrap();
        assert!(again.changed.is_empty());
        assert_eq!(catalog.event_store().count().unwrap(), events_before);
    }

    #[test]
    fn test_rejected_moves_persist_nothing() {
        let catalog = InMemoryCatalog::new().unwrap();
        create(&catalog, "r", None, "L1");
        create(&catalog, "a", Some("r"), "L2");
        create(&catalog, "t", Some("a"), "L3");
        create(&catalog, "c", None, "L1");
        create(&catalog, "c1", Some("c"), "L2");
        create(&catalog, "c2", Some("c1"), "L3");
        let before = catalog.event_store().count().unwrap();

        assert!(matches!(
            reparent(&catalog, "c", Some("t")),
            Err(UseCaseError::WouldExceedMaximumDepth { .. })
        ));
        assert!(matches!(
            reparent(&catalog, "c", Some("c2")),
            Err(UseCaseError::WouldCreateCircularReference { .. })
        ));
        assert_eq!(catalog.event_store().count().unwrap(), before);
    }

    #[test]
    fn test_demoted_root_hands_domains_to_new_root() {
        let catalog = InMemoryCatalog::new().unwrap();
        create(&catalog, "p", None, "L1");
        create(&catalog, "c", None, "L1");
        for (domain, capability) in [("bd1", "c"), ("bd1", "p"), ("bd2", "c")] {
            catalog
                .dispatch(Command::AssignCapabilityToDomain(AssignCapabilityToDomain {
                    business_domain_id: BusinessDomainId::new(domain),
                    capability_id: CapabilityId::new(capability),
                }))
                .unwrap();
        }

        reparent(&catalog, "c", Some("p")).unwrap();

        let assignments = catalog.assignments();
        assert!(assignments
            .get_by_capability_id(&CapabilityId::new("c"))
            .unwrap()
            .is_empty());
        let mut on_p: Vec<String> = assignments
            .get_by_capability_id(&CapabilityId::new("p"))
            .unwrap()
            .into_iter()
            .map(|a| a.business_domain_id.to_string())
            .collect();
        on_p.sort();
        assert_eq!(on_p, ["bd1", "bd2"]);
    }

    #[test]
    fn test_unlink_clears_copies() {
        let catalog = InMemoryCatalog::new().unwrap();
        create(&catalog, "r", None, "L1");
        create(&catalog, "x", Some("r"), "L2");
        let r1 = link(&catalog, "x", "crm");

        catalog
            .dispatch(Command::UnlinkSystemFromCapability(UnlinkSystemFromCapability {
                realization_id: r1.clone(),
            }))
            .unwrap();

        assert!(copies_of(&catalog, &r1).is_empty());
        assert!(catalog.realizations().list_all().unwrap().is_empty());
    }

    #[test]
    fn test_dropping_catalog_releases_bus() {
        let catalog = InMemoryCatalog::new().unwrap();
        create(&catalog, "p", None, "L1");
        create(&catalog, "x", Some("p"), "L2");
        let bus = Arc::downgrade(&catalog.bus);
        let capabilities = Arc::downgrade(&catalog.capabilities);

        drop(catalog);

        assert!(bus.upgrade().is_none());
        assert!(capabilities.upgrade().is_none());
    }

    #[test]
    fn test_recompute_many_reports_per_capability() {
        let catalog = InMemoryCatalog::new().unwrap();
        create(&catalog, "p", None, "L1");
        create(&catalog, "x", Some("p"), "L2");
        link(&catalog, "x", "c1");

        let report = catalog
            .recompute_many([CapabilityId::new("x"), CapabilityId::new("p")])
            .unwrap();
        assert_eq!(report.recomputed.len(), 2);
        assert!(report.changed.is_empty());

        let missing = catalog.recompute_many([CapabilityId::new("ghost")]);
        assert!(missing.is_err());
    }
}

//! In-memory fakes for handler tests
//!
//! The fake repository projects saved events into the fake read models the
//! way the real adapter does, so multi-step flows (reparent then recompute)
//! can be exercised without the adapter crate.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use archcap_domain::{
    AssignmentId, AssignmentReader, AssignmentRepository, BusinessDomainAssignment,
    BusinessDomainId, Capability, CapabilityEvent, CapabilityId, CapabilityLevel,
    CapabilityReadModel, CapabilityRepository, CapabilitySummary, ComponentId, InheritanceSource,
    Realization, RealizationId, RealizationLevel, RealizationOrigin, RealizationReadModel,
    RealizationRepository, RepositoryError,
};
use chrono::Utc;

use crate::command::{Command, CommandBus, CommandResult};
use crate::error::Result;

#[derive(Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<CapabilitySummary>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn root(self, id: &str) -> Self {
        self.node(id, None, CapabilityLevel::L1)
    }

    /// Child one level below `parent`
    pub(crate) fn child(self, id: &str, parent: &str) -> Self {
        let parent_level = self
            .nodes
            .iter()
            .find(|n| n.id.as_str() == parent)
            .map(|n| n.level)
            .unwrap_or(CapabilityLevel::L1);
        let level = parent_level.child_level().unwrap_or(CapabilityLevel::L4);
        self.node(id, Some(parent), level)
    }

    /// Arbitrary node, consistency not checked
    pub(crate) fn node(mut self, id: &str, parent: Option<&str>, level: CapabilityLevel) -> Self {
        self.nodes.push(CapabilitySummary::new(
            id,
            id.to_uppercase(),
            parent.map(CapabilityId::new),
            level,
        ));
        self
    }
}

#[derive(Default)]
pub(crate) struct FakeTree {
    nodes: Mutex<HashMap<CapabilityId, CapabilitySummary>>,
}

impl CapabilityReadModel for FakeTree {
    fn get_by_id(&self, id: &CapabilityId) -> std::result::Result<Option<CapabilitySummary>, RepositoryError> {
        Ok(self.nodes.lock().unwrap().get(id).cloned())
    }

    fn get_children(
        &self,
        parent_id: &CapabilityId,
    ) -> std::result::Result<Vec<CapabilitySummary>, RepositoryError> {
        let mut children: Vec<_> = self
            .nodes
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.parent_id.as_ref() == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(children)
    }

    fn list_all(&self) -> std::result::Result<Vec<CapabilitySummary>, RepositoryError> {
        let mut all: Vec<_> = self.nodes.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

#[derive(Default)]
pub(crate) struct FakeRealizations {
    rows: Mutex<Vec<Realization>>,
}

impl FakeRealizations {
    fn project(&self, event: &CapabilityEvent) {
        let mut rows = self.rows.lock().unwrap();
        match event {
            CapabilityEvent::CapabilityRealizationsInherited {
                inherited_realizations,
                ..
            } => {
                for copy in inherited_realizations {
                    rows.push(Realization {
                        id: RealizationId::new(format!(
                            "{}@{}",
                            copy.source_realization_id, copy.capability_id
                        )),
                        capability_id: copy.capability_id.clone(),
                        component_id: copy.component_id.clone(),
                        component_name: copy.component_name.clone(),
                        level: copy.realization_level,
                        notes: copy.notes.clone(),
                        origin: RealizationOrigin::Inherited,
                        source: Some(InheritanceSource {
                            source_realization_id: copy.source_realization_id.clone(),
                            source_capability_id: copy.source_capability_id.clone(),
                            source_capability_name: copy.source_capability_name.clone(),
                            linked_at: copy.linked_at,
                        }),
                        linked_at: copy.linked_at,
                    });
                }
            }
            CapabilityEvent::CapabilityRealizationsUninherited { removals, .. } => {
                for removal in removals {
                    let targets: HashSet<_> = removal.capability_ids.iter().collect();
                    rows.retain(|r| {
                        !(r.is_inherited()
                            && r.source_realization_id() == &removal.source_realization_id
                            && targets.contains(&r.capability_id))
                    });
                }
            }
            _ => {}
        }
    }
}

impl RealizationReadModel for FakeRealizations {
    fn get_by_capability_id(
        &self,
        capability_id: &CapabilityId,
    ) -> std::result::Result<Vec<Realization>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.capability_id == capability_id)
            .cloned()
            .collect())
    }

    fn get_inherited_capability_ids_by_source_realization_id(
        &self,
        source_id: &RealizationId,
    ) -> std::result::Result<Vec<CapabilityId>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_inherited() && r.source_realization_id() == source_id)
            .map(|r| r.capability_id.clone())
            .collect())
    }

    fn get_by_id(&self, id: &RealizationId) -> std::result::Result<Option<Realization>, RepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| &r.id == id).cloned())
    }
}

impl RealizationRepository for FakeRealizations {
    fn save_direct(&self, realization: Realization) -> std::result::Result<(), RepositoryError> {
        self.rows.lock().unwrap().push(realization);
        Ok(())
    }

    fn delete_direct(
        &self,
        id: &RealizationId,
    ) -> std::result::Result<Option<Realization>, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let position = rows.iter().position(|r| &r.id == id && r.is_direct());
        Ok(position.map(|p| rows.remove(p)))
    }
}

/// Event-sourced repository over plain vectors
#[derive(Default)]
pub(crate) struct FakeRepository {
    streams: Mutex<HashMap<CapabilityId, Vec<CapabilityEvent>>>,
    saved: Mutex<Vec<CapabilityEvent>>,
    failing: Mutex<HashSet<CapabilityId>>,
    tree: Arc<FakeTree>,
    realizations: Arc<FakeRealizations>,
}

impl FakeRepository {
    fn project_tree(&self, event: &CapabilityEvent) {
        let mut nodes = self.tree.nodes.lock().unwrap();
        match event {
            CapabilityEvent::CapabilityCreated {
                capability_id,
                name,
                parent_id,
                level,
                ..
            } => {
                nodes.insert(
                    capability_id.clone(),
                    CapabilitySummary::new(capability_id.clone(), name.clone(), parent_id.clone(), *level),
                );
            }
            CapabilityEvent::CapabilityParentChanged {
                capability_id,
                new_parent_id,
                new_level,
                ..
            } => {
                if let Some(node) = nodes.get_mut(capability_id) {
                    node.parent_id = new_parent_id.clone();
                    node.level = *new_level;
                }
            }
            CapabilityEvent::CapabilityDeleted { capability_id, .. } => {
                nodes.remove(capability_id);
            }
            _ => {}
        }
    }
}

impl CapabilityRepository for FakeRepository {
    fn get_by_id(&self, id: &CapabilityId) -> std::result::Result<Capability, RepositoryError> {
        let streams = self.streams.lock().unwrap();
        let history = streams
            .get(id)
            .ok_or_else(|| RepositoryError::not_found("Capability", id.as_str()))?;
        Capability::load_from_history(history.clone())
            .map_err(|e| RepositoryError::persistence(e.to_string()))
    }

    fn save(&self, capability: &mut Capability) -> std::result::Result<(), RepositoryError> {
        if self.failing.lock().unwrap().contains(capability.id()) {
            return Err(RepositoryError::persistence("injected failure"));
        }
        let events = capability.take_uncommitted_events();
        self.streams
            .lock()
            .unwrap()
            .entry(capability.id().clone())
            .or_default()
            .extend(events.iter().cloned());
        for event in &events {
            self.project_tree(event);
            self.realizations.project(event);
        }
        self.saved.lock().unwrap().extend(events);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAssignments {
    rows: Mutex<Vec<BusinessDomainAssignment>>,
}

impl FakeAssignments {
    pub(crate) fn with(self, domain: &str, capability: &str) -> Self {
        self.rows.lock().unwrap().push(BusinessDomainAssignment::new(
            AssignmentId::new(format!("{domain}:{capability}")),
            BusinessDomainId::new(domain),
            CapabilityId::new(capability),
        ));
        self
    }
}

impl AssignmentReader for FakeAssignments {
    fn get_by_capability_id(
        &self,
        capability_id: &CapabilityId,
    ) -> std::result::Result<Vec<BusinessDomainAssignment>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| &a.capability_id == capability_id)
            .cloned()
            .collect())
    }
}

impl AssignmentRepository for FakeAssignments {
    fn save(&self, assignment: BusinessDomainAssignment) -> std::result::Result<(), RepositoryError> {
        self.rows.lock().unwrap().push(assignment);
        Ok(())
    }

    fn unassign(
        &self,
        business_domain_id: &BusinessDomainId,
        capability_id: &CapabilityId,
    ) -> std::result::Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| {
            !(&a.business_domain_id == business_domain_id && &a.capability_id == capability_id)
        });
        Ok(rows.len() != before)
    }
}

/// Records commands; optionally fails the ones matching a predicate
#[derive(Default)]
pub(crate) struct RecordingBus {
    pub(crate) commands: Mutex<Vec<Command>>,
    fail_unassign_from: Mutex<Option<BusinessDomainId>>,
}

impl RecordingBus {
    pub(crate) fn fail_unassign_for(&self, domain: &str) {
        *self.fail_unassign_from.lock().unwrap() = Some(BusinessDomainId::new(domain));
    }

    pub(crate) fn dispatched(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandBus for RecordingBus {
    fn dispatch(&self, command: Command) -> Result<CommandResult> {
        self.commands.lock().unwrap().push(command.clone());
        if let Command::UnassignCapabilityFromDomain(cmd) = &command {
            if self.fail_unassign_from.lock().unwrap().as_ref() == Some(&cmd.business_domain_id) {
                return Err(RepositoryError::persistence("injected failure").into());
            }
        }
        Ok(CommandResult::default())
    }
}

/// Wired set of fakes sharing one projected state
pub(crate) struct Fakes {
    repository: Arc<FakeRepository>,
}

impl Fakes {
    pub(crate) fn new(tree: TreeBuilder) -> Self {
        let repository = Arc::new(FakeRepository::default());
        {
            let mut nodes = repository.tree.nodes.lock().unwrap();
            let mut streams = repository.streams.lock().unwrap();
            for node in tree.nodes {
                if let Ok(mut capability) = Capability::new(
                    node.id.clone(),
                    &node.name,
                    "",
                    node.parent_id.clone(),
                    node.level,
                ) {
                    streams.insert(node.id.clone(), capability.take_uncommitted_events());
                }
                nodes.insert(node.id.clone(), node);
            }
        }
        Self { repository }
    }

    pub(crate) fn repository(&self) -> Arc<dyn CapabilityRepository> {
        self.repository.clone()
    }

    pub(crate) fn capabilities(&self) -> Arc<dyn CapabilityReadModel> {
        self.repository.tree.clone()
    }

    pub(crate) fn realizations(&self) -> Arc<FakeRealizations> {
        self.repository.realizations.clone()
    }

    pub(crate) fn fail_saves_for(&self, id: &str) {
        self.repository
            .failing
            .lock()
            .unwrap()
            .insert(CapabilityId::new(id));
    }

    pub(crate) fn add_direct(&self, id: &str, capability: &str, component: &str) {
        self.repository
            .realizations
            .rows
            .lock()
            .unwrap()
            .push(Realization::direct(
                RealizationId::new(id),
                CapabilityId::new(capability),
                ComponentId::new(component),
                component.to_uppercase(),
                RealizationLevel::Partial,
                Utc::now(),
            ));
    }

    /// Inherited copy of `source` (owned by `source_capability`) on `capability`
    pub(crate) fn add_inherited(
        &self,
        id: &str,
        capability: &str,
        source: &str,
        source_capability: &str,
    ) {
        let now = Utc::now();
        self.repository.realizations.rows.lock().unwrap().push(Realization {
            id: RealizationId::new(id),
            capability_id: CapabilityId::new(capability),
            component_id: ComponentId::new("comp-derived"),
            component_name: "Derived".to_string(),
            level: RealizationLevel::Full,
            notes: String::new(),
            origin: RealizationOrigin::Inherited,
            source: Some(InheritanceSource {
                source_realization_id: RealizationId::new(source),
                source_capability_id: CapabilityId::new(source_capability),
                source_capability_name: source_capability.to_uppercase(),
                linked_at: now,
            }),
            linked_at: now,
        });
    }

    /// Events saved since the fixture was built
    pub(crate) fn all_saved(&self) -> Vec<CapabilityEvent> {
        self.repository.saved.lock().unwrap().clone()
    }

    pub(crate) fn saved_events(&self, id: &CapabilityId) -> Vec<CapabilityEvent> {
        self.all_saved()
            .into_iter()
            .filter(|e| e.capability_id() == id)
            .collect()
    }

    pub(crate) fn level_of(&self, id: &str) -> Option<CapabilityLevel> {
        self.repository
            .tree
            .nodes
            .lock()
            .unwrap()
            .get(&CapabilityId::new(id))
            .map(|n| n.level)
    }
}

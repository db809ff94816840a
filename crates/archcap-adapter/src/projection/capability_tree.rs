//! Capability tree projection
//!
//! Keeps one summary per active capability. A deleted capability leaves
//! the tree.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use archcap_domain::{CapabilityEvent, CapabilityId, CapabilityReadModel, CapabilitySummary, RepositoryError};
use archcap_usecase::{EventHandler, Result};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCapabilityReadModel {
    nodes: Arc<RwLock<HashMap<CapabilityId, CapabilitySummary>>>,
}

impl InMemoryCapabilityReadModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event to the tree
    pub fn project(&self, event: &CapabilityEvent) -> std::result::Result<(), RepositoryError> {
        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| RepositoryError::persistence("Failed to acquire write lock"))?;

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
            CapabilityEvent::CapabilityUpdated {
                capability_id, name, ..
            } => {
                if let Some(node) = nodes.get_mut(capability_id) {
                    node.name = name.clone();
                }
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
        Ok(())
    }

    fn sorted(&self, keep: impl Fn(&CapabilitySummary) -> bool) -> std::result::Result<Vec<CapabilitySummary>, RepositoryError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        let mut found: Vec<_> = nodes.values().filter(|n| keep(n)).cloned().collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}

impl CapabilityReadModel for InMemoryCapabilityReadModel {
    fn get_by_id(&self, id: &CapabilityId) -> std::result::Result<Option<CapabilitySummary>, RepositoryError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        Ok(nodes.get(id).cloned())
    }

    fn get_children(
        &self,
        parent_id: &CapabilityId,
    ) -> std::result::Result<Vec<CapabilitySummary>, RepositoryError> {
        self.sorted(|n| n.parent_id.as_ref() == Some(parent_id))
    }

    fn list_all(&self) -> std::result::Result<Vec<CapabilitySummary>, RepositoryError> {
        self.sorted(|_| true)
    }
}

impl EventHandler for InMemoryCapabilityReadModel {
    fn name(&self) -> &'static str {
        "capability-tree"
    }

    fn handle(&self, event: &CapabilityEvent) -> Result<()> {
        Ok(self.project(event)?)
    }
}

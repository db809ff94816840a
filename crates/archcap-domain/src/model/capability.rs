//! Capability - The event-sourced aggregate of the capability tree
//!
//! A Capability is an Entity. Its state is rebuilt by replaying its event
//! history through a single `apply` match; every mutation raises an event
//! that is applied in memory and kept as uncommitted until the repository
//! persists it.
//!
//! The aggregate guards only its own invariants (name, level/parent
//! consistency). Tree-wide rules such as depth and cycles need read-model
//! knowledge and live in the reparenting orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::CapabilityEvent;
use super::id::CapabilityId;
use super::level::CapabilityLevel;
use super::realization::{InheritedRealization, RealizationInheritanceRemoval};

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Errors raised while validating a capability mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("Capability id must not be empty")]
    EmptyId,

    #[error("Capability name must not be empty")]
    EmptyName,

    #[error("Capability name exceeds {max} characters")]
    NameTooLong { max: usize },

    #[error("Capability description exceeds {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("Invalid capability level '{0}', expected one of L1, L2, L3, L4")]
    InvalidLevel(String),

    #[error("An L1 capability cannot have a parent")]
    RootWithParent,

    #[error("A {level} capability must have a parent")]
    MissingParent { level: CapabilityLevel },

    #[error("A capability cannot be its own parent")]
    SelfParent,

    #[error("Tag must not be empty")]
    EmptyTag,

    #[error("Expert name must not be empty")]
    EmptyExpertName,

    #[error("Expert '{0}' is not assigned to this capability")]
    ExpertNotFound(String),

    #[error("Corrupt event history: {0}")]
    CorruptHistory(String),
}

/// A subject-matter expert for a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub name: String,
    pub role: String,
    pub contact: String,
}

impl Expert {
    pub fn new(name: impl Into<String>, role: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            contact: contact.into(),
        }
    }
}

/// Descriptive metadata, replaced as a whole on update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityMetadata {
    #[serde(default)]
    pub maturity_level: Option<String>,
    #[serde(default)]
    pub ownership_model: Option<String>,
    #[serde(default)]
    pub primary_owner: Option<String>,
    #[serde(default)]
    pub ea_owner: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Capability - A node of the 4-level business capability tree
#[derive(Debug, Clone)]
pub struct Capability {
    id: CapabilityId,
    name: String,
    description: String,
    parent_id: Option<CapabilityId>,
    level: CapabilityLevel,
    tags: Vec<String>,
    experts: Vec<Expert>,
    metadata: CapabilityMetadata,
    active: bool,
    created_at: DateTime<Utc>,
    /// Number of events applied, committed or not
    version: u64,
    /// Raised but not yet persisted
    changes: Vec<CapabilityEvent>,
}

impl Capability {
    /// Create a new capability, raising `CapabilityCreated`
    pub fn new(
        id: CapabilityId,
        name: &str,
        description: &str,
        parent_id: Option<CapabilityId>,
        level: CapabilityLevel,
    ) -> Result<Self, CapabilityError> {
        if id.is_empty() {
            return Err(CapabilityError::EmptyId);
        }
        let name = validate_name(name)?;
        let description = validate_description(description)?;
        let parent_id = parent_id.filter(|p| !p.is_empty());
        validate_placement(&id, parent_id.as_ref(), level)?;

        let mut capability = Self::blank(id.clone());
        capability.raise(CapabilityEvent::CapabilityCreated {
            capability_id: id,
            name,
            description,
            parent_id,
            level,
            created_at: Utc::now(),
        });
        Ok(capability)
    }

    /// Rebuild a capability by replaying its history
    pub fn load_from_history(
        events: impl IntoIterator<Item = CapabilityEvent>,
    ) -> Result<Self, CapabilityError> {
        let mut events = events.into_iter();
        let first = events
            .next()
            .ok_or_else(|| CapabilityError::CorruptHistory("empty event stream".to_string()))?;

        let mut capability = match &first {
            CapabilityEvent::CapabilityCreated { capability_id, .. } => {
                Self::blank(capability_id.clone())
            }
            other => {
                return Err(CapabilityError::CorruptHistory(format!(
                    "stream starts with {} instead of CapabilityCreated",
                    other.event_type()
                )))
            }
        };

        capability.apply(&first);
        for event in events {
            if event.capability_id() != &capability.id {
                return Err(CapabilityError::CorruptHistory(format!(
                    "event for {} found in stream of {}",
                    event.capability_id(),
                    capability.id
                )));
            }
            capability.apply(&event);
        }
        Ok(capability)
    }

    fn blank(id: CapabilityId) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            parent_id: None,
            level: CapabilityLevel::L1,
            tags: Vec::new(),
            experts: Vec::new(),
            metadata: CapabilityMetadata::default(),
            active: true,
            created_at: DateTime::<Utc>::default(),
            version: 0,
            changes: Vec::new(),
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &CapabilityId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parent_id(&self) -> Option<&CapabilityId> {
        self.parent_id.as_ref()
    }

    pub fn level(&self) -> CapabilityLevel {
        self.level
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn experts(&self) -> &[Expert] {
        &self.experts
    }

    pub fn metadata(&self) -> &CapabilityMetadata {
        &self.metadata
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Version of the stream as last loaded or saved
    pub fn committed_version(&self) -> u64 {
        self.version - self.changes.len() as u64
    }

    pub fn uncommitted_events(&self) -> &[CapabilityEvent] {
        &self.changes
    }

    /// Hand the uncommitted events to the repository
    pub fn take_uncommitted_events(&mut self) -> Vec<CapabilityEvent> {
        std::mem::take(&mut self.changes)
    }

    // ========== Structural Mutations ==========

    /// Move the capability, raising `CapabilityParentChanged`
    ///
    /// Inheritance is not recomputed here.
    pub fn change_parent(
        &mut self,
        new_parent_id: Option<CapabilityId>,
        new_level: CapabilityLevel,
    ) -> Result<(), CapabilityError> {
        let new_parent_id = new_parent_id.filter(|p| !p.is_empty());
        validate_placement(&self.id, new_parent_id.as_ref(), new_level)?;

        self.raise(CapabilityEvent::CapabilityParentChanged {
            capability_id: self.id.clone(),
            old_parent_id: self.parent_id.clone(),
            new_parent_id,
            old_level: self.level,
            new_level,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    /// Soft-delete the capability
    pub fn delete(&mut self) {
        self.raise(CapabilityEvent::CapabilityDeleted {
            capability_id: self.id.clone(),
            deleted_at: Utc::now(),
        });
    }

    /// Attach derived copies of realizations to ancestors
    pub fn record_inherited_realizations(&mut self, inherited: Vec<InheritedRealization>) {
        if inherited.is_empty() {
            return;
        }
        self.raise(CapabilityEvent::CapabilityRealizationsInherited {
            capability_id: self.id.clone(),
            inherited_realizations: inherited,
        });
    }

    /// Drop derived copies of realizations from former ancestors
    pub fn record_uninherited_realizations(&mut self, removals: Vec<RealizationInheritanceRemoval>) {
        if removals.is_empty() {
            return;
        }
        self.raise(CapabilityEvent::CapabilityRealizationsUninherited {
            capability_id: self.id.clone(),
            removals,
        });
    }

    // ========== CRUD Mutations ==========

    pub fn update(&mut self, name: &str, description: &str) -> Result<(), CapabilityError> {
        let name = validate_name(name)?;
        let description = validate_description(description)?;
        self.raise(CapabilityEvent::CapabilityUpdated {
            capability_id: self.id.clone(),
            name,
            description,
        });
        Ok(())
    }

    pub fn add_expert(&mut self, expert: Expert) -> Result<(), CapabilityError> {
        if expert.name.trim().is_empty() {
            return Err(CapabilityError::EmptyExpertName);
        }
        self.raise(CapabilityEvent::CapabilityExpertAdded {
            capability_id: self.id.clone(),
            expert,
        });
        Ok(())
    }

    pub fn remove_expert(&mut self, expert_name: &str) -> Result<(), CapabilityError> {
        if !self.experts.iter().any(|e| e.name == expert_name) {
            return Err(CapabilityError::ExpertNotFound(expert_name.to_string()));
        }
        self.raise(CapabilityEvent::CapabilityExpertRemoved {
            capability_id: self.id.clone(),
            expert_name: expert_name.to_string(),
        });
        Ok(())
    }

    /// Add a tag; adding a tag twice is a no-op
    pub fn add_tag(&mut self, tag: &str) -> Result<(), CapabilityError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(CapabilityError::EmptyTag);
        }
        if self.tags.iter().any(|t| t == tag) {
            return Ok(());
        }
        self.raise(CapabilityEvent::CapabilityTagAdded {
            capability_id: self.id.clone(),
            tag: tag.to_string(),
        });
        Ok(())
    }

    pub fn update_metadata(&mut self, metadata: CapabilityMetadata) {
        self.raise(CapabilityEvent::CapabilityMetadataUpdated {
            capability_id: self.id.clone(),
            metadata,
        });
    }

    // ========== Event Application ==========

    fn raise(&mut self, event: CapabilityEvent) {
        self.apply(&event);
        self.changes.push(event);
    }

    /// Fold one event into the current state
    fn apply(&mut self, event: &CapabilityEvent) {
        match event {
            CapabilityEvent::CapabilityCreated {
                name,
                description,
                parent_id,
                level,
                created_at,
                ..
            } => {
                self.name = name.clone();
                self.description = description.clone();
                self.parent_id = parent_id.clone();
                self.level = *level;
                self.created_at = *created_at;
                self.active = true;
            }
            CapabilityEvent::CapabilityUpdated {
                name, description, ..
            } => {
                self.name = name.clone();
                self.description = description.clone();
            }
            CapabilityEvent::CapabilityParentChanged {
                new_parent_id,
                new_level,
                ..
            } => {
                self.parent_id = new_parent_id.clone();
                self.level = *new_level;
            }
            CapabilityEvent::CapabilityDeleted { .. } => {
                self.active = false;
            }
            CapabilityEvent::CapabilityExpertAdded { expert, .. } => {
                self.experts.push(expert.clone());
            }
            CapabilityEvent::CapabilityExpertRemoved { expert_name, .. } => {
                self.experts.retain(|e| &e.name != expert_name);
            }
            CapabilityEvent::CapabilityTagAdded { tag, .. } => {
                self.tags.push(tag.clone());
            }
            CapabilityEvent::CapabilityMetadataUpdated { metadata, .. } => {
                self.metadata = metadata.clone();
            }
            // Inherited copies live in the realization read model; the
            // aggregate only records that they were produced.
            CapabilityEvent::CapabilityRealizationsInherited { .. }
            | CapabilityEvent::CapabilityRealizationsUninherited { .. } => {}
        }
        self.version += 1;
    }
}

fn validate_name(name: &str) -> Result<String, CapabilityError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CapabilityError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CapabilityError::NameTooLong {
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_string())
}

fn validate_description(description: &str) -> Result<String, CapabilityError> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(CapabilityError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LENGTH,
        });
    }
    Ok(description.to_string())
}

/// L1 has no parent; L2-L4 always have one
fn validate_placement(
    id: &CapabilityId,
    parent_id: Option<&CapabilityId>,
    level: CapabilityLevel,
) -> Result<(), CapabilityError> {
    match (level.is_root(), parent_id) {
        (true, Some(_)) => Err(CapabilityError::RootWithParent),
        (false, None) => Err(CapabilityError::MissingParent { level }),
        (false, Some(parent)) if parent == id => Err(CapabilityError::SelfParent),
        _ => Ok(()),
    }
}

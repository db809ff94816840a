//! Realization - Which IT component implements which capability
//!
//! A Direct realization is created by a user at one capability. Every
//! ancestor of that capability carries an Inherited copy of it, produced
//! by the inheritance diff engine and never by a user command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CapabilityId, ComponentId, RealizationId};

/// How completely a component covers a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RealizationLevel {
    Full,
    Partial,
    Planned,
}

impl RealizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Partial => "Partial",
            Self::Planned => "Planned",
        }
    }

    /// Case-insensitive; `None` for anything else
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Some(Self::Full),
            "partial" => Some(Self::Partial),
            "planned" => Some(Self::Planned),
            _ => None,
        }
    }
}

impl core::fmt::Display for RealizationLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a realization row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RealizationOrigin {
    Direct,
    Inherited,
}

/// Back-reference carried only by Inherited realizations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceSource {
    pub source_realization_id: RealizationId,
    pub source_capability_id: CapabilityId,
    pub source_capability_name: String,
    pub linked_at: DateTime<Utc>,
}

/// A realization as seen through the realization read model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Realization {
    pub id: RealizationId,
    pub capability_id: CapabilityId,
    pub component_id: ComponentId,
    pub component_name: String,
    pub level: RealizationLevel,
    pub notes: String,
    pub origin: RealizationOrigin,
    /// Present iff `origin == Inherited`
    pub source: Option<InheritanceSource>,
    pub linked_at: DateTime<Utc>,
}

impl Realization {
    /// Build a Direct realization
    pub fn direct(
        id: RealizationId,
        capability_id: CapabilityId,
        component_id: ComponentId,
        component_name: impl Into<String>,
        level: RealizationLevel,
        linked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            capability_id,
            component_id,
            component_name: component_name.into(),
            level,
            notes: String::new(),
            origin: RealizationOrigin::Direct,
            source: None,
            linked_at,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn is_direct(&self) -> bool {
        self.origin == RealizationOrigin::Direct
    }

    pub fn is_inherited(&self) -> bool {
        self.origin == RealizationOrigin::Inherited
    }

    /// The realization this row ultimately derives from
    ///
    /// A Direct realization is its own source.
    pub fn source_realization_id(&self) -> &RealizationId {
        match &self.source {
            Some(source) => &source.source_realization_id,
            None => &self.id,
        }
    }
}

/// One derived copy to attach to an ancestor capability
///
/// Payload entry of `CapabilityRealizationsInherited`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritedRealization {
    /// The ancestor receiving the copy
    pub capability_id: CapabilityId,
    pub component_id: ComponentId,
    pub component_name: String,
    pub realization_level: RealizationLevel,
    pub notes: String,
    pub origin: RealizationOrigin,
    pub source_realization_id: RealizationId,
    pub source_capability_id: CapabilityId,
    pub source_capability_name: String,
    pub linked_at: DateTime<Utc>,
}

/// All inherited copies of one source realization to drop
///
/// Payload entry of `CapabilityRealizationsUninherited`. `capability_ids`
/// is kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizationInheritanceRemoval {
    pub source_realization_id: RealizationId,
    pub capability_ids: Vec<CapabilityId>,
}

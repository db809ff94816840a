//! Capability Events - The replayable history of a capability
//!
//! A capability's state is nothing but the fold of these events. The enum
//! is the whole event contract: the event store persists it, projections
//! and cascades consume it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::capability::{CapabilityMetadata, Expert};
use super::id::CapabilityId;
use super::level::CapabilityLevel;
use super::realization::{InheritedRealization, RealizationInheritanceRemoval};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum CapabilityEvent {
    CapabilityCreated {
        capability_id: CapabilityId,
        name: String,
        description: String,
        parent_id: Option<CapabilityId>,
        level: CapabilityLevel,
        created_at: DateTime<Utc>,
    },
    CapabilityUpdated {
        capability_id: CapabilityId,
        name: String,
        description: String,
    },
    CapabilityParentChanged {
        capability_id: CapabilityId,
        old_parent_id: Option<CapabilityId>,
        new_parent_id: Option<CapabilityId>,
        old_level: CapabilityLevel,
        new_level: CapabilityLevel,
        occurred_at: DateTime<Utc>,
    },
    CapabilityDeleted {
        capability_id: CapabilityId,
        deleted_at: DateTime<Utc>,
    },
    CapabilityExpertAdded {
        capability_id: CapabilityId,
        expert: Expert,
    },
    CapabilityExpertRemoved {
        capability_id: CapabilityId,
        expert_name: String,
    },
    CapabilityTagAdded {
        capability_id: CapabilityId,
        tag: String,
    },
    CapabilityMetadataUpdated {
        capability_id: CapabilityId,
        metadata: CapabilityMetadata,
    },
    CapabilityRealizationsInherited {
        capability_id: CapabilityId,
        inherited_realizations: Vec<InheritedRealization>,
    },
    CapabilityRealizationsUninherited {
        capability_id: CapabilityId,
        removals: Vec<RealizationInheritanceRemoval>,
    },
}

impl CapabilityEvent {
    /// The aggregate this event belongs to
    pub fn capability_id(&self) -> &CapabilityId {
        match self {
            Self::CapabilityCreated { capability_id, .. }
            | Self::CapabilityUpdated { capability_id, .. }
            | Self::CapabilityParentChanged { capability_id, .. }
            | Self::CapabilityDeleted { capability_id, .. }
            | Self::CapabilityExpertAdded { capability_id, .. }
            | Self::CapabilityExpertRemoved { capability_id, .. }
            | Self::CapabilityTagAdded { capability_id, .. }
            | Self::CapabilityMetadataUpdated { capability_id, .. }
            | Self::CapabilityRealizationsInherited { capability_id, .. }
            | Self::CapabilityRealizationsUninherited { capability_id, .. } => capability_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CapabilityCreated { .. } => "CapabilityCreated",
            Self::CapabilityUpdated { .. } => "CapabilityUpdated",
            Self::CapabilityParentChanged { .. } => "CapabilityParentChanged",
            Self::CapabilityDeleted { .. } => "CapabilityDeleted",
            Self::CapabilityExpertAdded { .. } => "CapabilityExpertAdded",
            Self::CapabilityExpertRemoved { .. } => "CapabilityExpertRemoved",
            Self::CapabilityTagAdded { .. } => "CapabilityTagAdded",
            Self::CapabilityMetadataUpdated { .. } => "CapabilityMetadataUpdated",
            Self::CapabilityRealizationsInherited { .. } => "CapabilityRealizationsInherited",
            Self::CapabilityRealizationsUninherited { .. } => "CapabilityRealizationsUninherited",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged_by_type() {
        let event = CapabilityEvent::CapabilityParentChanged {
            capability_id: CapabilityId::new("cap-x"),
            old_parent_id: Some(CapabilityId::new("p1")),
            new_parent_id: None,
            old_level: CapabilityLevel::L2,
            new_level: CapabilityLevel::L1,
            occurred_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CapabilityParentChanged");
        assert_eq!(json["oldParentId"], "p1");
        assert!(json["newParentId"].is_null());
        assert_eq!(json["newLevel"], "L1");

        let back: CapabilityEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_accessors() {
        let deleted = CapabilityEvent::CapabilityDeleted {
            capability_id: CapabilityId::new("cap-x"),
            deleted_at: Utc::now(),
        };
        let tagged = CapabilityEvent::CapabilityTagAdded {
            capability_id: CapabilityId::new("cap-x"),
            tag: "core".to_string(),
        };

        assert_eq!(deleted.event_type(), "CapabilityDeleted");
        assert_eq!(tagged.event_type(), "CapabilityTagAdded");
        assert_eq!(tagged.capability_id().as_str(), "cap-x");
    }
}

//! Tree Invariants - Audit a capability tree snapshot
//!
//! Reports every node breaking the hierarchy rules. Used by the `check`
//! command and by tests asserting that a reparent left the tree sound.

use std::collections::{HashMap, HashSet};

use crate::model::id::CapabilityId;
use crate::model::level::{CapabilityLevel, MAX_DEPTH};
use crate::repository::capability_repository::CapabilitySummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeViolation {
    /// An L1 node points at a parent
    RootWithParent { id: CapabilityId },
    /// A non-L1 node has no parent
    Orphan {
        id: CapabilityId,
        level: CapabilityLevel,
    },
    /// The parent id does not resolve
    DanglingParent {
        id: CapabilityId,
        parent_id: CapabilityId,
    },
    /// level(node) != level(parent) + 1
    LevelMismatch {
        id: CapabilityId,
        level: CapabilityLevel,
        parent_level: CapabilityLevel,
    },
    /// Root-to-node depth exceeds four
    TooDeep { id: CapabilityId, depth: usize },
    /// The node is its own ancestor
    Cycle { id: CapabilityId },
}

impl core::fmt::Display for TreeViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RootWithParent { id } => write!(f, "{id}: L1 capability has a parent"),
            Self::Orphan { id, level } => write!(f, "{id}: {level} capability has no parent"),
            Self::DanglingParent { id, parent_id } => {
                write!(f, "{id}: parent {parent_id} does not exist")
            }
            Self::LevelMismatch {
                id,
                level,
                parent_level,
            } => write!(f, "{id}: level {level} under a {parent_level} parent"),
            Self::TooDeep { id, depth } => write!(f, "{id}: depth {depth} exceeds {MAX_DEPTH}"),
            Self::Cycle { id } => write!(f, "{id}: capability is its own ancestor"),
        }
    }
}

/// Check every node of a tree snapshot
///
/// Violations are returned in the order of `nodes`.
pub fn check_tree(nodes: &[CapabilitySummary]) -> Vec<TreeViolation> {
    let by_id: HashMap<&CapabilityId, &CapabilitySummary> =
        nodes.iter().map(|n| (&n.id, n)).collect();
    let mut violations = Vec::new();

    for node in nodes {
        match (&node.parent_id, node.level.is_root()) {
            (Some(_), true) => violations.push(TreeViolation::RootWithParent {
                id: node.id.clone(),
            }),
            (None, false) => violations.push(TreeViolation::Orphan {
                id: node.id.clone(),
                level: node.level,
            }),
            (Some(parent_id), false) => match by_id.get(parent_id) {
                None => violations.push(TreeViolation::DanglingParent {
                    id: node.id.clone(),
                    parent_id: parent_id.clone(),
                }),
                Some(parent) if parent.level.child_level() != Some(node.level) => {
                    violations.push(TreeViolation::LevelMismatch {
                        id: node.id.clone(),
                        level: node.level,
                        parent_level: parent.level,
                    })
                }
                Some(_) => {}
            },
            (None, true) => {}
        }

        let mut depth = 1;
        let mut visited = HashSet::from([&node.id]);
        let mut current = node.parent_id.as_ref();
        while let Some(parent_id) = current {
            if !visited.insert(parent_id) {
                if parent_id == &node.id {
                    violations.push(TreeViolation::Cycle {
                        id: node.id.clone(),
                    });
                }
                break;
            }
            let Some(parent) = by_id.get(parent_id) else {
                break;
            };
            depth += 1;
            current = parent.parent_id.as_ref();
        }
        if depth > usize::from(MAX_DEPTH) {
            violations.push(TreeViolation::TooDeep {
                id: node.id.clone(),
                depth,
            });
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>, level: CapabilityLevel) -> CapabilitySummary {
        CapabilitySummary::new(id, id, parent.map(CapabilityId::new), level)
    }

    #[test]
    fn test_sound_tree_has_no_violations() {
        let nodes = [
            node("r", None, CapabilityLevel::L1),
            node("a", Some("r"), CapabilityLevel::L2),
            node("b", Some("a"), CapabilityLevel::L3),
            node("c", Some("b"), CapabilityLevel::L4),
        ];
        assert!(check_tree(&nodes).is_empty());
    }

    #[test]
    fn test_reports_level_and_link_violations() {
        let nodes = [
            node("r", Some("a"), CapabilityLevel::L1),
            node("a", Some("r"), CapabilityLevel::L3),
            node("o", None, CapabilityLevel::L2),
            node("d", Some("ghost"), CapabilityLevel::L2),
        ];
        let violations = check_tree(&nodes);

        assert!(violations.contains(&TreeViolation::RootWithParent {
            id: CapabilityId::new("r")
        }));
        assert!(violations.contains(&TreeViolation::LevelMismatch {
            id: CapabilityId::new("a"),
            level: CapabilityLevel::L3,
            parent_level: CapabilityLevel::L1,
        }));
        assert!(violations.contains(&TreeViolation::Orphan {
            id: CapabilityId::new("o"),
            level: CapabilityLevel::L2,
        }));
        assert!(violations.contains(&TreeViolation::DanglingParent {
            id: CapabilityId::new("d"),
            parent_id: CapabilityId::new("ghost"),
        }));
        assert!(violations.contains(&TreeViolation::Cycle {
            id: CapabilityId::new("r")
        }));
    }

    #[test]
    fn test_reports_excess_depth() {
        let nodes = [
            node("1", None, CapabilityLevel::L1),
            node("2", Some("1"), CapabilityLevel::L2),
            node("3", Some("2"), CapabilityLevel::L3),
            node("4", Some("3"), CapabilityLevel::L4),
            node("5", Some("4"), CapabilityLevel::L4),
        ];
        let violations = check_tree(&nodes);
        assert!(violations.contains(&TreeViolation::TooDeep {
            id: CapabilityId::new("5"),
            depth: 5
        }));
    }
}

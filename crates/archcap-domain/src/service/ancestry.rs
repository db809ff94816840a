//! Ancestry - Parent-pointer walks over the capability read model
//!
//! Parent pointers come from a read model and may be corrupt (a cycle, a
//! dangling parent id). Every walk here keeps a visited set and stops at
//! the first revisited or missing node instead of looping or failing.

use std::collections::{HashSet, VecDeque};

use crate::model::id::CapabilityId;
use crate::model::level::CapabilityLevel;
use crate::repository::capability_repository::{CapabilityReadModel, CapabilitySummary};
use crate::repository::error::RepositoryError;

/// Collect the ancestor chain starting at `start_id`, nearest first
///
/// `start_id` itself heads the list (callers pass a parent id). The walk
/// breaks on a revisit or a missing record; an empty `start_id` yields an
/// empty chain.
pub fn collect_ancestor_ids<L>(
    lookup: &L,
    start_id: &CapabilityId,
) -> Result<Vec<CapabilityId>, RepositoryError>
where
    L: CapabilityReadModel + ?Sized,
{
    let mut chain = Vec::new();
    if start_id.is_empty() {
        return Ok(chain);
    }

    let mut visited = HashSet::new();
    let mut current = Some(start_id.clone());
    while let Some(id) = current.take() {
        if !visited.insert(id.clone()) {
            break;
        }
        let Some(node) = lookup.get_by_id(&id)? else {
            break;
        };
        chain.push(id);
        current = node.parent_id.filter(|p| !p.is_empty());
    }
    Ok(chain)
}

/// Would hanging `capability_id` under `new_parent_id` close a loop?
///
/// True when `capability_id` is `new_parent_id` itself or appears on its
/// ancestor chain.
pub fn would_create_cycle<L>(
    lookup: &L,
    capability_id: &CapabilityId,
    new_parent_id: &CapabilityId,
) -> Result<bool, RepositoryError>
where
    L: CapabilityReadModel + ?Sized,
{
    let mut visited = HashSet::new();
    let mut current = Some(new_parent_id.clone());
    while let Some(id) = current.take() {
        if &id == capability_id {
            return Ok(true);
        }
        if !visited.insert(id.clone()) {
            break;
        }
        current = lookup
            .get_by_id(&id)?
            .and_then(|node| node.parent_id)
            .filter(|p| !p.is_empty());
    }
    Ok(false)
}

/// Depth of the deepest descendant below `capability_id`
///
/// 0 for a leaf, 1 when only direct children exist, and so on.
pub fn subtree_depth<L>(lookup: &L, capability_id: &CapabilityId) -> Result<u8, RepositoryError>
where
    L: CapabilityReadModel + ?Sized,
{
    let mut deepest = 0u8;
    let mut visited = HashSet::from([capability_id.clone()]);
    let mut worklist = VecDeque::from([(capability_id.clone(), 0u8)]);

    while let Some((id, depth)) = worklist.pop_front() {
        deepest = deepest.max(depth);
        for child in lookup.get_children(&id)? {
            if visited.insert(child.id.clone()) {
                worklist.push_back((child.id, depth.saturating_add(1)));
            }
        }
    }
    Ok(deepest)
}

/// Walk up from `start_id` (inclusive) to the L1 capability above it
///
/// Stops at the first L1 node, or at the topmost reachable node when the
/// chain never reaches L1.
pub fn find_l1_ancestor<L>(
    lookup: &L,
    start_id: &CapabilityId,
) -> Result<Option<CapabilitySummary>, RepositoryError>
where
    L: CapabilityReadModel + ?Sized,
{
    let mut visited = HashSet::new();
    let mut found = None;
    let mut current = Some(start_id.clone());

    while let Some(id) = current.take() {
        if !visited.insert(id.clone()) {
            break;
        }
        let Some(node) = lookup.get_by_id(&id)? else {
            break;
        };
        if node.level == CapabilityLevel::L1 {
            return Ok(Some(node));
        }
        current = node.parent_id.clone().filter(|p| !p.is_empty());
        found = Some(node);
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Read model over a fixed parent map
    #[derive(Default)]
    struct TreeFixture {
        nodes: HashMap<CapabilityId, CapabilitySummary>,
    }

    impl TreeFixture {
        fn with(mut self, id: &str, parent: Option<&str>, level: CapabilityLevel) -> Self {
            self.nodes.insert(
                CapabilityId::new(id),
                CapabilitySummary::new(id, id.to_uppercase(), parent.map(CapabilityId::new), level),
            );
            self
        }
    }

    impl CapabilityReadModel for TreeFixture {
        fn get_by_id(
            &self,
            id: &CapabilityId,
        ) -> Result<Option<CapabilitySummary>, RepositoryError> {
            Ok(self.nodes.get(id).cloned())
        }

        fn get_children(
            &self,
            parent_id: &CapabilityId,
        ) -> Result<Vec<CapabilitySummary>, RepositoryError> {
            let mut children: Vec<_> = self
                .nodes
                .values()
                .filter(|n| n.parent_id.as_ref() == Some(parent_id))
                .cloned()
                .collect();
            children.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(children)
        }

        fn list_all(&self) -> Result<Vec<CapabilitySummary>, RepositoryError> {
            Ok(self.nodes.values().cloned().collect())
        }
    }

    fn ids(chain: &[CapabilityId]) -> Vec<&str> {
        chain.iter().map(CapabilityId::as_str).collect()
    }

    fn tree() -> TreeFixture {
        TreeFixture::default()
            .with("root", None, CapabilityLevel::L1)
            .with("a", Some("root"), CapabilityLevel::L2)
            .with("b", Some("a"), CapabilityLevel::L3)
            .with("c", Some("b"), CapabilityLevel::L4)
    }

    #[test]
    fn test_chain_is_nearest_first() {
        let chain = collect_ancestor_ids(&tree(), &CapabilityId::new("b")).unwrap();
        assert_eq!(ids(&chain), ["b", "a", "root"]);
    }

    #[test]
    fn test_empty_start_yields_empty_chain() {
        let chain = collect_ancestor_ids(&tree(), &CapabilityId::new("")).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_chain_breaks_on_cycle_and_missing() {
        let corrupt = TreeFixture::default()
            .with("x", Some("y"), CapabilityLevel::L2)
            .with("y", Some("x"), CapabilityLevel::L2);
        let chain = collect_ancestor_ids(&corrupt, &CapabilityId::new("x")).unwrap();
        assert_eq!(ids(&chain), ["x", "y"]);

        let dangling = TreeFixture::default().with("x", Some("ghost"), CapabilityLevel::L2);
        let chain = collect_ancestor_ids(&dangling, &CapabilityId::new("x")).unwrap();
        assert_eq!(ids(&chain), ["x"]);
    }

    #[test]
    fn test_cycle_detection() {
        let tree = tree();
        let root = CapabilityId::new("root");
        assert!(would_create_cycle(&tree, &root, &CapabilityId::new("c")).unwrap());
        assert!(would_create_cycle(&tree, &root, &root).unwrap());
        assert!(!would_create_cycle(&tree, &CapabilityId::new("c"), &CapabilityId::new("a")).unwrap());
    }

    #[test]
    fn test_cycle_detection_terminates_on_corrupt_data() {
        let corrupt = TreeFixture::default()
            .with("x", Some("y"), CapabilityLevel::L2)
            .with("y", Some("x"), CapabilityLevel::L2);
        let result = would_create_cycle(&corrupt, &CapabilityId::new("z"), &CapabilityId::new("x"));
        assert!(!result.unwrap());
    }

    #[test]
    fn test_subtree_depth() {
        let tree = tree();
        assert_eq!(subtree_depth(&tree, &CapabilityId::new("root")).unwrap(), 3);
        assert_eq!(subtree_depth(&tree, &CapabilityId::new("b")).unwrap(), 1);
        assert_eq!(subtree_depth(&tree, &CapabilityId::new("c")).unwrap(), 0);
    }

    #[test]
    fn test_find_l1_ancestor() {
        let tree = tree();
        let found = find_l1_ancestor(&tree, &CapabilityId::new("c")).unwrap().unwrap();
        assert_eq!(found.id.as_str(), "root");

        let headless = TreeFixture::default()
            .with("a", None, CapabilityLevel::L2)
            .with("b", Some("a"), CapabilityLevel::L3);
        let found = find_l1_ancestor(&headless, &CapabilityId::new("b")).unwrap().unwrap();
        assert_eq!(found.id.as_str(), "a");
    }
}

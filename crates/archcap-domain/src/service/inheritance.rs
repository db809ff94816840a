//! Inheritance Diff - Keeping inherited realization copies consistent
//!
//! Every ancestor of a capability holds one Inherited copy of each
//! realization attached below it. When the capability moves, or when a
//! repair run finds drift, this module computes the minimal set of copies
//! to add and to remove. It never touches storage: the result is recorded
//! on the capability aggregate as two batched events.
//!
//! ```text
//!   old chain: [P1, R]        new chain: [P2, R]
//!   additions: P2             removals:  P1      (R is untouched)
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::capability::Capability;
use crate::model::id::{CapabilityId, RealizationId};
use crate::model::realization::{
    InheritedRealization, Realization, RealizationInheritanceRemoval, RealizationLevel,
    RealizationOrigin,
};
use crate::repository::error::RepositoryError;
use crate::repository::realization_repository::RealizationReadModel;

/// Copies to add and copies to drop for one capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritanceDiff {
    /// Ordered per source, nearest ancestor first
    pub additions: Vec<InheritedRealization>,
    /// One group per source realization, sorted by source id
    pub removals: Vec<RealizationInheritanceRemoval>,
}

impl InheritanceDiff {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Raise `CapabilityRealizationsInherited` / `CapabilityRealizationsUninherited`
    ///
    /// Empty halves raise nothing.
    pub fn record_on(self, capability: &mut Capability) {
        capability.record_inherited_realizations(self.additions);
        capability.record_uninherited_realizations(self.removals);
    }
}

/// Diff for a capability moving from `old_chain` to `new_chain`
///
/// Every realization on the capability travels with it: Direct ones under
/// their own id, Inherited ones (copies of descendant realizations) under
/// their original source.
pub fn diff_for_move(
    capability: &Capability,
    realizations: &[Realization],
    old_chain: &[CapabilityId],
    new_chain: &[CapabilityId],
) -> InheritanceDiff {
    let old_set: HashSet<&CapabilityId> = old_chain.iter().collect();
    let new_set: HashSet<&CapabilityId> = new_chain.iter().collect();

    let added: Vec<&CapabilityId> = new_chain
        .iter()
        .filter(|id| !old_set.contains(id) && *id != capability.id())
        .collect();
    let removed: BTreeSet<CapabilityId> = old_chain
        .iter()
        .filter(|id| !new_set.contains(id))
        .cloned()
        .collect();

    let mut additions = Vec::new();
    let mut removals = RemovalGroups::default();
    let mut seen_sources = HashSet::new();

    for realization in realizations {
        let source_id = realization.source_realization_id();
        if !seen_sources.insert(source_id.clone()) {
            continue;
        }
        for ancestor in &added {
            additions.push(inherited_copy(capability, realization, ancestor));
        }
        removals.extend(source_id, removed.iter().cloned());
    }

    InheritanceDiff {
        additions,
        removals: removals.into_removals(),
    }
}

/// Diff between the copies that exist and the copies the chain demands
///
/// Only Direct realizations of `capability` are reconciled; each should be
/// copied to exactly the capabilities in `ancestor_ids`.
pub fn diff_for_recompute<R>(
    capability: &Capability,
    realizations: &[Realization],
    ancestor_ids: &[CapabilityId],
    read_model: &R,
) -> Result<InheritanceDiff, RepositoryError>
where
    R: RealizationReadModel + ?Sized,
{
    let desired: Vec<&CapabilityId> = ancestor_ids
        .iter()
        .filter(|id| *id != capability.id())
        .collect();
    let desired_set: HashSet<&CapabilityId> = desired.iter().copied().collect();

    let mut additions = Vec::new();
    let mut removals = RemovalGroups::default();

    for realization in realizations.iter().filter(|r| r.is_direct()) {
        let current: HashSet<CapabilityId> = read_model
            .get_inherited_capability_ids_by_source_realization_id(&realization.id)?
            .into_iter()
            .collect();

        for ancestor in &desired {
            if !current.contains(*ancestor) {
                additions.push(inherited_copy(capability, realization, ancestor));
            }
        }

        let stale = current.into_iter().filter(|id| !desired_set.contains(id));
        removals.extend(&realization.id, stale);
    }

    Ok(InheritanceDiff {
        additions,
        removals: removals.into_removals(),
    })
}

/// Build the copy of `realization` for `ancestor`
fn inherited_copy(
    owner: &Capability,
    realization: &Realization,
    ancestor: &CapabilityId,
) -> InheritedRealization {
    let (source_capability_id, source_capability_name, linked_at) = match &realization.source {
        Some(source) => (
            source.source_capability_id.clone(),
            source.source_capability_name.clone(),
            source.linked_at,
        ),
        None => (
            owner.id().clone(),
            owner.name().to_string(),
            realization.linked_at,
        ),
    };

    InheritedRealization {
        capability_id: ancestor.clone(),
        component_id: realization.component_id.clone(),
        component_name: realization.component_name.clone(),
        realization_level: RealizationLevel::Full,
        notes: realization.notes.clone(),
        origin: RealizationOrigin::Inherited,
        source_realization_id: realization.source_realization_id().clone(),
        source_capability_id,
        source_capability_name,
        linked_at,
    }
}

#[derive(Default)]
struct RemovalGroups(BTreeMap<RealizationId, BTreeSet<CapabilityId>>);

impl RemovalGroups {
    fn extend(
        &mut self,
        source_id: &RealizationId,
        capability_ids: impl IntoIterator<Item = CapabilityId>,
    ) {
        let mut capability_ids = capability_ids.into_iter().peekable();
        if capability_ids.peek().is_none() {
            return;
        }
        self.0
            .entry(source_id.clone())
            .or_default()
            .extend(capability_ids);
    }

    fn into_removals(self) -> Vec<RealizationInheritanceRemoval> {
        self.0
            .into_iter()
            .map(|(source_realization_id, ids)| RealizationInheritanceRemoval {
                source_realization_id,
                capability_ids: ids.into_iter().collect(),
            })
            .collect()
    }
}

//! Realization projection
//!
//! Direct rows are written through `RealizationRepository`. Inherited rows
//! are only ever produced from capability events: one row per (source
//! realization, capability) pair, upserted on `CapabilityRealizationsInherited`
//! and dropped per group on `CapabilityRealizationsUninherited`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use archcap_domain::{
    CapabilityEvent, CapabilityId, InheritanceSource, InheritedRealization, Realization,
    RealizationId, RealizationOrigin, RealizationReadModel, RealizationRepository, RepositoryError,
};
use archcap_usecase::{EventHandler, Result};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRealizationReadModel {
    rows: Arc<RwLock<HashMap<RealizationId, Realization>>>,
}

impl InMemoryRealizationReadModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self, event: &CapabilityEvent) -> std::result::Result<(), RepositoryError> {
        match event {
            CapabilityEvent::CapabilityRealizationsInherited {
                inherited_realizations,
                ..
            } => {
                let mut rows = self.write()?;
                for copy in inherited_realizations {
                    upsert(&mut rows, copy);
                }
            }
            CapabilityEvent::CapabilityRealizationsUninherited { removals, .. } => {
                let mut rows = self.write()?;
                for removal in removals {
                    rows.retain(|_, row| {
                        !(row.is_inherited()
                            && row.source_realization_id() == &removal.source_realization_id
                            && removal.capability_ids.contains(&row.capability_id))
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn list_all(&self) -> std::result::Result<Vec<Realization>, RepositoryError> {
        self.filtered(|_| true)
    }

    fn write(
        &self,
    ) -> std::result::Result<std::sync::RwLockWriteGuard<'_, HashMap<RealizationId, Realization>>, RepositoryError>
    {
        self.rows
            .write()
            .map_err(|_| RepositoryError::persistence("Failed to acquire write lock"))
    }

    /// Matching rows, Direct before Inherited, then by id
    fn filtered(
        &self,
        keep: impl Fn(&Realization) -> bool,
    ) -> std::result::Result<Vec<Realization>, RepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        let mut found: Vec<_> = rows.values().filter(|r| keep(r)).cloned().collect();
        found.sort_by(|a, b| (a.is_inherited(), &a.id).cmp(&(b.is_inherited(), &b.id)));
        Ok(found)
    }
}

fn upsert(rows: &mut HashMap<RealizationId, Realization>, copy: &InheritedRealization) {
    let existing = rows
        .values()
        .find(|row| {
            row.is_inherited()
                && row.source_realization_id() == &copy.source_realization_id
                && row.capability_id == copy.capability_id
        })
        .map(|row| row.id.clone());
    let id = existing.unwrap_or_else(|| RealizationId::new(Uuid::new_v4().to_string()));

    rows.insert(
        id.clone(),
        Realization {
            id,
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
        },
    );
}

impl RealizationReadModel for InMemoryRealizationReadModel {
    fn get_by_capability_id(
        &self,
        capability_id: &CapabilityId,
    ) -> std::result::Result<Vec<Realization>, RepositoryError> {
        self.filtered(|r| &r.capability_id == capability_id)
    }

    fn get_inherited_capability_ids_by_source_realization_id(
        &self,
        source_id: &RealizationId,
    ) -> std::result::Result<Vec<CapabilityId>, RepositoryError> {
        let mut ids: Vec<CapabilityId> = self
            .filtered(|r| r.is_inherited() && r.source_realization_id() == source_id)?
            .into_iter()
            .map(|r| r.capability_id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn get_by_id(&self, id: &RealizationId) -> std::result::Result<Option<Realization>, RepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        Ok(rows.get(id).cloned())
    }
}

impl RealizationRepository for InMemoryRealizationReadModel {
    fn save_direct(&self, realization: Realization) -> std::result::Result<(), RepositoryError> {
        if !realization.is_direct() {
            return Err(RepositoryError::persistence(format!(
                "Realization {} is not direct",
                realization.id
            )));
        }
        self.write()?.insert(realization.id.clone(), realization);
        Ok(())
    }

    fn delete_direct(
        &self,
        id: &RealizationId,
    ) -> std::result::Result<Option<Realization>, RepositoryError> {
        let mut rows = self.write()?;
        if rows.get(id).is_some_and(Realization::is_direct) {
            return Ok(rows.remove(id));
        }
        Ok(None)
    }
}

impl EventHandler for InMemoryRealizationReadModel {
    fn name(&self) -> &'static str {
        "realization"
    }

    fn handle(&self, event: &CapabilityEvent) -> Result<()> {
        Ok(self.project(event)?)
    }
}

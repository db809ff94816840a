//! Catalog bootstrap - From config and seed document to a live catalog

use anyhow::{anyhow, Context};
use archcap_adapter::InMemoryCatalog;
use archcap_domain::{BusinessDomainId, CapabilityId, ComponentId, RealizationLevel};
use archcap_usecase::command::{AssignCapabilityToDomain, CreateCapability, LinkSystemToCapability};
use archcap_usecase::{Command, ErrorPolicy};
use shared::{BatchErrorPolicy, CatalogConfig, SeedDocument};
use tracing::info;

pub fn error_policy(policy: BatchErrorPolicy) -> ErrorPolicy {
    match policy {
        BatchErrorPolicy::FailFast => ErrorPolicy::FailFast,
        BatchErrorPolicy::BestEffort => ErrorPolicy::BestEffort,
    }
}

/// Build the catalog and load the configured seed, if any
pub fn open_catalog(config: &CatalogConfig) -> anyhow::Result<InMemoryCatalog> {
    let catalog = InMemoryCatalog::with_policy(error_policy(config.batch_error_policy))?;
    if let Some(path) = &config.seed {
        let seed = SeedDocument::from_file(path)
            .with_context(|| format!("Failed to load seed {}", path.display()))?;
        seed_catalog(&catalog, &seed)?;
    }
    Ok(catalog)
}

/// Replay a seed document as commands
pub fn seed_catalog(catalog: &InMemoryCatalog, seed: &SeedDocument) -> anyhow::Result<()> {
    for capability in seed.capabilities_by_level() {
        catalog
            .dispatch(Command::CreateCapability(CreateCapability {
                id: Some(CapabilityId::new(capability.id.as_str())),
                name: capability.name.clone(),
                description: capability.description.clone(),
                parent_id: capability.parent_id.as_deref().map(CapabilityId::new),
                level: capability.level.clone(),
            }))
            .with_context(|| format!("Failed to seed capability {}", capability.id))?;
    }

    for realization in &seed.realizations {
        let level = RealizationLevel::parse(&realization.level)
            .ok_or_else(|| anyhow!("Unknown realization level '{}'", realization.level))?;
        catalog
            .dispatch(Command::LinkSystemToCapability(LinkSystemToCapability {
                capability_id: CapabilityId::new(realization.capability_id.as_str()),
                component_id: ComponentId::new(realization.component_id.as_str()),
                component_name: realization.component_name.clone(),
                level,
                notes: realization.notes.clone(),
            }))
            .with_context(|| {
                format!(
                    "Failed to link {} to {}",
                    realization.component_id, realization.capability_id
                )
            })?;
    }

    for assignment in &seed.assignments {
        catalog
            .dispatch(Command::AssignCapabilityToDomain(AssignCapabilityToDomain {
                business_domain_id: BusinessDomainId::new(assignment.business_domain_id.as_str()),
                capability_id: CapabilityId::new(assignment.capability_id.as_str()),
            }))
            .with_context(|| {
                format!(
                    "Failed to assign {} to {}",
                    assignment.business_domain_id, assignment.capability_id
                )
            })?;
    }

    info!(
        capabilities = seed.capabilities.len(),
        realizations = seed.realizations.len(),
        assignments = seed.assignments.len(),
        "Catalog seeded"
    );
    Ok(())
}

//! Configuration types for ARCHCAP
//!
//! Both the catalog config and the seed document load from YAML
//! (`.yaml`/`.yml`) or JSON (anything else).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// What a batch recompute does when one capability fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchErrorPolicy {
    #[default]
    FailFast,
    BestEffort,
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Catalog configuration (archcap.yaml / archcap.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Seed document to bootstrap the catalog from
    #[serde(default)]
    pub seed: Option<PathBuf>,

    #[serde(default)]
    pub batch_error_policy: BatchErrorPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            seed: None,
            batch_error_policy: BatchErrorPolicy::default(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from a YAML or JSON file
    ///
    /// A relative `seed` path is resolved against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config: Self = load(path)?;
        if let (Some(seed), Some(dir)) = (&config.seed, path.parent()) {
            if seed.is_relative() {
                config.seed = Some(dir.join(seed));
            }
        }
        if config.log_filter.trim().is_empty() {
            return Err(CatalogError::Config("logFilter must not be empty".to_string()));
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCapability {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// "L1".."L4"
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRealization {
    pub capability_id: String,
    pub component_id: String,
    pub component_name: String,
    /// Full, Partial or Planned
    #[serde(default = "default_realization_level")]
    pub level: String,
    #[serde(default)]
    pub notes: String,
}

fn default_realization_level() -> String {
    "Full".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAssignment {
    pub business_domain_id: String,
    pub capability_id: String,
}

/// Initial catalog content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    #[serde(default)]
    pub capabilities: Vec<SeedCapability>,
    #[serde(default)]
    pub realizations: Vec<SeedRealization>,
    #[serde(default)]
    pub assignments: Vec<SeedAssignment>,
}

impl SeedDocument {
    pub fn from_file(path: &Path) -> Result<Self> {
        load(path)
    }

    /// Capabilities ordered so every parent precedes its children
    pub fn capabilities_by_level(&self) -> Vec<&SeedCapability> {
        let mut ordered: Vec<&SeedCapability> = self.capabilities.iter().collect();
        ordered.sort_by(|a, b| a.level.cmp(&b.level));
        ordered
    }
}

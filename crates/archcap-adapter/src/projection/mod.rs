//! Projections - Read models kept current by the event dispatcher
//!
//! Both projections are registered before any cascade handler, so a
//! cascade reacting to an event already sees it reflected here.

pub mod capability_tree;
pub mod realization;

pub use capability_tree::InMemoryCapabilityReadModel;
pub use realization::InMemoryRealizationReadModel;

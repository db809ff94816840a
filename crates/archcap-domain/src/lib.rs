//! # ARCHCAP Domain Layer
//!
//! The heart of ARCHCAP - the capability tree and its inheritance rules,
//! free of I/O.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (This Crate)                     │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │  model/     - Capability aggregate, events, value objects   ││
//! │  │  repository/- Port definitions (not implementations)        ││
//! │  │  service/   - Ancestry walks, inheritance diff, invariants  ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Tree Rules
//!
//! - L1 has no parent; every other level sits exactly one below its parent.
//! - No path from the root is longer than four.
//! - No capability is its own ancestor.
//! - Every ancestor of a capability holds one inherited copy of each
//!   realization attached at or below that capability.

pub mod model;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use model::{
    assignment::BusinessDomainAssignment,
    capability::{Capability, CapabilityError, CapabilityMetadata, Expert},
    event::CapabilityEvent,
    id::{AssignmentId, BusinessDomainId, CapabilityId, ComponentId, RealizationId},
    level::{CapabilityLevel, MAX_DEPTH},
    realization::{
        InheritanceSource, InheritedRealization, Realization, RealizationInheritanceRemoval,
        RealizationLevel, RealizationOrigin,
    },
};

pub use repository::{
    assignment_repository::{AssignmentReader, AssignmentRepository},
    capability_repository::{CapabilityReadModel, CapabilityRepository, CapabilitySummary},
    error::RepositoryError,
    realization_repository::{RealizationReadModel, RealizationRepository},
};

pub use service::inheritance::InheritanceDiff;

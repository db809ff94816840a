//! Repository Traits - The "Ports" of Hexagonal Architecture
//!
//! These traits define what the engine needs from persistence and
//! read models, but NOT how it's actually done. That's the adapter's job.
//!
//! ```text
//! Domain Layer                 │  Adapter Layer
//! ─────────────────────────────┼──────────────────────────────
//! trait CapabilityRepository   │  EventSourcedCapabilityRepository
//!   fn get_by_id()             │
//!   fn save()                  │
//! trait CapabilityReadModel    │  InMemoryCapabilityReadModel
//! trait RealizationReadModel   │  InMemoryRealizationReadModel
//! trait AssignmentRepository   │  InMemoryAssignmentStore
//! ```
//!
//! All ports take `&self`: implementations are shared between handlers
//! and use interior mutability.

pub mod assignment_repository;
pub mod capability_repository;
pub mod error;
pub mod realization_repository;

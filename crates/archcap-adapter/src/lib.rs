//! # ARCHCAP Adapter Layer
//!
//! In-memory implementations of the ports (Hexagonal Architecture adapters).
//!
//! ## Structure
//!
//! - `repository/` - Event store, capability repository, assignments
//! - `projection/` - Read models rebuilt from capability events
//! - `bus` - In-process command bus
//! - `catalog` - Wiring of all of the above

pub mod bus;
pub mod catalog;
pub mod projection;
pub mod repository;

pub use bus::InProcessCommandBus;
pub use catalog::InMemoryCatalog;
pub use projection::{InMemoryCapabilityReadModel, InMemoryRealizationReadModel};
pub use repository::{EventSourcedCapabilityRepository, InMemoryAssignmentStore, InMemoryEventStore, StoredEvent};

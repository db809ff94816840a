//! Persistence Adapters - Repository implementations
//!
//! These implement the repository traits from archcap-domain.

pub mod assignment;
pub mod event_store;

pub use assignment::InMemoryAssignmentStore;
pub use event_store::{EventSourcedCapabilityRepository, InMemoryEventStore, StoredEvent};

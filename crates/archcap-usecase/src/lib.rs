//! ARCHCAP Use Case Layer
//!
//! Command handlers that orchestrate the domain: they load aggregates
//! through the repository ports, run the domain services, and save.
//!
//! ```text
//! ┌───────────────┐   dispatch   ┌──────────────────────────────┐
//! │  CommandBus   │ ───────────▶ │ CommandHandler               │
//! └───────────────┘              │  reparent / recompute / ...  │
//!         ▲                      └──────────────┬───────────────┘
//!         │ follow-up commands                  │ save
//!         │                                     ▼
//! ┌───────┴───────────────┐  post-commit  ┌────────────────────┐
//! │ DomainReassignment    │ ◀──────────── │  EventDispatcher   │
//! └───────────────────────┘               └────────────────────┘
//! ```

pub mod assignment;
pub mod capability;
pub mod command;
pub mod domain_cascade;
pub mod error;
pub mod event;
pub mod realization;
pub mod recompute;
pub mod reparent;
pub mod traversal;

#[cfg(test)]
pub(crate) mod testing;

pub use assignment::{AssignCapabilityToDomainHandler, UnassignCapabilityFromDomainHandler};
pub use capability::{
    CapabilityCrudHandler, ChildrenDeletionPolicy, CreateCapabilityHandler,
    DeleteCapabilityHandler, DeletionPolicy,
};
pub use command::{Command, CommandBus, CommandHandler, CommandKind, CommandResult};
pub use domain_cascade::DomainReassignmentHandler;
pub use error::{Result, UseCaseError};
pub use event::{EventDispatcher, EventHandler};
pub use realization::{LinkSystemToCapabilityHandler, UnlinkSystemFromCapabilityHandler};
pub use recompute::{BatchRecompute, BatchRecomputeReport, RecomputeCapabilityInheritanceHandler};
pub use reparent::ChangeCapabilityParentHandler;
pub use traversal::{ErrorPolicy, WalkReport, Worklist};

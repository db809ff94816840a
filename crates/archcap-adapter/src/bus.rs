//! In-process command bus
//!
//! Handlers are registered by command kind and may be registered after the
//! bus has been handed out, so a post-commit handler can hold the bus that
//! dispatches to the handler whose save triggered it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use archcap_domain::RepositoryError;
use archcap_usecase::{Command, CommandBus, CommandHandler, CommandKind, CommandResult, Result, UseCaseError};
use tracing::debug;

#[derive(Default)]
pub struct InProcessCommandBus {
    handlers: RwLock<HashMap<CommandKind, Arc<dyn CommandHandler>>>,
}

impl InProcessCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous one
    pub fn register(&self, kind: CommandKind, handler: Arc<dyn CommandHandler>) -> Result<()> {
        self.handlers
            .write()
            .map_err(|_| RepositoryError::persistence("Failed to acquire write lock"))?
            .insert(kind, handler);
        Ok(())
    }

    pub fn is_registered(&self, kind: CommandKind) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(&kind))
            .unwrap_or(false)
    }
}

impl CommandBus for InProcessCommandBus {
    fn dispatch(&self, command: Command) -> Result<CommandResult> {
        let kind = command.kind();
        // Released before the handler runs; handlers dispatch re-entrantly.
        let handler = self
            .handlers
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?
            .get(&kind)
            .cloned()
            .ok_or(UseCaseError::NoHandler(kind))?;

        debug!(command = %kind, "Dispatching command");
        handler.handle(command)
    }
}

impl core::fmt::Debug for InProcessCommandBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let count = self.handlers.read().map(|h| h.len()).unwrap_or(0);
        f.debug_struct("InProcessCommandBus")
            .field("handlers", &count)
            .finish()
    }
}

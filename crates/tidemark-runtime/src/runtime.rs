//! Runtime instance identity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduler::Scheduler;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeId(Uuid);

impl RuntimeId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A host runtime instance.
///
/// Owns the scheduler every task created against it defers onto. Plugins
/// that must exist once per runtime cache themselves by [`RuntimeId`].
pub struct Runtime {
    id: RuntimeId,
    scheduler: Scheduler,
}

impl Runtime {
    pub fn new() -> Self {
        let id = RuntimeId::new();
        tracing::debug!(runtime_id = %id, "Created runtime");

        Self {
            id,
            scheduler: Scheduler::new(),
        }
    }

    pub fn id(&self) -> RuntimeId {
        self.id
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run one scheduler turn
    pub fn tick(&self) -> usize {
        self.scheduler.tick()
    }

    /// Run scheduler turns until no deferred work is left
    pub fn run_until_idle(&self, max_ticks: usize) -> Result<usize> {
        self.scheduler.run_until_idle(max_ticks)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

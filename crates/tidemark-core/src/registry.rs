//! Adapter registry
//!
//! At most one [`HistoryAdapter`] per runtime instance. Asking again for the
//! same runtime returns the cached adapter without touching the provider, so
//! browser listeners are never bound twice.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use tidemark_navigation::NavigationProvider;
use tidemark_runtime::{Runtime, RuntimeId};

use crate::adapter::HistoryAdapter;
use crate::Result;

#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<RuntimeId, Arc<HistoryAdapter>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The adapter bound to `runtime`, creating it from `provider` on first use.
    ///
    /// `provider` is ignored when an adapter already exists.
    pub fn get_or_init(
        &self,
        runtime: &Runtime,
        provider: Arc<dyn NavigationProvider>,
    ) -> Result<Arc<HistoryAdapter>> {
        let id = runtime.id();

        if let Some(adapter) = self.get(&id) {
            tracing::debug!(runtime_id = %id, "Reusing history adapter");
            return Ok(adapter);
        }

        let mut adapters = self.adapters.write();
        // Another caller may have won the race for the write lock
        if let Some(adapter) = adapters.get(&id) {
            return Ok(Arc::clone(adapter));
        }

        let adapter = Arc::new(HistoryAdapter::new(runtime, provider)?);
        adapters.insert(id, Arc::clone(&adapter));

        tracing::info!(runtime_id = %id, adapters = adapters.len(), "Cached history adapter");

        Ok(adapter)
    }

    pub fn get(&self, id: &RuntimeId) -> Option<Arc<HistoryAdapter>> {
        self.adapters.read().get(id).cloned()
    }

    /// Forget the adapter of a torn-down runtime.
    ///
    /// Listeners already bound to the provider stay bound; they go inert once
    /// the last handle to the adapter is dropped.
    pub fn remove(&self, id: &RuntimeId) -> Option<Arc<HistoryAdapter>> {
        let removed = self.adapters.write().remove(id);
        if removed.is_some() {
            tracing::info!(runtime_id = %id, "Removed history adapter");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.adapters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.read().is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("runtimes", &self.adapters.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

//! History adapter
//!
//! Owns the three cells mirroring the browser's navigation state:
//! ```text
//! path   <- location.pathname
//! hash   <- location.hash
//! length <- history.length
//! ```
//! Cells are refreshed by `popstate`/`hashchange` listeners and by the five
//! history operations, whose bodies run on a later scheduler turn.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

use tidemark_navigation::{Listener, NavigationEvent, NavigationProvider};
use tidemark_runtime::{signal, ReadSignal, Runtime, RuntimeId, Scheduler, Task, WriteSignal};

use crate::Result;

/// Value copy of the mirrored state at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub path: String,
    pub hash: String,
    pub length: usize,
}

#[derive(Clone)]
struct Writers {
    path: WriteSignal<String>,
    hash: WriteSignal<String>,
    length: WriteSignal<usize>,
}

pub struct HistoryAdapter {
    runtime_id: RuntimeId,
    scheduler: Scheduler,
    provider: Arc<dyn NavigationProvider>,
    path: ReadSignal<String>,
    hash: ReadSignal<String>,
    length: ReadSignal<usize>,
    writers: Writers,
}

impl HistoryAdapter {
    /// Seed the cells from `provider` and register the event listeners.
    ///
    /// Only [`crate::AdapterRegistry`] calls this, so listeners are bound once
    /// per runtime.
    pub(crate) fn new(runtime: &Runtime, provider: Arc<dyn NavigationProvider>) -> Result<Self> {
        let (path, path_w) = signal("History.path", provider.current_path());
        let (length, length_w) = signal("History.length", provider.stack_length());
        let (hash, hash_w) = signal("History.hash", provider.current_hash());

        let writers = Writers {
            path: path_w,
            hash: hash_w,
            length: length_w,
        };

        provider.subscribe(
            NavigationEvent::PopState,
            on_popstate(Arc::downgrade(&provider), writers.clone()),
        )?;
        provider.subscribe(
            NavigationEvent::HashChange,
            on_hashchange(Arc::downgrade(&provider), writers.clone()),
        )?;

        tracing::info!(
            runtime_id = %runtime.id(),
            path = %path.get(),
            length = length.get(),
            "History adapter bound"
        );

        Ok(Self {
            runtime_id: runtime.id(),
            scheduler: runtime.scheduler().clone(),
            provider,
            path,
            hash,
            length,
            writers,
        })
    }

    pub fn runtime_id(&self) -> RuntimeId {
        self.runtime_id
    }

    pub fn path(&self) -> &ReadSignal<String> {
        &self.path
    }

    pub fn hash(&self) -> &ReadSignal<String> {
        &self.hash
    }

    pub fn length(&self) -> &ReadSignal<usize> {
        &self.length
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            path: self.path.get(),
            hash: self.hash.get(),
            length: self.length.get(),
        }
    }

    /// Push a new history entry at `path`
    pub fn set_path(&self, path: impl Into<String>) -> Task {
        let path = path.into();
        let provider = Arc::clone(&self.provider);
        let cells = self.writers.clone();

        Task::new(&self.scheduler, "History.setPath", move || {
            tracing::debug!(path = %path, "setPath");
            cells.path.set(path.clone());
            provider.push_state(&path)?;
            cells.hash.set(provider.current_hash());
            cells.length.set(provider.stack_length());
            Ok(())
        })
    }

    /// Replace the current history entry with `path`
    pub fn replace_path(&self, path: impl Into<String>) -> Task {
        let path = path.into();
        let provider = Arc::clone(&self.provider);
        let cells = self.writers.clone();

        Task::new(&self.scheduler, "History.replacePath", move || {
            tracing::debug!(path = %path, "replacePath");
            cells.path.set(path.clone());
            provider.replace_state(&path)?;
            cells.hash.set(provider.current_hash());
            cells.length.set(provider.stack_length());
            Ok(())
        })
    }

    /// Move `delta` entries through the history stack
    pub fn go(&self, delta: i32) -> Task {
        let provider = Arc::clone(&self.provider);
        let cells = self.writers.clone();

        Task::new(&self.scheduler, "History.go", move || {
            tracing::debug!(delta, "go");
            provider.go(delta)?;
            cells.length.set(provider.stack_length());
            cells.hash.set(provider.current_hash());
            Ok(())
        })
    }

    /// Step one entry back.
    ///
    /// Unlike every other operation the hash is sampled before navigating, so
    /// the hash cell keeps the pre-navigation value until the browser's own
    /// `popstate`/`hashchange` arrives.
    pub fn back(&self) -> Task {
        let provider = Arc::clone(&self.provider);
        let cells = self.writers.clone();

        Task::new(&self.scheduler, "History.back", move || {
            tracing::debug!("back");
            cells.hash.set(provider.current_hash());
            provider.back()?;
            cells.length.set(provider.stack_length());
            Ok(())
        })
    }

    /// Step one entry forward
    pub fn forward(&self) -> Task {
        let provider = Arc::clone(&self.provider);
        let cells = self.writers.clone();

        Task::new(&self.scheduler, "History.forward", move || {
            tracing::debug!("forward");
            provider.forward()?;
            cells.length.set(provider.stack_length());
            cells.hash.set(provider.current_hash());
            Ok(())
        })
    }
}

impl std::fmt::Debug for HistoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryAdapter")
            .field("runtime_id", &self.runtime_id)
            .field("state", &self.snapshot())
            .finish()
    }
}

// Listeners hold the provider weakly: the provider owns its listeners.
fn on_popstate(provider: Weak<dyn NavigationProvider>, cells: Writers) -> Listener {
    Arc::new(move |event: NavigationEvent| {
        let Some(provider) = provider.upgrade() else {
            return;
        };
        tracing::debug!(event = %event, "Syncing history cells");
        cells.path.set(provider.current_path());
        cells.length.set(provider.stack_length());
        cells.hash.set(provider.current_hash());
    })
}

fn on_hashchange(provider: Weak<dyn NavigationProvider>, cells: Writers) -> Listener {
    Arc::new(move |event: NavigationEvent| {
        let Some(provider) = provider.upgrade() else {
            return;
        };
        tracing::debug!(event = %event, "Syncing hash cell");
        cells.hash.set(provider.current_hash());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tidemark_navigation::MemoryNavigator;

    fn bind(paths: &[&str], index: usize) -> (Runtime, MemoryNavigator, HistoryAdapter) {
        let runtime = Runtime::new();
        let nav = MemoryNavigator::with_entries("http://localhost", paths, index).unwrap();
        let adapter = HistoryAdapter::new(&runtime, Arc::new(nav.clone())).unwrap();
        (runtime, nav, adapter)
    }

    fn snapshot(path: &str, hash: &str, length: usize) -> HistorySnapshot {
        HistorySnapshot {
            path: path.to_string(),
            hash: hash.to_string(),
            length,
        }
    }

    #[test]
    fn test_cells_seeded_from_provider() {
        let (_runtime, _nav, adapter) = bind(&["/a", "/b#top"], 1);
        assert_eq!(adapter.snapshot(), snapshot("/b", "#top", 2));
        assert_eq!(adapter.path().name(), "History.path");
        assert_eq!(adapter.hash().name(), "History.hash");
        assert_eq!(adapter.length().name(), "History.length");
    }

    #[tokio::test]
    async fn test_set_path_pushes_entry() {
        let (runtime, nav, adapter) = bind(&["/a", "/b", "/home"], 2);
        assert_eq!(adapter.snapshot(), snapshot("/home", "", 3));

        adapter.set_path("/about").await;

        // Nothing happens until the scheduler turns
        assert_eq!(adapter.path().get(), "/home");
        assert_eq!(nav.stack_length(), 3);

        assert_eq!(runtime.tick(), 1);
        assert_eq!(adapter.snapshot(), snapshot("/about", "", 4));
        assert_eq!(nav.current_url().as_str(), "http://localhost/about");
    }

    #[tokio::test]
    async fn test_replace_path_keeps_length() {
        let (runtime, nav, adapter) = bind(&["/a", "/b"], 1);

        adapter.replace_path("/c#frag").await;
        runtime.tick();

        assert_eq!(adapter.snapshot(), snapshot("/c#frag", "#frag", 2));
        assert_eq!(nav.entries(), vec!["/a", "/c#frag"]);
    }

    #[tokio::test]
    async fn test_replace_path_is_idempotent() {
        let (once_rt, _once_nav, once) = bind(&["/a", "/b"], 1);
        once.replace_path("/same").await;
        once_rt.tick();

        let (twice_rt, _twice_nav, twice) = bind(&["/a", "/b"], 1);
        twice.replace_path("/same").await;
        twice.replace_path("/same").await;
        twice_rt.tick();

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[tokio::test]
    async fn test_traversal_updates_length_not_path() {
        let (runtime, nav, adapter) = bind(&["/a", "/b", "/c"], 2);

        adapter.go(-2).await;
        runtime.tick();

        assert_eq!(nav.current_path(), "/a");
        assert_eq!(adapter.length().get(), nav.stack_length());
        assert_eq!(adapter.path().get(), "/c");

        // The browser's popstate catches the path up
        nav.dispatch_pending();
        assert_eq!(adapter.path().get(), "/a");

        adapter.forward().await;
        runtime.tick();
        assert_eq!(nav.current_path(), "/b");
        assert_eq!(adapter.length().get(), 3);
        assert_eq!(adapter.path().get(), "/a");
    }

    #[tokio::test]
    async fn test_back_samples_hash_before_navigating() {
        let (runtime, nav, adapter) = bind(&["/page#one", "/page#two"], 1);

        adapter.back().await;
        runtime.tick();

        assert_eq!(nav.current_hash(), "#one");
        assert_eq!(adapter.hash().get(), "#two");
        assert_eq!(adapter.length().get(), 2);

        nav.dispatch_pending();
        assert_eq!(adapter.hash().get(), "#one");
    }

    #[tokio::test]
    async fn test_forward_samples_hash_after_navigating() {
        let (runtime, _nav, adapter) = bind(&["/page#one", "/page#two"], 0);

        adapter.forward().await;
        runtime.tick();

        assert_eq!(adapter.hash().get(), "#two");
    }

    #[tokio::test]
    async fn test_operations_run_in_scheduling_order() {
        let (runtime, nav, adapter) = bind(&["/"], 0);

        adapter.set_path("/one").await;
        adapter.set_path("/two").await;
        adapter.replace_path("/three").await;
        assert_eq!(runtime.scheduler().pending(), 3);

        runtime.run_until_idle(8).unwrap();

        assert_eq!(nav.entries(), vec!["/", "/one", "/three"]);
        assert_eq!(adapter.snapshot(), snapshot("/three", "", 3));
    }

    #[tokio::test]
    async fn test_rejected_push_is_reported_to_scheduler() {
        let (runtime, nav, adapter) = bind(&["/home"], 0);

        adapter.set_path("https://example.com/elsewhere").await;
        runtime.tick();

        let failures = runtime.scheduler().failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].task, "History.setPath");

        // path was notified before the push was attempted
        assert_eq!(adapter.path().get(), "https://example.com/elsewhere");
        assert_eq!(adapter.length().get(), 1);
        assert_eq!(nav.current_path(), "/home");
    }

    #[test]
    fn test_popstate_refreshes_all_cells() {
        let (_runtime, nav, adapter) = bind(&["/old#x", "/new"], 1);
        assert_eq!(adapter.snapshot(), snapshot("/new", "", 2));

        nav.back().unwrap();
        nav.dispatch_pending();

        assert_eq!(adapter.snapshot(), snapshot("/old", "#x", 2));
    }

    #[test]
    fn test_popstate_write_order() {
        let (_runtime, nav, adapter) = bind(&["/a", "/b"], 1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut subs = Vec::new();
        for (name, cell) in [("path", adapter.path()), ("hash", adapter.hash())] {
            let order = Arc::clone(&order);
            subs.push(cell.subscribe(move |_| order.lock().push(name)));
        }
        let sink = Arc::clone(&order);
        subs.push(adapter.length().subscribe(move |_| sink.lock().push("length")));

        nav.dispatch(NavigationEvent::PopState);
        assert_eq!(*order.lock(), vec!["path", "length", "hash"]);
    }

    #[test]
    fn test_hashchange_only_touches_hash() {
        let (_runtime, nav, adapter) = bind(&["/doc"], 0);
        let path_version = adapter.path().version();
        let length_version = adapter.length().version();

        nav.set_hash("#intro");
        nav.dispatch(NavigationEvent::HashChange);

        assert_eq!(adapter.hash().get(), "#intro");
        assert_eq!(adapter.path().version(), path_version);
        assert_eq!(adapter.length().version(), length_version);
    }

    #[test]
    fn test_listener_is_inert_after_adapter_dropped() {
        let runtime = Runtime::new();
        let nav = MemoryNavigator::new("http://localhost", "/").unwrap();
        let provider: Arc<dyn NavigationProvider> = Arc::new(nav.clone());
        let adapter = HistoryAdapter::new(&runtime, provider).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = adapter.path().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        nav.dispatch(NavigationEvent::PopState);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Once the adapter (and its provider handle) is gone the listener is inert
        drop(adapter);
        nav.dispatch(NavigationEvent::PopState);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

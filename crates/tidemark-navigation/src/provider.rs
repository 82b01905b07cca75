//! Navigation provider capability

use std::sync::Arc;

use crate::event::NavigationEvent;
use crate::Result;

/// Callback invoked when the provider dispatches an event.
pub type Listener = Arc<dyn Fn(NavigationEvent) + Send + Sync>;

/// The browser's history and location subsystem.
///
/// Reads never fail: a provider that cannot reach its backing state reports
/// an empty path/hash and a zero length. Mutations may be rejected by the
/// backend (for example a cross-origin `pushState`).
pub trait NavigationProvider: Send + Sync {
    /// `location.pathname`
    fn current_path(&self) -> String;

    /// `location.hash`: empty, or `#` followed by the fragment
    fn current_hash(&self) -> String;

    /// `history.length`
    fn stack_length(&self) -> usize;

    fn push_state(&self, path: &str) -> Result<()>;

    fn replace_state(&self, path: &str) -> Result<()>;

    /// Move `delta` entries through the history stack
    fn go(&self, delta: i32) -> Result<()>;

    fn back(&self) -> Result<()>;

    fn forward(&self) -> Result<()>;

    /// Register `listener` for every future `event`. There is no removal.
    fn subscribe(&self, event: NavigationEvent, listener: Listener) -> Result<()>;
}

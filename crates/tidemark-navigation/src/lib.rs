//! Tidemark Navigation
//!
//! The browser's history/location subsystem as an injectable capability.
//! - [`NavigationProvider`]: reads, history mutations, event subscription
//! - [`MemoryNavigator`]: in-memory history stack for tests and headless use
//! - `BrowserNavigator`: `window.history` / `window.location` on wasm32

mod error;
mod event;
mod memory;
mod provider;

#[cfg(target_arch = "wasm32")]
mod browser;

pub use error::NavigationError;
pub use event::NavigationEvent;
pub use memory::MemoryNavigator;
pub use provider::{Listener, NavigationProvider};

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserNavigator;

pub type Result<T> = std::result::Result<T, NavigationError>;

//! Tidemark Core
//!
//! Mirrors the browser's navigation state (path, hash, history length) into
//! observable cells and exposes history operations as deferred tasks.
//! One [`HistoryAdapter`] exists per runtime; [`AdapterRegistry`] hands it out.

mod adapter;
mod config;
mod error;
mod registry;

pub use adapter::{HistoryAdapter, HistorySnapshot};
pub use config::Config;
pub use error::CoreError;
pub use registry::AdapterRegistry;

// Re-export the collaborating crates
pub use tidemark_navigation::{
    Listener, MemoryNavigator, NavigationError, NavigationEvent, NavigationProvider,
};
pub use tidemark_runtime::{
    signal, ReadSignal, Runtime, RuntimeError, RuntimeId, Scheduler, Subscription, Task,
    TaskFailure, WriteSignal,
};

#[cfg(target_arch = "wasm32")]
pub use tidemark_navigation::BrowserNavigator;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// `RUST_LOG` wins over `config.log_filter`.
pub fn init_logging(config: &Config) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    fmt().with_env_filter(filter).with_target(true).init();
}

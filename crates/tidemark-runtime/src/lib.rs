//! Tidemark Runtime
//!
//! The small host runtime the history adapter plugs into:
//! - single-writer observable cells (`signal`)
//! - a deterministic FIFO scheduler for deferred work
//! - lazy tasks that schedule their body and resolve with `()`

mod error;
mod runtime;
mod scheduler;
mod signal;
mod task;

pub use error::{JobError, RuntimeError, TaskFailure};
pub use runtime::{Runtime, RuntimeId};
pub use scheduler::Scheduler;
pub use signal::{signal, ReadSignal, Subscription, WriteSignal};
pub use task::Task;

pub type Result<T> = std::result::Result<T, RuntimeError>;

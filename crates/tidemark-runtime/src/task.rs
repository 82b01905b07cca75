//! Lazy deferred tasks

use std::future::{ready, IntoFuture, Ready};

use crate::error::JobError;
use crate::scheduler::{Job, Scheduler};

/// A deferred unit of work.
///
/// Building a task has no effect. Performing it (directly or by awaiting it)
/// queues the body on the scheduler and resolves at once with `()`; the body
/// itself runs on a later scheduler turn. A body that fails is reported to the
/// scheduler, never to whoever performed the task.
#[must_use = "tasks do nothing unless performed or awaited"]
pub struct Task {
    name: String,
    scheduler: Scheduler,
    body: Job,
}

impl Task {
    pub fn new<F>(scheduler: &Scheduler, name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> std::result::Result<(), JobError> + Send + 'static,
    {
        Self {
            name: name.into(),
            scheduler: scheduler.clone(),
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn perform(self) {
        self.scheduler.defer_boxed(self.name, self.body);
    }
}

impl IntoFuture for Task {
    type Output = ();
    type IntoFuture = Ready<()>;

    fn into_future(self) -> Self::IntoFuture {
        self.perform();
        ready(())
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

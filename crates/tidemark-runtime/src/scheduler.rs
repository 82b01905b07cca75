//! Deferred work scheduler
//!
//! Stands in for the event loop: deferred jobs run on a later turn, one at a
//! time, in the order they were scheduled. Nothing runs until the owner
//! calls [`Scheduler::tick`] or [`Scheduler::run_until_idle`].

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{JobError, RuntimeError, TaskFailure};
use crate::Result;

pub(crate) type Job = Box<dyn FnOnce() -> std::result::Result<(), JobError> + Send>;

struct Deferred {
    name: String,
    job: Job,
}

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Deferred>,
    failures: Vec<TaskFailure>,
}

pub struct Scheduler {
    queue: Arc<Mutex<Queue>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(Queue::default())),
        }
    }

    /// Queue `job` for a later turn. There is no way to withdraw it.
    pub fn defer<F>(&self, name: impl Into<String>, job: F)
    where
        F: FnOnce() -> std::result::Result<(), JobError> + Send + 'static,
    {
        self.defer_boxed(name.into(), Box::new(job));
    }

    pub(crate) fn defer_boxed(&self, name: String, job: Job) {
        tracing::trace!(task = %name, "Deferred job");
        self.queue.lock().jobs.push_back(Deferred { name, job });
    }

    /// Run one turn: every job queued before this call, in FIFO order.
    ///
    /// Jobs deferred while the turn is running wait for the next turn.
    pub fn tick(&self) -> usize {
        let batch: Vec<Deferred> = self.queue.lock().jobs.drain(..).collect();
        let ran = batch.len();

        for Deferred { name, job } in batch {
            if let Err(e) = job() {
                tracing::warn!(task = %name, error = %e, "Deferred task failed");
                self.queue.lock().failures.push(TaskFailure {
                    task: name,
                    message: e.to_string(),
                    failed_at: Utc::now(),
                });
            }
        }

        ran
    }

    /// Tick until the queue is empty, giving up after `max_ticks` turns.
    ///
    /// Returns the number of jobs that ran.
    pub fn run_until_idle(&self, max_ticks: usize) -> Result<usize> {
        let mut ran = 0;
        for _ in 0..max_ticks {
            if self.pending() == 0 {
                return Ok(ran);
            }
            ran += self.tick();
        }

        if self.pending() == 0 {
            Ok(ran)
        } else {
            Err(RuntimeError::Stalled { ticks: max_ticks })
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().jobs.len()
    }

    pub fn failures(&self) -> Vec<TaskFailure> {
        self.queue.lock().failures.clone()
    }

    pub fn take_failures(&self) -> Vec<TaskFailure> {
        std::mem::take(&mut self.queue.lock().failures)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let scheduler = Scheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            scheduler.defer(format!("job-{}", i), move || {
                order.lock().push(i);
                Ok(())
            });
        }

        assert!(order.lock().is_empty());
        assert_eq!(scheduler.tick(), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_jobs_deferred_during_tick_wait_for_next_turn() {
        let scheduler = Scheduler::new();
        let inner = scheduler.clone();

        scheduler.defer("outer", move || {
            inner.defer("inner", || Ok(()));
            Ok(())
        });

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.tick(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_failures_are_recorded() {
        let scheduler = Scheduler::new();
        scheduler.defer("broken", || Err("boom".into()));
        scheduler.defer("fine", || Ok(()));

        assert_eq!(scheduler.tick(), 2);

        let failures = scheduler.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].task, "broken");
        assert_eq!(failures[0].message, "boom");

        assert_eq!(scheduler.take_failures().len(), 1);
        assert!(scheduler.failures().is_empty());
    }

    #[test]
    fn test_run_until_idle_stalls_on_endless_work() {
        fn reschedule(scheduler: Scheduler) {
            let next = scheduler.clone();
            scheduler.defer("loop", move || {
                reschedule(next);
                Ok(())
            });
        }

        let scheduler = Scheduler::new();
        reschedule(scheduler.clone());

        let result = scheduler.run_until_idle(5);
        assert!(matches!(result, Err(RuntimeError::Stalled { ticks: 5 })));
    }

    #[test]
    fn test_run_until_idle_drains_chained_work() {
        let scheduler = Scheduler::new();
        let inner = scheduler.clone();
        scheduler.defer("first", move || {
            inner.defer("second", || Ok(()));
            Ok(())
        });

        assert_eq!(scheduler.run_until_idle(8).unwrap(), 2);
        assert_eq!(scheduler.pending(), 0);
    }
}

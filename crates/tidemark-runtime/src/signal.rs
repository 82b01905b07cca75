//! Observable cells
//!
//! A cell is split into a [`WriteSignal`], held by exactly one owner, and any
//! number of [`ReadSignal`] handles. Every write notifies every subscriber,
//! including writes that store an equal value.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    value: T,
    version: u64,
}

struct Cell<T> {
    name: String,
    slot: RwLock<Slot<T>>,
    subscribers: RwLock<Vec<(u64, Subscriber<T>)>>,
    next_subscriber: AtomicU64,
}

/// Create a named cell seeded with `initial`.
pub fn signal<T>(name: impl Into<String>, initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let cell = Arc::new(Cell {
        name: name.into(),
        slot: RwLock::new(Slot {
            value: initial,
            version: 0,
        }),
        subscribers: RwLock::new(Vec::new()),
        next_subscriber: AtomicU64::new(0),
    });

    (
        ReadSignal {
            cell: Arc::clone(&cell),
        },
        WriteSignal { cell },
    )
}

/// Read side of a cell. Cheap to clone.
pub struct ReadSignal<T> {
    cell: Arc<Cell<T>>,
}

impl<T> ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn get(&self) -> T {
        self.cell.slot.read().value.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.slot.read().value)
    }

    /// Number of writes since creation
    pub fn version(&self) -> u64 {
        self.cell.slot.read().version
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Call `f` with every value written from now on.
    ///
    /// The subscriber stays registered until the returned guard is dropped.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.cell.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.cell.subscribers.write().push((id, Arc::new(f)));

        let cell: Weak<Cell<T>> = Arc::downgrade(&self.cell);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(cell) = cell.upgrade() {
                    cell.subscribers.write().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.cell.subscribers.read().len()
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> std::fmt::Debug for ReadSignal<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.cell.slot.read();
        f.debug_struct("ReadSignal")
            .field("name", &self.cell.name)
            .field("value", &slot.value)
            .field("version", &slot.version)
            .finish()
    }
}

/// Write side of a cell.
///
/// Cloning is allowed so the owner can hand copies to its own callbacks;
/// it must not be given out to other writers.
pub struct WriteSignal<T> {
    cell: Arc<Cell<T>>,
}

impl<T> WriteSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Store `value` and notify every subscriber
    pub fn set(&self, value: T) {
        let notified = value.clone();
        {
            let mut slot = self.cell.slot.write();
            slot.value = value;
            slot.version += 1;
        }

        // Subscribers may read the cell, so they run after the lock is gone
        let subscribers: Vec<Subscriber<T>> = self
            .cell
            .subscribers
            .read()
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();

        tracing::trace!(
            signal = %self.cell.name,
            subscribers = subscribers.len(),
            "Signal notified"
        );

        for subscriber in subscribers {
            subscriber(&notified);
        }
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

/// Guard returned by [`ReadSignal::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the subscriber registered for the lifetime of the cell
    pub fn detach(mut self) {
        self.unsubscribe.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

//! In-memory history stack
//!
//! Follows the browser's session history rules closely enough to drive an
//! adapter without a browser:
//! - pushing truncates forward entries and appends
//! - `go`/`back`/`forward` move synchronously but their `popstate` is queued,
//!   like the browser's asynchronous traversal
//! - `push_state`/`replace_state` never dispatch events

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use url::Url;

use crate::error::NavigationError;
use crate::event::NavigationEvent;
use crate::provider::{Listener, NavigationProvider};
use crate::Result;

struct Stack {
    entries: Vec<Url>,
    index: usize,
    listeners: Vec<(NavigationEvent, Listener)>,
    pending: VecDeque<NavigationEvent>,
}

impl Stack {
    fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    fn push(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }
}

pub struct MemoryNavigator {
    origin: Url,
    stack: Arc<RwLock<Stack>>,
}

impl MemoryNavigator {
    /// A single-entry history at `origin` joined with `initial_path`
    pub fn new(origin: &str, initial_path: &str) -> Result<Self> {
        Self::with_entries(origin, &[initial_path], 0)
    }

    /// A history made of `paths` (oldest first) positioned at `index`
    pub fn with_entries(origin: &str, paths: &[&str], index: usize) -> Result<Self> {
        let origin = parse_origin(origin)?;

        if index >= paths.len() {
            return Err(NavigationError::OutOfRange {
                index,
                len: paths.len(),
            });
        }

        let entries = paths
            .iter()
            .map(|path| {
                origin
                    .join(path)
                    .map_err(|e| NavigationError::InvalidUrl(format!("{}: {}", path, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            origin,
            stack: Arc::new(RwLock::new(Stack {
                entries,
                index,
                listeners: Vec::new(),
                pending: VecDeque::new(),
            })),
        })
    }

    pub fn current_url(&self) -> Url {
        self.stack.read().current().clone()
    }

    /// Path plus hash of every entry, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.stack
            .read()
            .entries
            .iter()
            .map(|url| format!("{}{}", url.path(), hash_of(url)))
            .collect()
    }

    pub fn index(&self) -> usize {
        self.stack.read().index
    }

    pub fn listener_count(&self, event: NavigationEvent) -> usize {
        self.stack
            .read()
            .listeners
            .iter()
            .filter(|(e, _)| *e == event)
            .count()
    }

    pub fn pending_events(&self) -> usize {
        self.stack.read().pending.len()
    }

    /// Assign `location.hash`: push a fragment navigation and queue
    /// `popstate` followed by `hashchange`. Assigning the current hash is a
    /// no-op.
    pub fn set_hash(&self, hash: &str) {
        let fragment = hash.strip_prefix('#').unwrap_or(hash);

        let mut stack = self.stack.write();
        let mut next = stack.current().clone();
        next.set_fragment(Some(fragment));

        if hash_of(&next) == hash_of(stack.current()) {
            return;
        }

        tracing::debug!(hash = %hash_of(&next), "Fragment navigation");
        stack.push(next);
        stack.pending.push_back(NavigationEvent::PopState);
        stack.pending.push_back(NavigationEvent::HashChange);
    }

    /// Fire `event` at every listener registered for it, right now.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event: NavigationEvent) -> usize {
        let listeners: Vec<Listener> = self
            .stack
            .read()
            .listeners
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, l)| Arc::clone(l))
            .collect();

        tracing::trace!(event = %event, listeners = listeners.len(), "Dispatching");

        for listener in &listeners {
            listener(event);
        }

        listeners.len()
    }

    /// Deliver the events queued so far, oldest first.
    ///
    /// Returns the number of events delivered.
    pub fn dispatch_pending(&self) -> usize {
        let batch: Vec<NavigationEvent> = self.stack.write().pending.drain(..).collect();
        for event in &batch {
            self.dispatch(*event);
        }
        batch.len()
    }

    fn resolve(&self, current: &Url, target: &str) -> Result<Url> {
        let url = current
            .join(target)
            .map_err(|e| NavigationError::InvalidUrl(format!("{}: {}", target, e)))?;

        if url.origin() != self.origin.origin() {
            return Err(NavigationError::Security(format!(
                "{} is not same-origin with {}",
                url,
                self.origin.origin().ascii_serialization()
            )));
        }

        Ok(url)
    }
}

impl NavigationProvider for MemoryNavigator {
    fn current_path(&self) -> String {
        self.stack.read().current().path().to_string()
    }

    fn current_hash(&self) -> String {
        hash_of(self.stack.read().current())
    }

    fn stack_length(&self) -> usize {
        self.stack.read().entries.len()
    }

    fn push_state(&self, path: &str) -> Result<()> {
        let mut stack = self.stack.write();
        let url = self.resolve(stack.current(), path)?;
        tracing::debug!(url = %url, "pushState");
        stack.push(url);
        Ok(())
    }

    fn replace_state(&self, path: &str) -> Result<()> {
        let mut stack = self.stack.write();
        let url = self.resolve(stack.current(), path)?;
        tracing::debug!(url = %url, "replaceState");
        let index = stack.index;
        stack.entries[index] = url;
        Ok(())
    }

    fn go(&self, delta: i32) -> Result<()> {
        let mut stack = self.stack.write();
        let target = stack.index as i64 + i64::from(delta);

        // Out-of-range traversal is silently ignored, as in browsers
        if delta == 0 || target < 0 || target >= stack.entries.len() as i64 {
            tracing::trace!(delta, index = stack.index, "Ignored history traversal");
            return Ok(());
        }

        let from = stack.current().clone();
        stack.index = target as usize;
        let to = stack.current().clone();

        stack.pending.push_back(NavigationEvent::PopState);
        if same_document(&from, &to) && hash_of(&from) != hash_of(&to) {
            stack.pending.push_back(NavigationEvent::HashChange);
        }

        Ok(())
    }

    fn back(&self) -> Result<()> {
        self.go(-1)
    }

    fn forward(&self) -> Result<()> {
        self.go(1)
    }

    fn subscribe(&self, event: NavigationEvent, listener: Listener) -> Result<()> {
        self.stack.write().listeners.push((event, listener));
        Ok(())
    }
}

impl Clone for MemoryNavigator {
    fn clone(&self) -> Self {
        Self {
            origin: self.origin.clone(),
            stack: Arc::clone(&self.stack),
        }
    }
}

fn parse_origin(origin: &str) -> Result<Url> {
    let url = Url::parse(origin)
        .map_err(|e| NavigationError::InvalidUrl(format!("{}: {}", origin, e)))?;

    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(NavigationError::InvalidUrl(format!(
            "{}: origin must have a host",
            origin
        )));
    }

    Ok(url)
}

fn hash_of(url: &Url) -> String {
    match url.fragment() {
        Some(fragment) if !fragment.is_empty() => format!("#{}", fragment),
        _ => String::new(),
    }
}

fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

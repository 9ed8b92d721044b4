//! Event Registry - explicit subscribe/unsubscribe of DOM listeners
//!
//! Listeners are keyed by (target, event kind). Every `add` returns a
//! [`ListenerId`] and only that id removes the listener again, so an owner
//! can never detach someone else's handler.
//!
//! Delivery snapshots the matching listeners before invoking them. A
//! listener may therefore add or remove listeners (including itself)
//! while an event is being delivered. A listener removed earlier in the
//! same delivery is skipped; one added during delivery waits for the next
//! event.
//!
//! # Example
//!
//! ```ignore
//! let mut subs = Subscriptions::new(registry.clone());
//! subs.add(EventTarget::Window, EventKind::Scroll, Rc::new(|_: &DomEvent| println!("scrolled")));
//!
//! // Removes exactly the listeners added through `subs`
//! subs.clear();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::{DomEvent, EventKind, EventTarget};

/// Listener callback (Rc so delivery can clone it out of the registry).
pub type Listener = Rc<dyn Fn(&DomEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    listener: Listener,
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Default)]
pub struct EventRegistry {
    entries: RefCell<Vec<Entry>>,
    next_id: RefCell<u64>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, target: EventTarget, kind: EventKind, listener: Listener) -> ListenerId {
        let id = {
            let mut next = self.next_id.borrow_mut();
            let id = ListenerId(*next);
            *next += 1;
            id
        };

        self.entries.borrow_mut().push(Entry {
            id,
            target,
            kind,
            listener,
        });
        trace!(?id, ?target, ?kind, "listener added");
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if removed {
            trace!(?id, "listener removed");
        }
        removed
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }

    /// Invoke every listener attached to `current` for `event.kind`.
    ///
    /// Returns the number of listeners invoked.
    pub fn deliver(&self, current: EventTarget, event: &DomEvent) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .entries
            .borrow()
            .iter()
            .filter(|entry| entry.target == current && entry.kind == event.kind)
            .map(|entry| (entry.id, entry.listener.clone()))
            .collect();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            listener(event);
            delivered += 1;
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.target == target && entry.kind == kind)
            .count()
    }
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

/// The set of listeners one owner attached.
///
/// Removes them all on [`clear`](Subscriptions::clear) and on drop.
pub struct Subscriptions {
    registry: Rc<EventRegistry>,
    ids: Vec<ListenerId>,
}

impl Subscriptions {
    pub fn new(registry: Rc<EventRegistry>) -> Self {
        Self {
            registry,
            ids: Vec::new(),
        }
    }

    pub fn add(&mut self, target: EventTarget, kind: EventKind, listener: Listener) -> ListenerId {
        let id = self.registry.add(target, kind, listener);
        self.ids.push(id);
        id
    }

    /// Remove one listener owned by this set.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let owned = self.ids.len();
        self.ids.retain(|owned_id| *owned_id != id);
        if self.ids.len() == owned {
            return false;
        }
        self.registry.remove(id)
    }

    pub fn clear(&mut self) {
        for id in self.ids.drain(..) {
            self.registry.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.clear();
    }
}

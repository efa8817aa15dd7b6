// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Named-event publish/subscribe.
//!
//! [`EventBus`] takes a snapshot of a name's listeners before calling them:
//! a listener added during an emit is first called on the next emit, and a
//! listener removed during an emit is still called in that round. No borrow
//! is held while listeners run, so they may subscribe, unsubscribe or
//! dispatch freely.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::schema::{Schema, State};

/// Identifies one registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Event callback.
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// Emit/add/remove triplet the runtime publishes through.
pub trait EventEmitter<N, E> {
    /// Registers `listener` under `name`.
    fn add_listener(&self, name: N, listener: Listener<E>) -> ListenerId;
    /// Removes a listener; returns `false` if it was not registered.
    fn remove_listener(&self, name: &N, id: ListenerId) -> bool;
    /// Calls every listener registered under `name`, in registration order.
    fn emit(&self, name: &N, event: &E);
    /// Number of listeners registered under `name`.
    fn listener_count(&self, name: &N) -> usize;
}

/// Single-threaded [`EventEmitter`].
pub struct EventBus<N, E> {
    listeners: RefCell<BTreeMap<N, Vec<(ListenerId, Listener<E>)>>>,
    next_id: Cell<u64>,
}

impl<N: Ord, E> EventBus<N, E> {
    /// Bus with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
        }
    }
}

impl<N: Ord, E> Default for EventBus<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> EventEmitter<N, E> for EventBus<N, E>
where
    N: Ord + Clone + fmt::Debug,
{
    fn add_listener(&self, name: N, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(name)
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&self, name: &N, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(bucket) = listeners.get_mut(name) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|(lid, _)| *lid != id);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            listeners.remove(name);
        }
        removed
    }

    fn emit(&self, name: &N, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .get(name)
            .map(|bucket| bucket.iter().map(|(_, cb)| Rc::clone(cb)).collect())
            .unwrap_or_default();
        trace!(?name, listeners = snapshot.len(), "emit");
        for listener in snapshot {
            listener(event);
        }
    }

    fn listener_count(&self, name: &N) -> usize {
        self.listeners.borrow().get(name).map_or(0, Vec::len)
    }
}

impl<N: fmt::Debug, E> fmt::Debug for EventBus<N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        f.debug_map()
            .entries(listeners.iter().map(|(name, bucket)| (name, bucket.len())))
            .finish()
    }
}

/// Listener registration removed when dropped.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription<N: 'static, E: 'static> {
    emitter: Option<Weak<dyn EventEmitter<N, E>>>,
    name: N,
    id: ListenerId,
}

impl<N: Clone + 'static, E: 'static> Subscription<N, E> {
    /// Registers `listener` on `emitter` under `name`.
    pub fn new(emitter: &Rc<dyn EventEmitter<N, E>>, name: N, listener: Listener<E>) -> Self {
        let id = emitter.add_listener(name.clone(), listener);
        Self {
            emitter: Some(Rc::downgrade(emitter)),
            name,
            id,
        }
    }

    /// Id of the underlying listener.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Event name this subscription listens on.
    pub fn name(&self) -> &N {
        &self.name
    }

    /// Removes the listener now.
    ///
    /// Returns `false` when the emitter is gone or no longer holds the
    /// listener.
    pub fn cancel(mut self) -> bool {
        self.detach()
    }
}

impl<N: 'static, E: 'static> Subscription<N, E> {
    fn detach(&mut self) -> bool {
        self.emitter
            .take()
            .and_then(|emitter| emitter.upgrade())
            .is_some_and(|emitter| emitter.remove_listener(&self.name, self.id))
    }
}

impl<N: 'static, E: 'static> Drop for Subscription<N, E> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<N: fmt::Debug + 'static, E: 'static> fmt::Debug for Subscription<N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Event names published by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventName<K> {
    /// Fired after the named store committed a new slice.
    Store(K),
    /// Fired once at the end of a cycle in which any slice changed.
    Change,
}

impl<K: fmt::Display> fmt::Display for EventName<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(key) => fmt::Display::fmt(key, f),
            Self::Change => f.write_str("change"),
        }
    }
}

/// Payload published by the runtime.
pub enum FluxEvent<S: Schema> {
    /// Payload of [`EventName::Store`]: the committed global state, twice.
    StoreChanged {
        /// Store that changed.
        store: S::Key,
        /// Global state right after the store's slice landed.
        new_state: State<S>,
        /// Same container as `new_state`.
        state: State<S>,
    },
    /// Payload of [`EventName::Change`].
    Change,
}

impl<S: Schema> Clone for FluxEvent<S> {
    fn clone(&self) -> Self {
        match self {
            Self::StoreChanged {
                store,
                new_state,
                state,
            } => Self::StoreChanged {
                store: *store,
                new_state: new_state.clone(),
                state: state.clone(),
            },
            Self::Change => Self::Change,
        }
    }
}

impl<S: Schema> fmt::Debug for FluxEvent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreChanged {
                store, new_state, ..
            } => f
                .debug_struct("StoreChanged")
                .field("store", store)
                .field("new_state", new_state)
                .finish_non_exhaustive(),
            Self::Change => f.write_str("Change"),
        }
    }
}

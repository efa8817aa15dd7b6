// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event recorder for asserting emission order.

use std::cell::RefCell;
use std::rc::Rc;

use flux_core::{EventName, Flux, FluxEvent, FluxSubscription, Schema, State};

/// One event seen by an [`EventRecorder`].
pub struct Recorded<S: Schema> {
    /// Name the event was emitted under.
    pub name: EventName<S::Key>,
    /// Committed state carried by a store event; `None` for `change`.
    pub state: Option<State<S>>,
    /// Runtime state as read from inside the listener.
    pub observed: State<S>,
}

/// Records every event emitted under the watched names, in emission order.
///
/// Listeners are removed when the recorder is dropped.
pub struct EventRecorder<S: Schema> {
    log: Rc<RefCell<Vec<Recorded<S>>>>,
    _subscriptions: Vec<FluxSubscription<S>>,
}

impl<S: Schema> EventRecorder<S> {
    /// Watches `change` plus every name in `stores`.
    pub fn attach(flux: &Flux<S>, stores: &[S::Key]) -> Self {
        let log = Rc::new(RefCell::new(Vec::new()));
        let names = stores
            .iter()
            .map(|key| EventName::Store(*key))
            .chain(std::iter::once(EventName::Change));
        let subscriptions = names
            .map(|name| {
                let log = Rc::clone(&log);
                let weak = flux.downgrade();
                flux.subscribe(name, move |event: &FluxEvent<S>| {
                    let Ok(flux) = weak.upgrade() else {
                        return;
                    };
                    let state = match event {
                        FluxEvent::StoreChanged { new_state, .. } => Some(new_state.clone()),
                        FluxEvent::Change => None,
                    };
                    log.borrow_mut().push(Recorded {
                        name,
                        state,
                        observed: flux.get_state(),
                    });
                })
            })
            .collect();
        Self {
            log,
            _subscriptions: subscriptions,
        }
    }

    /// Names seen so far, oldest first.
    pub fn names(&self) -> Vec<EventName<S::Key>> {
        self.log.borrow().iter().map(|r| r.name).collect()
    }

    /// Number of events seen under `name`.
    pub fn count(&self, name: EventName<S::Key>) -> usize {
        self.log.borrow().iter().filter(|r| r.name == name).count()
    }

    /// Number of events seen in total.
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Returns `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Runs `f` over the recorded events.
    pub fn with_events<R>(&self, f: impl FnOnce(&[Recorded<S>]) -> R) -> R {
        f(&self.log.borrow())
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

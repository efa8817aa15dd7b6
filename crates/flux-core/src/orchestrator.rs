// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-cycle bookkeeping for one runtime.
//!
//! The orchestrator is the single writer of the global state. Only the
//! dispatcher handlers installed by `run_flux` call its mutating methods, and
//! none of them holds a borrow across a store call or an event emission, so
//! stores and listeners may read `get_state()` and dispatch at any time.
//!
//! A cycle is: `begin` (admission) → `snapshot` (first handler) → `reduce`
//! once per store in registration order → `finish` (last handler) → `end`,
//! which a [`CycleGuard`] also runs when a handler unwinds.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{FluxConfig, ReentrancyPolicy};
use crate::error::FluxError;
use crate::events::{EventName, FluxEvent};
use crate::flux::Flux;
use crate::schema::{Action, Schema, State};
use crate::store::{Reduction, StateSlices, Store};

struct Book<S: Schema> {
    state: State<S>,
    slices: StateSlices<S>,
    state_changed: bool,
    active: Option<&'static str>,
    pending: VecDeque<S::Action>,
    cycles: u64,
}

/// Owner of the committed state and of the running cycle's bookkeeping.
pub struct Orchestrator<S: Schema> {
    book: RefCell<Book<S>>,
    policy: ReentrancyPolicy,
    log_slice_values: bool,
}

impl<S: Schema> Orchestrator<S> {
    pub(crate) fn new(initial: State<S>, config: &FluxConfig) -> Self {
        Self {
            book: RefCell::new(Book {
                slices: StateSlices::at(&initial),
                state: initial,
                state_changed: false,
                active: None,
                pending: VecDeque::new(),
                cycles: 0,
            }),
            policy: config.reentrancy,
            log_slice_values: config.log_slice_values,
        }
    }

    /// Latest committed global state.
    pub fn state(&self) -> State<S> {
        self.book.borrow().state.clone()
    }

    /// Snapshots of the current (or last) cycle.
    pub fn slices(&self) -> StateSlices<S> {
        self.book.borrow().slices.clone()
    }

    /// Returns `true` while a cycle is running.
    pub fn is_dispatching(&self) -> bool {
        self.book.borrow().active.is_some()
    }

    /// Number of deferred actions waiting for the running cycle to finish.
    pub fn pending(&self) -> usize {
        self.book.borrow().pending.len()
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.book.borrow().cycles
    }

    /// Admits `action` into a new cycle.
    ///
    /// Returns `Ok(Some(action))` when the caller should run the cycle now and
    /// `Ok(None)` when the action was deferred behind the running cycle.
    pub(crate) fn begin(&self, action: S::Action) -> Result<Option<S::Action>, FluxError> {
        let mut book = self.book.borrow_mut();
        if let Some(active) = book.active {
            return match self.policy {
                ReentrancyPolicy::Queue => {
                    debug!(
                        action_type = action.action_type(),
                        active,
                        "deferring nested dispatch"
                    );
                    book.pending.push_back(action);
                    Ok(None)
                }
                ReentrancyPolicy::FailFast => Err(FluxError::ReentrantDispatch {
                    action_type: action.action_type(),
                    active,
                }),
            };
        }
        Self::open(&mut book, action.action_type());
        Ok(Some(action))
    }

    /// Pops the next deferred action and opens its cycle.
    pub(crate) fn next_pending(&self) -> Option<S::Action> {
        let mut book = self.book.borrow_mut();
        let action = book.pending.pop_front()?;
        Self::open(&mut book, action.action_type());
        Some(action)
    }

    fn open(book: &mut Book<S>, action_type: &'static str) {
        book.active = Some(action_type);
        book.state_changed = false;
        book.cycles += 1;
    }

    /// Guard over the cycle `begin`/`next_pending` just opened.
    pub(crate) fn guard(&self) -> CycleGuard<'_, S> {
        CycleGuard {
            orchestrator: self,
            open: true,
        }
    }

    /// Closes the running cycle; a failed cycle drops every deferred action.
    fn end(&self, succeeded: bool) {
        let mut book = self.book.borrow_mut();
        book.active = None;
        if !succeeded && !book.pending.is_empty() {
            warn!(
                dropped = book.pending.len(),
                "cycle failed; discarding deferred actions"
            );
            book.pending.clear();
        }
    }

    /// First handler of every cycle.
    pub(crate) fn snapshot(&self) {
        let mut book = self.book.borrow_mut();
        let slices = StateSlices::at(&book.state);
        book.slices = slices;
    }

    /// Per-store handler: reduce, commit, announce.
    pub(crate) fn reduce(
        &self,
        store: &dyn Store<S>,
        action: &S::Action,
        flux: &Flux<S>,
    ) -> Result<(), FluxError> {
        let name = store.name();
        let (previous, slices) = {
            let book = self.book.borrow();
            (book.state.get(&name).cloned(), book.slices.clone())
        };

        let reduction = store
            .reduce(previous.as_ref(), action, flux, &slices)
            .map_err(|source| FluxError::Store {
                store: name.to_string(),
                action_type: action.action_type(),
                source,
            })?;
        let Reduction::Replaced(next) = reduction else {
            return Ok(());
        };
        if previous.as_ref().is_some_and(|p| Arc::ptr_eq(p, &next)) {
            return Ok(());
        }

        if self.log_slice_values {
            trace!(store = %name, ?previous, ?next, "state changed");
        } else {
            debug!(store = %name, "state changed");
        }

        let new_state = {
            let mut book = self.book.borrow_mut();
            let committed = book.state.set(name, next);
            book.state = committed.clone();
            book.slices.current_state = committed.clone();
            book.state_changed = true;
            committed
        };
        flux.events().emit(
            &EventName::Store(name),
            &FluxEvent::StoreChanged {
                store: name,
                new_state: new_state.clone(),
                state: new_state,
            },
        );
        Ok(())
    }

    /// Last handler of every cycle: at most one `change` per cycle.
    pub(crate) fn finish(&self, flux: &Flux<S>) {
        let changed = std::mem::take(&mut self.book.borrow_mut().state_changed);
        if changed {
            flux.events().emit(&EventName::Change, &FluxEvent::Change);
        }
    }
}

/// Open cycle; closes it as failed when dropped without [`CycleGuard::close`].
///
/// Unwinding out of a store, listener or renderer drops the guard, so the
/// runtime accepts dispatches again once the panic has been caught.
pub(crate) struct CycleGuard<'a, S: Schema> {
    orchestrator: &'a Orchestrator<S>,
    open: bool,
}

impl<S: Schema> CycleGuard<'_, S> {
    /// Closes the cycle with the dispatcher's outcome.
    pub(crate) fn close(mut self, succeeded: bool) {
        self.open = false;
        self.orchestrator.end(succeeded);
    }
}

impl<S: Schema> Drop for CycleGuard<'_, S> {
    fn drop(&mut self) {
        if self.open {
            warn!("cycle unwound before completing; closing it as failed");
            self.orchestrator.end(false);
        }
    }
}

impl<S: Schema> fmt::Debug for Orchestrator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let book = self.book.borrow();
        f.debug_struct("Orchestrator")
            .field("state", &book.state)
            .field("active", &book.active)
            .field("pending", &book.pending.len())
            .field("cycles", &book.cycles)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

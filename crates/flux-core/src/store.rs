// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Store contract and reducer results.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;

use crate::flux::Flux;
use crate::schema::{Schema, State};

/// Outcome of one store reduction.
#[derive(Debug)]
pub enum Reduction<V> {
    /// Keep the current slice; no events fire for this store.
    Unchanged,
    /// Commit this slice. A slice that is `Arc::ptr_eq` to the current one
    /// counts as unchanged.
    Replaced(Arc<V>),
}

impl<V> Reduction<V> {
    /// Wraps a freshly computed slice.
    pub fn replace(value: V) -> Self {
        Self::Replaced(Arc::new(value))
    }

    /// Returns `true` for [`Reduction::Unchanged`].
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Before/after snapshots of the global state for the running cycle.
pub struct StateSlices<S: Schema> {
    /// Committed state as of the start of the cycle.
    pub prev_state: State<S>,
    /// Committed state including every slice change made so far in the cycle.
    pub current_state: State<S>,
}

impl<S: Schema> StateSlices<S> {
    pub(crate) fn at(state: &State<S>) -> Self {
        Self {
            prev_state: state.clone(),
            current_state: state.clone(),
        }
    }

    /// Returns `true` once some store has committed a change in this cycle.
    pub fn changed(&self) -> bool {
        !State::<S>::ptr_eq(&self.prev_state, &self.current_state)
    }
}

impl<S: Schema> Clone for StateSlices<S> {
    fn clone(&self) -> Self {
        Self {
            prev_state: self.prev_state.clone(),
            current_state: self.current_state.clone(),
        }
    }
}

impl<S: Schema> fmt::Debug for StateSlices<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSlices")
            .field("prev_state", &self.prev_state)
            .field("current_state", &self.current_state)
            .finish()
    }
}

/// Failure raised by a store; aborts the running cycle.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the action.
    #[error("rejected: {0}")]
    Rejected(String),
    /// Any other error surfaced by store code.
    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Named reducer over one slice of the global state.
pub trait Store<S: Schema> {
    /// Name of the slice this store owns.
    fn name(&self) -> S::Key;

    /// Computes the next slice for `action`.
    ///
    /// `slice` is `None` until the store has committed a first value.
    /// `flux` reflects every change committed earlier in the same cycle.
    fn reduce(
        &self,
        slice: Option<&Arc<S::Slice>>,
        action: &S::Action,
        flux: &Flux<S>,
        states: &StateSlices<S>,
    ) -> Result<Reduction<S::Slice>, StoreError>;
}

/// Store backed by a closure.
pub struct FnStore<S: Schema, F> {
    name: S::Key,
    reducer: F,
    _schema: PhantomData<fn() -> S>,
}

impl<S, F> Store<S> for FnStore<S, F>
where
    S: Schema,
    F: Fn(
        Option<&Arc<S::Slice>>,
        &S::Action,
        &Flux<S>,
        &StateSlices<S>,
    ) -> Result<Reduction<S::Slice>, StoreError>,
{
    fn name(&self) -> S::Key {
        self.name
    }

    fn reduce(
        &self,
        slice: Option<&Arc<S::Slice>>,
        action: &S::Action,
        flux: &Flux<S>,
        states: &StateSlices<S>,
    ) -> Result<Reduction<S::Slice>, StoreError> {
        (self.reducer)(slice, action, flux, states)
    }
}

/// Boxes a closure as a store named `name`.
pub fn store<S, F>(name: S::Key, reducer: F) -> Box<dyn Store<S>>
where
    S: Schema,
    F: Fn(
            Option<&Arc<S::Slice>>,
            &S::Action,
            &Flux<S>,
            &StateSlices<S>,
        ) -> Result<Reduction<S::Slice>, StoreError>
        + 'static,
{
    Box::new(FnStore {
        name,
        reducer,
        _schema: PhantomData,
    })
}

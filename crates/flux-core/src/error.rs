// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime error type.

use thiserror::Error;

use crate::actions::CreatorError;
use crate::store::StoreError;

/// Errors surfaced by the Flux runtime.
///
/// Nothing is recovered internally: every failure returns to the caller of
/// `run_flux`, `Flux::dispatch` or a bound action creator.
#[derive(Debug, Error)]
pub enum FluxError {
    /// A store failed; the cycle was aborted after earlier commits landed.
    #[error("store `{store}` failed on `{action_type}`: {source}")]
    Store {
        /// Name of the failing store.
        store: String,
        /// Tag of the action being reduced.
        action_type: &'static str,
        /// Error returned by the store.
        #[source]
        source: StoreError,
    },
    /// A dispatch was issued mid-cycle under `ReentrancyPolicy::FailFast`.
    #[error("dispatch of `{action_type}` rejected while `{active}` is in flight")]
    ReentrantDispatch {
        /// Tag of the rejected action.
        action_type: &'static str,
        /// Tag of the action whose cycle is running.
        active: &'static str,
    },
    /// Two stores were registered under the same name.
    #[error("duplicate store name: {0}")]
    DuplicateStore(String),
    /// The initial state holds a key no store owns.
    #[error("initial state key `{0}` has no registered store")]
    UnknownStateKey(String),
    /// Bootstrap was requested but the action type has no init action.
    #[error("bootstrap enabled but the action type defines no init action")]
    MissingInitAction,
    /// A plain initial-state value could not be normalized.
    #[error("invalid initial state: {0}")]
    InitialState(String),
    /// No bound action creator exists at the given path.
    #[error("no action creator at `{0}`")]
    UnknownActionCreator(String),
    /// The entry at the given path is a constant or namespace.
    #[error("`{0}` is not an action creator")]
    NotAnActionCreator(String),
    /// An action creator rejected its arguments.
    #[error("action creator `{path}` failed: {source}")]
    Creator {
        /// Dotted path of the creator.
        path: String,
        /// Error returned by the creator.
        #[source]
        source: CreatorError,
    },
    /// The runtime behind a weak handle was dropped.
    #[error("flux runtime dropped")]
    Detached,
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! flux-core: a single-tree Flux runtime.
//!
//! Named stores reduce their slice of one immutable global state tree in
//! registration order. Every dispatched action runs one synchronous cycle:
//! a snapshot handler, one handler per store, and a trailing handler that
//! emits at most one `change` event. Per-store events fire only after that
//! store's slice has been committed, so listeners always observe a
//! `get_state()` that already contains the update.
#![forbid(unsafe_code)]

mod actions;
mod config;
pub mod connect;
mod dispatcher;
mod error;
pub mod events;
mod flux;
mod orchestrator;
mod schema;
mod state;
mod store;

/// Action-creator binder.
pub use actions::{
    arg, ActionCreator, ActionCreators, BoundActions, BoundCreator, BoundEntry, CreatorError,
    CreatorFn,
};
/// Runtime configuration.
pub use config::{FluxConfig, ReentrancyPolicy};
/// Dispatcher contract and the synchronous default.
pub use dispatcher::{DispatchToken, Dispatcher, Handler, SyncDispatcher};
/// Runtime error type.
pub use error::FluxError;
/// Event emitter contract, default bus and Flux event types.
pub use events::{
    EventBus, EventEmitter, EventName, FluxEvent, Listener, ListenerId, Subscription,
};
/// Flux handle and entry point.
pub use flux::{run_flux, Flux, FluxEmitter, FluxOptions, FluxSubscription, WeakFlux};
/// Explicit per-cycle bookkeeping.
pub use orchestrator::Orchestrator;
/// Typed contracts shared by every runtime component.
pub use schema::{Action, Schema, State, StoreKey};
/// Immutable global state container.
pub use state::StateTree;
/// Store contract, reducer results and cycle snapshots.
pub use store::{store, FnStore, Reduction, StateSlices, Store, StoreError};

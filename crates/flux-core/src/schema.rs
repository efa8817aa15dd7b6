// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed contracts shared by the runtime.
//!
//! A [`Schema`] fixes the store-name enumeration, the slice type, the action
//! union and the addons bag once, so the orchestrator, stores, handle and
//! binder all agree on them at compile time.

use std::fmt;

use crate::state::StateTree;

/// Tagged action dispatched through the runtime.
///
/// Implementors are normally a closed enum; `action_type` is the tag stores
/// branch on and the runtime logs.
pub trait Action: fmt::Debug + 'static {
    /// Stable tag for this action (e.g. `"INC"`).
    fn action_type(&self) -> &'static str;

    /// Bootstrap action dispatched once by `run_flux` when
    /// [`FluxConfig::bootstrap`](crate::FluxConfig::bootstrap) is set.
    fn init() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// Store name usable as a state-tree key and event name.
pub trait StoreKey: Copy + Ord + fmt::Debug + fmt::Display + 'static {}

impl<T> StoreKey for T where T: Copy + Ord + fmt::Debug + fmt::Display + 'static {}

/// Type bundle for one Flux runtime.
pub trait Schema: 'static {
    /// Store names; also the keys of the global state tree.
    type Key: StoreKey;
    /// Value held by each store slice.
    type Slice: fmt::Debug + 'static;
    /// Action union.
    type Action: Action;
    /// Extra services handed through to stores untouched.
    type Addons: Default + 'static;
}

/// Global state tree of a schema.
pub type State<S> = StateTree<<S as Schema>::Key, <S as Schema>::Slice>;

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Action-creator binder.
//!
//! A creator turns positional JSON arguments into an action. Binding wraps
//! every creator so that calling it dispatches exactly the action it returns;
//! constants and namespaces are carried through as-is.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::FluxError;
use crate::flux::{Flux, FluxInner};
use crate::schema::Schema;

/// Error returned by an action creator.
#[derive(Debug, Error)]
pub enum CreatorError {
    /// Fewer arguments than the creator needs.
    #[error("missing argument #{0}")]
    MissingArgument(usize),
    /// An argument did not deserialize into the expected type.
    #[error("argument #{index}: {source}")]
    InvalidArgument {
        /// Zero-based argument position.
        index: usize,
        /// Deserialization failure.
        #[source]
        source: serde_json::Error,
    },
    /// The creator refused the arguments.
    #[error("{0}")]
    Rejected(String),
}

/// Deserializes positional argument `index`.
pub fn arg<T: DeserializeOwned>(args: &[Value], index: usize) -> Result<T, CreatorError> {
    let raw = args
        .get(index)
        .ok_or(CreatorError::MissingArgument(index))?;
    T::deserialize(raw).map_err(|source| CreatorError::InvalidArgument { index, source })
}

/// Function from arguments to an action.
pub type CreatorFn<A> = Rc<dyn Fn(&[Value]) -> Result<A, CreatorError>>;

/// Unbound entry of an [`ActionCreators`] map.
pub enum ActionCreator<A> {
    /// Produces an action.
    Creator(CreatorFn<A>),
    /// Passed through untouched.
    Constant(Value),
    /// Nested creators, bound recursively.
    Namespace(ActionCreators<A>),
}

/// Named action creators, constants and namespaces.
pub struct ActionCreators<A> {
    entries: BTreeMap<String, ActionCreator<A>>,
}

impl<A> ActionCreators<A> {
    /// Empty map.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds a creator.
    pub fn with_creator<F>(mut self, name: impl Into<String>, creator: F) -> Self
    where
        F: Fn(&[Value]) -> Result<A, CreatorError> + 'static,
    {
        self.entries
            .insert(name.into(), ActionCreator::Creator(Rc::new(creator)));
        self
    }

    /// Adds a constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.entries
            .insert(name.into(), ActionCreator::Constant(value));
        self
    }

    /// Adds a nested namespace.
    pub fn with_namespace(mut self, name: impl Into<String>, creators: Self) -> Self {
        self.entries
            .insert(name.into(), ActionCreator::Namespace(creators));
        self
    }

    /// Inserts an entry, returning the one it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        entry: ActionCreator<A>,
    ) -> Option<ActionCreator<A>> {
        self.entries.insert(name.into(), entry)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn bind<S>(self, flux: &Weak<FluxInner<S>>, prefix: &str) -> BoundActions<S>
    where
        S: Schema<Action = A>,
    {
        let entries = self
            .entries
            .into_iter()
            .map(|(name, entry)| {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                let bound = match entry {
                    ActionCreator::Creator(creator) => BoundEntry::Action(BoundCreator {
                        path,
                        creator,
                        flux: Weak::clone(flux),
                    }),
                    ActionCreator::Constant(value) => BoundEntry::Constant(value),
                    ActionCreator::Namespace(nested) => {
                        BoundEntry::Namespace(nested.bind(flux, &path))
                    }
                };
                (name, bound)
            })
            .collect();
        BoundActions { entries }
    }
}

impl<A> Default for ActionCreators<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ActionCreators<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Creator that dispatches what it returns.
pub struct BoundCreator<S: Schema> {
    path: String,
    creator: CreatorFn<S::Action>,
    flux: Weak<FluxInner<S>>,
}

impl<S: Schema> BoundCreator<S> {
    /// Dotted path of this creator (e.g. `todos.add`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runs the creator and dispatches its action.
    pub fn call(&self, args: &[Value]) -> Result<(), FluxError> {
        debug!(creator = %self.path, ?args, "call action creator");
        let action = (self.creator)(args).map_err(|source| FluxError::Creator {
            path: self.path.clone(),
            source,
        })?;
        Flux::from_weak(&self.flux)?.dispatch(action)
    }
}

impl<S: Schema> fmt::Debug for BoundCreator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundCreator").field(&self.path).finish()
    }
}

/// Entry of [`BoundActions`].
pub enum BoundEntry<S: Schema> {
    /// Dispatching creator.
    Action(BoundCreator<S>),
    /// Constant carried through.
    Constant(Value),
    /// Bound namespace.
    Namespace(BoundActions<S>),
}

impl<S: Schema> fmt::Debug for BoundEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(creator) => fmt::Debug::fmt(creator, f),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Namespace(nested) => fmt::Debug::fmt(nested, f),
        }
    }
}

/// Action creators bound to one runtime; exposed as `flux.actions()`.
pub struct BoundActions<S: Schema> {
    entries: BTreeMap<String, BoundEntry<S>>,
}

impl<S: Schema> BoundActions<S> {
    /// Entry at a dotted `path` (`"add"`, `"todos.add"`).
    pub fn get(&self, path: &str) -> Option<&BoundEntry<S>> {
        let mut segments = path.split('.');
        let mut entry = self.entries.get(segments.next()?)?;
        for segment in segments {
            let BoundEntry::Namespace(nested) = entry else {
                return None;
            };
            entry = nested.entries.get(segment)?;
        }
        Some(entry)
    }

    /// Creator at `path`.
    pub fn creator(&self, path: &str) -> Result<&BoundCreator<S>, FluxError> {
        match self.get(path) {
            Some(BoundEntry::Action(creator)) => Ok(creator),
            Some(_) => Err(FluxError::NotAnActionCreator(path.to_owned())),
            None => Err(FluxError::UnknownActionCreator(path.to_owned())),
        }
    }

    /// Calls the creator at `path` and dispatches its action.
    pub fn call(&self, path: &str, args: &[Value]) -> Result<(), FluxError> {
        self.creator(path)?.call(args)
    }

    /// Constant at `path`.
    pub fn constant(&self, path: &str) -> Option<&Value> {
        match self.get(path)? {
            BoundEntry::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Namespace at `path`.
    pub fn namespace(&self, path: &str) -> Option<&Self> {
        match self.get(path)? {
            BoundEntry::Namespace(nested) => Some(nested),
            _ => None,
        }
    }

    /// Top-level names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Schema> fmt::Debug for BoundActions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

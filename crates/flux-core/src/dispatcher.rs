// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-channel action broadcaster.

use std::fmt;

use crate::error::FluxError;

/// Callback invoked for every dispatched action.
pub type Handler<A> = Box<dyn Fn(&A) -> Result<(), FluxError>>;

/// Registration order of a handler within its dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DispatchToken(usize);

impl DispatchToken {
    /// Zero-based registration index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Broadcasts every action to all registered handlers.
///
/// Implementations must invoke handlers synchronously and in registration
/// order, and must stop at the first handler error and return it.
pub trait Dispatcher<A> {
    /// Appends `handler` to the invocation order.
    fn register(&mut self, handler: Handler<A>) -> DispatchToken;

    /// Fans `action` out to every handler.
    fn dispatch(&self, action: &A) -> Result<(), FluxError>;
}

/// In-process dispatcher that runs handlers on the caller's stack.
pub struct SyncDispatcher<A> {
    handlers: Vec<(DispatchToken, Handler<A>)>,
}

impl<A> SyncDispatcher<A> {
    /// Dispatcher with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<A> Default for SyncDispatcher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Dispatcher<A> for SyncDispatcher<A> {
    fn register(&mut self, handler: Handler<A>) -> DispatchToken {
        let token = DispatchToken(self.handlers.len());
        self.handlers.push((token, handler));
        token
    }

    fn dispatch(&self, action: &A) -> Result<(), FluxError> {
        for (_, handler) in &self.handlers {
            handler(action)?;
        }
        Ok(())
    }
}

impl<A> fmt::Debug for SyncDispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Handler<u32> {
        let log = Rc::clone(log);
        Box::new(move |action: &u32| {
            log.borrow_mut().push(format!("{tag}:{action}"));
            Ok(())
        })
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = SyncDispatcher::new();
        let first = dispatcher.register(recording(&log, "a"));
        let second = dispatcher.register(recording(&log, "b"));
        assert!(first < second);
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(dispatcher.len(), 2);

        dispatcher.dispatch(&7).unwrap();
        dispatcher.dispatch(&8).unwrap();
        assert_eq!(*log.borrow(), vec!["a:7", "b:7", "a:8", "b:8"]);
    }

    #[test]
    fn first_error_stops_fan_out() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = SyncDispatcher::new();
        dispatcher.register(recording(&log, "a"));
        dispatcher.register(Box::new(|_: &u32| Err(FluxError::Detached)));
        dispatcher.register(recording(&log, "c"));

        let err = dispatcher.dispatch(&1).unwrap_err();
        assert!(matches!(err, FluxError::Detached));
        assert_eq!(*log.borrow(), vec!["a:1"]);
    }
}

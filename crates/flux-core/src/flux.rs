// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Flux handle and the `run_flux` entry point.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, info, instrument};

use crate::actions::{ActionCreators, BoundActions};
use crate::config::FluxConfig;
use crate::dispatcher::{Dispatcher, SyncDispatcher};
use crate::error::FluxError;
use crate::events::{EventBus, EventEmitter, EventName, FluxEvent, Subscription};
use crate::orchestrator::Orchestrator;
use crate::schema::{Action, Schema, State};
use crate::store::Store;

/// Event emitter the runtime publishes through.
pub type FluxEmitter<S> = dyn EventEmitter<EventName<<S as Schema>::Key>, FluxEvent<S>>;

/// Subscription on a runtime's emitter.
pub type FluxSubscription<S> = Subscription<EventName<<S as Schema>::Key>, FluxEvent<S>>;

/// Optional inputs of [`run_flux`].
pub struct FluxOptions<S: Schema> {
    /// Creators bound into `flux.actions()`.
    pub actions: ActionCreators<S::Action>,
    /// Services exposed as `flux.addons()`; `S::Addons::default()` when `None`.
    pub addons: Option<S::Addons>,
    /// Runtime configuration.
    pub config: FluxConfig,
}

impl<S: Schema> FluxOptions<S> {
    /// Options with no creators, default addons and default config.
    pub fn new() -> Self {
        Self {
            actions: ActionCreators::new(),
            addons: None,
            config: FluxConfig::default(),
        }
    }

    /// Sets the action creators.
    pub fn with_actions(mut self, actions: ActionCreators<S::Action>) -> Self {
        self.actions = actions;
        self
    }

    /// Sets the addons bag.
    pub fn with_addons(mut self, addons: S::Addons) -> Self {
        self.addons = Some(addons);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: FluxConfig) -> Self {
        self.config = config;
        self
    }
}

impl<S: Schema> Default for FluxOptions<S> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct FluxInner<S: Schema> {
    events: Rc<FluxEmitter<S>>,
    dispatcher: Box<dyn Dispatcher<S::Action>>,
    actions: BoundActions<S>,
    addons: S::Addons,
    orchestrator: Orchestrator<S>,
    config: FluxConfig,
}

/// Long-lived handle to a running Flux runtime.
///
/// Clones share the same runtime. The handle is single-threaded.
pub struct Flux<S: Schema> {
    inner: Rc<FluxInner<S>>,
}

impl<S: Schema> Clone for Flux<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Non-owning handle; see [`Flux::downgrade`].
pub struct WeakFlux<S: Schema> {
    inner: Weak<FluxInner<S>>,
}

impl<S: Schema> Clone for WeakFlux<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: Schema> WeakFlux<S> {
    /// Strong handle, or `FluxError::Detached` once the runtime is gone.
    pub fn upgrade(&self) -> Result<Flux<S>, FluxError> {
        Flux::from_weak(&self.inner)
    }
}

/// Wires `stores` to `dispatcher` and returns the runtime handle.
///
/// Handlers are registered in this order: a snapshot handler, one handler
/// per store in the order given, and a trailing change handler. The
/// dispatcher and emitter are collaborators; [`Flux::start`] supplies the
/// in-process defaults.
pub fn run_flux<S, D, E>(
    stores: Vec<Box<dyn Store<S>>>,
    initial_state: State<S>,
    dispatcher: D,
    events: Rc<E>,
    options: FluxOptions<S>,
) -> Result<Flux<S>, FluxError>
where
    S: Schema,
    D: Dispatcher<S::Action> + 'static,
    E: EventEmitter<EventName<S::Key>, FluxEvent<S>> + 'static,
{
    let FluxOptions {
        actions,
        addons,
        config,
    } = options;

    let mut names = BTreeSet::new();
    for store in &stores {
        if !names.insert(store.name()) {
            return Err(FluxError::DuplicateStore(store.name().to_string()));
        }
    }
    if let Some(unknown) = initial_state.keys().find(|key| !names.contains(*key)) {
        return Err(FluxError::UnknownStateKey(unknown.to_string()));
    }
    let bootstrap = if config.bootstrap {
        Some(S::Action::init().ok_or(FluxError::MissingInitAction)?)
    } else {
        None
    };

    let events: Rc<FluxEmitter<S>> = events;
    let store_count = stores.len();
    let inner = Rc::new_cyclic(|weak: &Weak<FluxInner<S>>| {
        let mut dispatcher = dispatcher;

        let runtime = Weak::clone(weak);
        dispatcher.register(Box::new(move |_: &S::Action| {
            Flux::from_weak(&runtime)?.inner.orchestrator.snapshot();
            Ok(())
        }));

        for store in stores {
            let runtime = Weak::clone(weak);
            dispatcher.register(Box::new(move |action: &S::Action| {
                let flux = Flux::from_weak(&runtime)?;
                flux.inner.orchestrator.reduce(store.as_ref(), action, &flux)
            }));
        }

        let runtime = Weak::clone(weak);
        dispatcher.register(Box::new(move |_: &S::Action| {
            let flux = Flux::from_weak(&runtime)?;
            flux.inner.orchestrator.finish(&flux);
            Ok(())
        }));

        FluxInner {
            events,
            dispatcher: Box::new(dispatcher),
            actions: actions.bind(weak, ""),
            addons: addons.unwrap_or_default(),
            orchestrator: Orchestrator::new(initial_state, &config),
            config,
        }
    });
    let flux = Flux { inner };
    info!(stores = store_count, "flux runtime started");

    if let Some(init) = bootstrap {
        flux.dispatch(init)?;
    }
    Ok(flux)
}

impl<S: Schema> Flux<S> {
    /// [`run_flux`] with a [`SyncDispatcher`] and an [`EventBus`].
    pub fn start(
        stores: Vec<Box<dyn Store<S>>>,
        initial_state: State<S>,
        options: FluxOptions<S>,
    ) -> Result<Self, FluxError> {
        run_flux(
            stores,
            initial_state,
            SyncDispatcher::new(),
            Rc::new(EventBus::<EventName<S::Key>, FluxEvent<S>>::new()),
            options,
        )
    }

    pub(crate) fn from_weak(inner: &Weak<FluxInner<S>>) -> Result<Self, FluxError> {
        inner
            .upgrade()
            .map(|inner| Self { inner })
            .ok_or(FluxError::Detached)
    }

    /// Dispatches `action` through one full cycle.
    ///
    /// Called while a cycle is running, the action is deferred or rejected
    /// according to [`FluxConfig::reentrancy`].
    #[instrument(level = "debug", skip_all, fields(action_type = action.action_type()))]
    pub fn dispatch(&self, action: S::Action) -> Result<(), FluxError> {
        debug!(?action, "dispatch");
        let orchestrator = &self.inner.orchestrator;
        let Some(action) = orchestrator.begin(action)? else {
            return Ok(());
        };
        self.run_cycle(&action)?;
        while let Some(next) = orchestrator.next_pending() {
            debug!(action = ?next, "dispatch deferred");
            self.run_cycle(&next)?;
        }
        Ok(())
    }

    fn run_cycle(&self, action: &S::Action) -> Result<(), FluxError> {
        let cycle = self.inner.orchestrator.guard();
        let result = self.inner.dispatcher.dispatch(action);
        cycle.close(result.is_ok());
        result
    }

    /// Latest committed global state.
    pub fn get_state(&self) -> State<S> {
        self.inner.orchestrator.state()
    }

    /// Emitter carrying per-store and `change` events.
    pub fn events(&self) -> &FluxEmitter<S> {
        &*self.inner.events
    }

    /// Registers `listener` on `name` until the returned guard is dropped.
    pub fn subscribe<F>(&self, name: EventName<S::Key>, listener: F) -> FluxSubscription<S>
    where
        F: Fn(&FluxEvent<S>) + 'static,
    {
        Subscription::new(&self.inner.events, name, Rc::new(listener))
    }

    /// Bound action creators.
    pub fn actions(&self) -> &BoundActions<S> {
        &self.inner.actions
    }

    /// Addons bag.
    pub fn addons(&self) -> &S::Addons {
        &self.inner.addons
    }

    /// Configuration the runtime was started with.
    pub fn config(&self) -> &FluxConfig {
        &self.inner.config
    }

    /// Cycle bookkeeping.
    pub fn orchestrator(&self) -> &Orchestrator<S> {
        &self.inner.orchestrator
    }

    /// Non-owning handle, for listeners stored inside the runtime itself.
    pub fn downgrade(&self) -> WeakFlux<S> {
        WeakFlux {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` when both handles point at the same runtime.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<S: Schema> fmt::Debug for Flux<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flux")
            .field("orchestrator", &self.inner.orchestrator)
            .field("actions", &self.inner.actions)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Framework-agnostic connector.
//!
//! A [`Connector`] keeps a piece of derived data in sync with the global
//! state: on every `change` event it runs a selector over the held data and
//! the new state, and calls its renderer only when the selector returned a
//! different `Arc`. How rendering happens is up to the renderer.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;

use crate::events::EventName;
use crate::flux::{Flux, FluxSubscription};
use crate::schema::{Schema, State};

/// What a renderer receives.
pub struct RenderProps<'a, S: Schema, D> {
    /// Selected data.
    pub data: &'a Arc<D>,
    /// Runtime handle, for `dispatch`, `actions` and `addons`.
    pub flux: &'a Flux<S>,
}

type Selector<S, D> = dyn Fn(&Arc<D>, &State<S>) -> Arc<D>;
type Renderer<S, D> = dyn Fn(RenderProps<'_, S, D>);

struct Binding<S: Schema, D> {
    data: RefCell<Arc<D>>,
    renders: Cell<u64>,
    selector: Box<Selector<S, D>>,
    renderer: Box<Renderer<S, D>>,
}

impl<S: Schema, D> Binding<S, D> {
    fn refresh(&self, flux: &Flux<S>, force_render: bool) {
        let current = Arc::clone(&self.data.borrow());
        let selected = (self.selector)(&current, &flux.get_state());
        let changed = !Arc::ptr_eq(&current, &selected);
        if changed {
            *self.data.borrow_mut() = Arc::clone(&selected);
        }
        if changed || force_render {
            self.renders.set(self.renders.get() + 1);
            trace!(renders = self.renders.get(), "connector render");
            (self.renderer)(RenderProps {
                data: &selected,
                flux,
            });
        }
    }
}

/// Live selection over a runtime's state; unmounts when dropped.
pub struct Connector<S: Schema, D> {
    binding: Rc<Binding<S, D>>,
    _subscription: FluxSubscription<S>,
}

impl<S: Schema, D: 'static> Connector<S, D> {
    /// Subscribes to `change`, selects once and renders once.
    pub fn mount<Sel, R>(flux: &Flux<S>, initial: D, selector: Sel, renderer: R) -> Self
    where
        Sel: Fn(&Arc<D>, &State<S>) -> Arc<D> + 'static,
        R: Fn(RenderProps<'_, S, D>) + 'static,
    {
        let binding = Rc::new(Binding {
            data: RefCell::new(Arc::new(initial)),
            renders: Cell::new(0),
            selector: Box::new(selector),
            renderer: Box::new(renderer),
        });

        let weak_binding = Rc::downgrade(&binding);
        let weak_flux = flux.downgrade();
        let subscription = flux.subscribe(EventName::Change, move |_| {
            if let (Some(binding), Ok(flux)) = (weak_binding.upgrade(), weak_flux.upgrade()) {
                binding.refresh(&flux, false);
            }
        });

        binding.refresh(flux, true);
        Self {
            binding,
            _subscription: subscription,
        }
    }

    /// Currently held data.
    pub fn data(&self) -> Arc<D> {
        Arc::clone(&self.binding.data.borrow())
    }

    /// Number of renderer calls so far, including the mount render.
    pub fn renders(&self) -> u64 {
        self.binding.renders.get()
    }

    /// Removes the `change` listener.
    pub fn unmount(self) {
        drop(self);
    }
}

impl<S: Schema, D: fmt::Debug> fmt::Debug for Connector<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("data", &self.binding.data.borrow())
            .field("renders", &self.binding.renders.get())
            .finish_non_exhaustive()
    }
}

/// Display name of a connector wrapping `inner`.
pub fn display_name(inner: &str) -> String {
    let inner = if inner.is_empty() { "Component" } else { inner };
    format!("Connector({inner})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_wraps_inner_name() {
        assert_eq!(display_name("TodoList"), "Connector(TodoList)");
        assert_eq!(display_name(""), "Connector(Component)");
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless connector: select on `change`, render only when the selection moved.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use flux_core::connect::{Connector, RenderProps};
use flux_core::{EventName, Flux, FluxConfig, State};
use flux_dry_tests::{counter_flux, Slot, TestAction, TestSchema};

fn select_mirror(current: &Arc<i64>, state: &State<TestSchema>) -> Arc<i64> {
    match state.get(&Slot::Mirror) {
        Some(value) if **value != **current => Arc::clone(value),
        _ => Arc::clone(current),
    }
}

fn mount(flux: &Flux<TestSchema>) -> (Connector<TestSchema, i64>, Rc<RefCell<Vec<i64>>>) {
    let rendered = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&rendered);
    let connector = Connector::mount(
        flux,
        -1,
        select_mirror,
        move |props: RenderProps<'_, TestSchema, i64>| log.borrow_mut().push(**props.data),
    );
    (connector, rendered)
}

#[test]
fn mount_selects_and_renders_once() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let (connector, rendered) = mount(&flux);

    assert_eq!(*connector.data(), 0);
    assert_eq!(connector.renders(), 1);
    assert_eq!(*rendered.borrow(), [0]);
}

#[test]
fn renders_only_when_the_selection_changes() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let (connector, rendered) = mount(&flux);

    flux.dispatch(TestAction::Inc).unwrap();
    // Counter gets a fresh slice of equal value; the mirror stays put.
    flux.dispatch(TestAction::Add(0)).unwrap();
    flux.dispatch(TestAction::Noop).unwrap();
    flux.dispatch(TestAction::Add(2)).unwrap();

    assert_eq!(*rendered.borrow(), [0, 10, 30]);
    assert_eq!(connector.renders(), 3);
    assert_eq!(*connector.data(), 30);
}

#[test]
fn unmount_removes_the_change_listener() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let (connector, rendered) = mount(&flux);
    assert_eq!(flux.events().listener_count(&EventName::Change), 1);

    connector.unmount();
    flux.dispatch(TestAction::Inc).unwrap();

    assert_eq!(flux.events().listener_count(&EventName::Change), 0);
    assert_eq!(*rendered.borrow(), [0]);
}

#[test]
fn renderer_can_dispatch_through_props() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let connector = Connector::mount(
        &flux,
        -1,
        select_mirror,
        |props: RenderProps<'_, TestSchema, i64>| {
            if **props.data == 10 {
                props.flux.dispatch(TestAction::Inc).unwrap();
            }
        },
    );

    flux.dispatch(TestAction::Inc).unwrap();

    assert_eq!(**flux.get_state().get(&Slot::Counter).unwrap(), 2);
    assert_eq!(*connector.data(), 20);
    assert_eq!(connector.renders(), 3);
}

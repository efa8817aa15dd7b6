// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `run_flux` validation, bootstrap and handle lifetime.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use flux_core::{
    run_flux, Action, EventBus, EventEmitter, EventName, Flux, FluxConfig, FluxError, FluxEvent,
    FluxOptions, Schema, State, SyncDispatcher,
};
use flux_dry_tests::{
    counter_flux, counter_state, counter_store, mirror_store, Slot, TestAction, TestAddons,
    TestSchema,
};
use serde_json::json;

#[test]
fn duplicate_store_names_are_refused() {
    let err = Flux::start(
        vec![counter_store(), mirror_store(), counter_store()],
        State::<TestSchema>::new(),
        FluxOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, FluxError::DuplicateStore(name) if name == "counter"));
}

#[test]
fn initial_state_keys_need_an_owner() {
    let err = Flux::start(
        vec![counter_store()],
        counter_state(0, 0),
        FluxOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, FluxError::UnknownStateKey(name) if name == "mirror"));
}

#[test]
fn initial_state_is_used_as_is() {
    let initial = counter_state(5, 50);
    let flux = Flux::start(
        vec![counter_store(), mirror_store()],
        initial.clone(),
        FluxOptions::new(),
    )
    .unwrap();
    assert!(State::<TestSchema>::ptr_eq(&initial, &flux.get_state()));
    assert_eq!(flux.orchestrator().cycles(), 0);
}

#[test]
fn initial_state_from_json() {
    let initial = State::<TestSchema>::from_json(json!({"counter": 2, "mirror": 20})).unwrap();
    let flux = Flux::start(
        vec![counter_store(), mirror_store()],
        initial,
        FluxOptions::new(),
    )
    .unwrap();
    flux.dispatch(TestAction::Inc).unwrap();
    assert_eq!(flux.get_state(), counter_state(3, 30));

    let err = State::<TestSchema>::from_json(json!({"nope": 1})).unwrap_err();
    assert!(matches!(err, FluxError::InitialState(_)));
}

#[test]
fn bootstrap_dispatches_init_once_before_returning() {
    let flux = Flux::start(
        vec![counter_store(), mirror_store()],
        State::<TestSchema>::new(),
        FluxOptions::new().with_config(FluxConfig::default().with_bootstrap(true)),
    )
    .unwrap();

    assert_eq!(flux.orchestrator().cycles(), 1);
    assert_eq!(flux.get_state(), counter_state(0, 0));
}

#[test]
fn bootstrap_is_off_by_default() {
    let flux = Flux::start(
        vec![counter_store()],
        State::<TestSchema>::new(),
        FluxOptions::new(),
    )
    .unwrap();
    assert!(flux.get_state().is_empty());
    assert_eq!(flux.orchestrator().cycles(), 0);
}

#[derive(Debug)]
struct Plain;

impl Action for Plain {
    fn action_type(&self) -> &'static str {
        "PLAIN"
    }
}

enum PlainSchema {}

impl Schema for PlainSchema {
    type Key = &'static str;
    type Slice = u32;
    type Action = Plain;
    type Addons = ();
}

#[test]
fn bootstrap_without_init_action_fails() {
    let err = Flux::<PlainSchema>::start(
        Vec::new(),
        State::<PlainSchema>::new(),
        FluxOptions::new().with_config(FluxConfig::default().with_bootstrap(true)),
    )
    .unwrap_err();
    assert!(matches!(err, FluxError::MissingInitAction));
}

#[test]
fn run_flux_accepts_explicit_collaborators() {
    let events = Rc::new(EventBus::<EventName<Slot>, FluxEvent<TestSchema>>::new());
    let flux = run_flux(
        vec![counter_store()],
        State::<TestSchema>::new(),
        SyncDispatcher::new(),
        Rc::clone(&events),
        FluxOptions::new().with_addons(TestAddons {
            label: "explicit".into(),
        }),
    )
    .unwrap();

    let _sub = flux.subscribe(EventName::Change, |_| {});
    assert_eq!(events.listener_count(&EventName::Change), 1);
    assert_eq!(flux.addons().label, "explicit");
}

#[test]
fn addons_default_when_omitted() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    assert_eq!(flux.addons(), &TestAddons::default());
    assert_eq!(flux.config(), &FluxConfig::default());
}

#[test]
fn clones_share_one_runtime() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let other = flux.clone();
    other.dispatch(TestAction::Inc).unwrap();
    assert!(Flux::ptr_eq(&flux, &other));
    assert_eq!(flux.get_state(), counter_state(1, 10));
}

#[test]
fn weak_handle_detaches_when_runtime_drops() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let weak = flux.downgrade();
    assert!(weak.upgrade().is_ok());
    drop(flux);
    assert!(matches!(weak.upgrade(), Err(FluxError::Detached)));
}

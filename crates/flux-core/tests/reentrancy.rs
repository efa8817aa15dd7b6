// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dispatches issued while a cycle is running.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use flux_core::{
    store, EventName, Flux, FluxConfig, FluxError, FluxEvent, FluxOptions, Reduction,
    ReentrancyPolicy, StateSlices, StoreError,
};
use flux_dry_tests::{counter_flux, counter_state, EventRecorder, Slot, TestAction, TestSchema};

fn fail_fast() -> FluxConfig {
    FluxConfig::default().with_reentrancy(ReentrancyPolicy::FailFast)
}

#[test]
fn nested_dispatch_is_queued_and_drained_before_returning() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let recorder = EventRecorder::attach(&flux, &[Slot::Counter, Slot::Mirror]);

    flux.dispatch(TestAction::Chain(2)).unwrap();

    assert_eq!(flux.get_state(), counter_state(3, 30));
    assert_eq!(flux.orchestrator().cycles(), 3);
    assert_eq!(flux.orchestrator().pending(), 0);
    assert_eq!(recorder.count(EventName::Change), 3);

    // Each deferred action ran in its own cycle, after the one that issued it.
    let mirrors: Vec<i64> = recorder.with_events(|events| {
        events
            .iter()
            .filter(|r| r.name == EventName::Store(Slot::Mirror))
            .map(|r| **r.state.as_ref().unwrap().get(&Slot::Mirror).unwrap())
            .collect()
    });
    assert_eq!(mirrors, [10, 20, 30]);
}

#[test]
fn listener_dispatch_runs_after_the_current_cycle() {
    let flux = counter_flux(FluxConfig::default()).unwrap();
    let weak = flux.downgrade();
    let _sub = flux.subscribe(EventName::Store(Slot::Counter), move |event| {
        let FluxEvent::StoreChanged { new_state, .. } = event else {
            return;
        };
        if **new_state.get(&Slot::Counter).unwrap() == 1 {
            weak.upgrade().unwrap().dispatch(TestAction::Add(10)).unwrap();
        }
    });
    let recorder = EventRecorder::attach(&flux, &[Slot::Mirror]);

    flux.dispatch(TestAction::Inc).unwrap();

    assert_eq!(flux.get_state(), counter_state(11, 110));
    assert_eq!(recorder.count(EventName::Change), 2);
}

#[test]
fn fail_fast_rejects_nested_dispatch() {
    let flux = counter_flux(fail_fast()).unwrap();

    let err = flux.dispatch(TestAction::Chain(1)).unwrap_err();
    let inner = match err {
        FluxError::Store {
            source: StoreError::Source(inner),
            ..
        } => inner,
        other => panic!("unexpected error: {other}"),
    };
    let nested = inner.downcast_ref::<FluxError>().unwrap();
    assert!(matches!(
        nested,
        FluxError::ReentrantDispatch {
            action_type: "CHAIN",
            active: "CHAIN"
        }
    ));

    assert_eq!(flux.get_state(), counter_state(0, 0));
    assert!(!flux.orchestrator().is_dispatching());
    flux.dispatch(TestAction::Chain(0)).unwrap();
    assert_eq!(flux.get_state(), counter_state(1, 10));
}

#[test]
fn failed_cycle_discards_deferred_actions() {
    let flaky = store::<TestSchema, _>(
        Slot::Counter,
        |slice: Option<&Arc<i64>>,
         action: &TestAction,
         flux: &Flux<TestSchema>,
         _: &StateSlices<TestSchema>| {
            let current = slice.map_or(0, |v| **v);
            match action {
                TestAction::Inc => Ok(Reduction::replace(current + 1)),
                TestAction::Boom => {
                    flux.dispatch(TestAction::Inc)
                        .map_err(|err| StoreError::Source(Box::new(err)))?;
                    Err(StoreError::Rejected("boom".into()))
                }
                _ => Ok(Reduction::Unchanged),
            }
        },
    );
    let flux = Flux::start(
        vec![flaky],
        [(Slot::Counter, 0)].into_iter().collect(),
        FluxOptions::new(),
    )
    .unwrap();

    assert!(flux.dispatch(TestAction::Boom).is_err());
    assert_eq!(flux.orchestrator().pending(), 0);
    assert_eq!(**flux.get_state().get(&Slot::Counter).unwrap(), 0);

    flux.dispatch(TestAction::Inc).unwrap();
    assert_eq!(**flux.get_state().get(&Slot::Counter).unwrap(), 1);
}

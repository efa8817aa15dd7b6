// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reducers over [`TestSchema`].

use std::sync::Arc;

use flux_core::{store, Flux, Reduction, StateSlices, Store, StoreError};

use crate::schema::{Slot, TestAction, TestSchema};

/// Store owning [`Slot::Counter`].
///
/// `Noop` leaves the slice alone, `Boom` fails with
/// [`StoreError::Rejected`], and `Chain(n)` dispatches `Chain(n - 1)` through
/// `flux` before committing; a refused nested dispatch fails the store.
pub fn counter_store() -> Box<dyn Store<TestSchema>> {
    store::<TestSchema, _>(
        Slot::Counter,
        |slice: Option<&Arc<i64>>,
         action: &TestAction,
         flux: &Flux<TestSchema>,
         _: &StateSlices<TestSchema>| {
            let current = slice.map_or(0, |v| **v);
            match action {
                TestAction::Init if slice.is_none() => Ok(Reduction::replace(0)),
                TestAction::Init | TestAction::Noop => Ok(Reduction::Unchanged),
                TestAction::Inc => Ok(Reduction::replace(current + 1)),
                TestAction::Add(n) => Ok(Reduction::replace(current + n)),
                TestAction::Reset => Ok(Reduction::replace(0)),
                TestAction::Boom => Err(StoreError::Rejected("boom".into())),
                TestAction::Chain(n) => {
                    if *n > 0 {
                        flux.dispatch(TestAction::Chain(n - 1))
                            .map_err(|err| StoreError::Source(Box::new(err)))?;
                    }
                    Ok(Reduction::replace(current + 1))
                }
            }
        },
    )
}

/// Store owning [`Slot::Mirror`]: ten times the committed counter.
///
/// Reads the counter through `flux.get_state()`, so it sees what
/// [`counter_store`] committed earlier in the same cycle when registered
/// after it. Returns `Unchanged` when the value would not move.
pub fn mirror_store() -> Box<dyn Store<TestSchema>> {
    store::<TestSchema, _>(
        Slot::Mirror,
        |slice: Option<&Arc<i64>>,
         action: &TestAction,
         flux: &Flux<TestSchema>,
         _: &StateSlices<TestSchema>| {
            if matches!(action, TestAction::Noop) {
                return Ok(Reduction::Unchanged);
            }
            let counter = flux.get_state().get(&Slot::Counter).map_or(0, |v| **v);
            let next = counter * 10;
            if slice.is_some_and(|v| **v == next) {
                return Ok(Reduction::Unchanged);
            }
            Ok(Reduction::replace(next))
        },
    )
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ready-made runtimes over [`TestSchema`].

use flux_core::{Flux, FluxConfig, FluxError, FluxOptions, State};

use crate::schema::{Slot, TestSchema};
use crate::stores::{counter_store, mirror_store};

/// State with both slots set.
pub fn counter_state(counter: i64, mirror: i64) -> State<TestSchema> {
    [(Slot::Counter, counter), (Slot::Mirror, mirror)]
        .into_iter()
        .collect()
}

/// Runtime with `counter_store` then `mirror_store`, both starting at `0`.
pub fn counter_flux(config: FluxConfig) -> Result<Flux<TestSchema>, FluxError> {
    Flux::start(
        vec![counter_store(), mirror_store()],
        counter_state(0, 0),
        FluxOptions::new().with_config(config),
    )
}

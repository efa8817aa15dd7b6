// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// What happens to a dispatch issued while a cycle is running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentrancyPolicy {
    /// Defer the action and run it in its own cycle once the current one
    /// completes, before the outer `dispatch` returns.
    #[default]
    Queue,
    /// Reject the action with `FluxError::ReentrantDispatch`.
    FailFast,
}

/// Knobs read once by `run_flux`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxConfig {
    /// Dispatch `Action::init()` once before `run_flux` returns.
    pub bootstrap: bool,
    /// Nested dispatch handling.
    pub reentrancy: ReentrancyPolicy,
    /// Include previous/next slice values in `trace` state-change logs.
    pub log_slice_values: bool,
}

impl FluxConfig {
    /// Sets [`FluxConfig::bootstrap`].
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Sets [`FluxConfig::reentrancy`].
    pub fn with_reentrancy(mut self, reentrancy: ReentrancyPolicy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    /// Sets [`FluxConfig::log_slice_values`].
    pub fn with_slice_values(mut self, log_slice_values: bool) -> Self {
        self.log_slice_values = log_slice_values;
        self
    }
}

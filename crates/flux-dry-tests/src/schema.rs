// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Test schema: two integer slots and a small action union.

use std::fmt;
use std::str::FromStr;

use flux_core::{Action, Schema};

/// Store names of [`TestSchema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Owned by [`counter_store`](crate::counter_store).
    Counter,
    /// Owned by [`mirror_store`](crate::mirror_store).
    Mirror,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Counter => "counter",
            Self::Mirror => "mirror",
        })
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "mirror" => Ok(Self::Mirror),
            other => Err(format!("unknown slot `{other}`")),
        }
    }
}

/// Actions understood by the test stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestAction {
    /// Bootstrap; seeds missing slots with `0`.
    Init,
    /// Counter + 1.
    Inc,
    /// Counter + n.
    Add(i64),
    /// Counter back to `0`.
    Reset,
    /// Every store returns `Unchanged`.
    Noop,
    /// The counter store fails.
    Boom,
    /// Counter + 1, then dispatches `Chain(n - 1)` from inside the store while `n > 0`.
    Chain(u8),
}

impl Action for TestAction {
    fn action_type(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Inc => "INC",
            Self::Add(_) => "ADD",
            Self::Reset => "RESET",
            Self::Noop => "NOOP",
            Self::Boom => "BOOM",
            Self::Chain(_) => "CHAIN",
        }
    }

    fn init() -> Option<Self> {
        Some(Self::Init)
    }
}

/// Addons bag handed to test runtimes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestAddons {
    /// Free-form tag tests can read back through `flux.addons()`.
    pub label: String,
}

/// Schema used across the Flux test suites.
#[derive(Debug)]
pub enum TestSchema {}

impl Schema for TestSchema {
    type Key = Slot;
    type Slice = i64;
    type Action = TestAction;
    type Addons = TestAddons;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_round_trip() {
        for slot in [Slot::Counter, Slot::Mirror] {
            assert_eq!(slot.to_string().parse::<Slot>(), Ok(slot));
        }
        assert!("nope".parse::<Slot>().is_err());
    }
}

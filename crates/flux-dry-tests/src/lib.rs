// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Flux crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`schema`] - `TestSchema`, its `Slot` keys and `TestAction` union
//! - [`stores`] - Counter and mirror reducers over `TestSchema`
//! - [`recorder`] - Event recorder for asserting emission order
//! - [`fixtures`] - Ready-made runtimes

pub mod config;
pub mod fixtures;
pub mod recorder;
pub mod schema;
pub mod stores;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use fixtures::{counter_flux, counter_state};
pub use recorder::{EventRecorder, Recorded};
pub use schema::{Slot, TestAction, TestAddons, TestSchema};
pub use stores::{counter_store, mirror_store};

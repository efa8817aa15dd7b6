// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use flux_config::{ConfigError, ConfigService, FLUX_CONFIG_KEY};
use flux_core::{FluxConfig, ReentrancyPolicy};
use flux_dry_tests::InMemoryConfigStore;

#[test]
fn missing_config_loads_defaults() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());

    assert!(service.stored_flux_config().unwrap().is_none());
    assert_eq!(service.load_flux_config().unwrap(), FluxConfig::default());
    assert_eq!(store.load_count(), 2);
}

#[test]
fn empty_blob_counts_as_missing() {
    let service = ConfigService::new(InMemoryConfigStore::with_entry(FLUX_CONFIG_KEY, b""));
    assert!(service.stored_flux_config().unwrap().is_none());
    assert_eq!(service.load_flux_config().unwrap(), FluxConfig::default());
}

#[test]
fn saved_config_round_trips_under_flux_key() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let config = FluxConfig::default()
        .with_bootstrap(true)
        .with_reentrancy(ReentrancyPolicy::FailFast)
        .with_slice_values(true);

    service.save_flux_config(&config).unwrap();
    assert_eq!(service.key(), FLUX_CONFIG_KEY);
    let raw: serde_json::Value =
        serde_json::from_slice(&store.raw(FLUX_CONFIG_KEY).unwrap()).unwrap();
    assert_eq!(raw["reentrancy"], "fail_fast");

    assert_eq!(service.load_flux_config().unwrap(), config);
}

#[test]
fn custom_key_keeps_configs_apart() {
    let store = InMemoryConfigStore::new();
    let todos = ConfigService::with_key(store.clone(), "todos").unwrap();
    todos
        .save_flux_config(&FluxConfig::default().with_bootstrap(true))
        .unwrap();

    assert!(store.contains_key("todos"));
    assert!(!store.contains_key(FLUX_CONFIG_KEY));
    let default = ConfigService::new(store);
    assert_eq!(default.load_flux_config().unwrap(), FluxConfig::default());
}

#[test]
fn invalid_key_is_refused() {
    let err = ConfigService::with_key(InMemoryConfigStore::new(), "../escape").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKey(key) if key == "../escape"));
}

#[test]
fn partial_config_fills_defaults() {
    let service = ConfigService::new(InMemoryConfigStore::with_entry(
        FLUX_CONFIG_KEY,
        br#"{"bootstrap": true}"#,
    ));
    let config = service.load_flux_config().unwrap();
    assert!(config.bootstrap);
    assert_eq!(config.reentrancy, ReentrancyPolicy::Queue);
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());

    store.set_fail_on_load(true);
    assert!(matches!(
        service.load_flux_config(),
        Err(ConfigError::Backend(_))
    ));

    store.set_fail_on_save(true);
    assert!(matches!(
        service.save_flux_config(&FluxConfig::default()),
        Err(ConfigError::Backend(_))
    ));
}

#[test]
fn malformed_blob_names_the_key() {
    let service =
        ConfigService::new(InMemoryConfigStore::with_entry(FLUX_CONFIG_KEY, b"{not json"));
    assert!(matches!(
        service.load_flux_config(),
        Err(ConfigError::Decode { key, .. }) if key == FLUX_CONFIG_KEY
    ));
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistence of [`FluxConfig`] behind a byte-blob storage port.
//!
//! Adapters only move bytes under a validated key; JSON encoding, defaults
//! and logging live in [`ConfigService`].
#![forbid(unsafe_code)]

use flux_core::FluxConfig;
use thiserror::Error;
use tracing::{debug, info};

/// Default key under which [`FluxConfig`] is stored.
pub const FLUX_CONFIG_KEY: &str = "flux";

/// Storage port for raw config blobs.
pub trait ConfigStore {
    /// Blob stored under `key`, or `None` when nothing was saved yet.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replaces the blob stored under `key`.
    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key outside `[a-z0-9_-]+`.
    #[error("invalid config key `{0}`")]
    InvalidKey(String),
    /// The stored blob is not a valid `FluxConfig`.
    #[error("config `{key}` is malformed: {source}")]
    Decode {
        /// Key that was read.
        key: String,
        /// JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// The config could not be encoded.
    #[error("config `{key}` could not be encoded: {source}")]
    Encode {
        /// Key that was written.
        key: String,
        /// JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// I/O failure in a storage adapter.
    #[error("config `{key}`: {source}")]
    Io {
        /// Key being read or written.
        key: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Any other adapter failure.
    #[error("config backend: {0}")]
    Backend(String),
}

/// Checks that `key` is usable by every adapter (file names included).
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_owned()))
    }
}

/// Loads and saves one [`FluxConfig`] through a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
    key: String,
}

impl<S> ConfigService<S> {
    /// Service storing under [`FLUX_CONFIG_KEY`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: FLUX_CONFIG_KEY.to_owned(),
        }
    }

    /// Service storing under `key`, e.g. one config per runtime.
    pub fn with_key(store: S, key: &str) -> Result<Self, ConfigError> {
        validate_key(key)?;
        Ok(Self {
            store,
            key: key.to_owned(),
        })
    }

    /// Key this service reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Stored config, or `None` when the blob is missing or empty.
    pub fn stored_flux_config(&self) -> Result<Option<FluxConfig>, ConfigError> {
        match self.store.read(&self.key)? {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| ConfigError::Decode {
                    key: self.key.clone(),
                    source,
                }),
            _ => Ok(None),
        }
    }

    /// Stored config; [`FluxConfig::default`] when nothing is stored.
    pub fn load_flux_config(&self) -> Result<FluxConfig, ConfigError> {
        if let Some(config) = self.stored_flux_config()? {
            debug!(key = %self.key, ?config, "loaded flux config");
            return Ok(config);
        }
        info!(key = %self.key, "no stored flux config; using defaults");
        Ok(FluxConfig::default())
    }

    /// Persists `config` as pretty-printed JSON.
    pub fn save_flux_config(&self, config: &FluxConfig) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(config).map_err(|source| ConfigError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.store.write(&self.key, &data)?;
        debug!(key = %self.key, "saved flux config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_restricted_to_file_safe_names() {
        assert!(validate_key("flux").is_ok());
        assert!(validate_key("todo-app_2").is_ok());
        for bad in ["", "Flux", "../flux", "a/b", "a.json", "a b"] {
            assert!(matches!(validate_key(bad), Err(ConfigError::InvalidKey(_))));
        }
    }
}

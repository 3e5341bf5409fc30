//! Config file loading.
//!
//! A vidladder config has five optional sections: `[server]`, `[storage]`,
//! `[encoder]`, `[store]` (with `[store.pinata]`) and a `[[ladder]]` array
//! that replaces the built-in rendition catalog when present. Every field has
//! a default, so an empty file is a valid config.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Variables prefixed `VIDLADDER_` override file values; nested keys use a
/// double underscore, e.g. `VIDLADDER_STORE__PINATA__API_KEY` keeps Pinata
/// credentials out of the file. The result is not validated; run
/// [`validate_config`](super::validate_config) before use.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("VIDLADDER_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

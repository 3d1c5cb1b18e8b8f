use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of the environment variables that override file settings.
const ENV_PREFIX: &str = "BOOKSHELF_";

/// Separator between nested keys in an override (`BOOKSHELF_LOADER__BATCH_SIZE`).
/// Single underscores stay part of the key name.
const ENV_NESTING: &str = "__";

/// Variables under the prefix that are not settings. `BOOKSHELF_CONFIG` names
/// the file itself.
const ENV_RESERVED: &[&str] = &["config"];

/// Load the TOML file at `path`, then apply `BOOKSHELF_*` overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    sources(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn sources(path: &Path) -> Figment {
    let overrides = Env::prefixed(ENV_PREFIX)
        .ignore(ENV_RESERVED)
        .split(ENV_NESTING);

    Figment::new().merge(Toml::file(path)).merge(overrides)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

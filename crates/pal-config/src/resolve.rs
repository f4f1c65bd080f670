//! Configuration resolution and path discovery.
//!
//! Resolution order: explicit path → environment variable → XDG path → defaults.

use std::path::{Path, PathBuf};

use crate::config::PalantirConfig;
use crate::validate::ValidationResult;

/// Where the configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided by the caller.
    Explicit,

    /// Set via `PALANTIR_CONFIG`.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit path"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A loaded, validated config and its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: PalantirConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Environment variable naming a config file.
pub const ENV_CONFIG_PATH: &str = "PALANTIR_CONFIG";

const CONFIG_FILENAME: &str = "palantir.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "palantir";

/// Locate the config file to use, if any.
///
/// 1. `explicit` (if it exists)
/// 2. `PALANTIR_CONFIG`
/// 3. `$XDG_CONFIG_HOME/palantir/palantir.toml`
/// 4. None (built-in defaults)
pub fn find_config(explicit: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = explicit {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::Explicit);
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Find, load, and validate the configuration.
pub fn resolve_config(explicit: Option<&Path>) -> ValidationResult<ResolvedConfig> {
    let (path, source) = find_config(explicit);
    let config = match &path {
        Some(p) => PalantirConfig::load(p)?,
        None => PalantirConfig::default(),
    };
    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}

/// Get the XDG config directory for palantir.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::Explicit), "explicit path");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(format!("{}", ConfigSource::BuiltinDefault), "builtin default");
    }

    #[test]
    fn test_xdg_dir_ends_with_app_name() {
        if let Some(dir) = xdg_config_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}

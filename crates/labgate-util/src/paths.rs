//! Default paths for labgate components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/labgate/config.toml` or `~/.config/labgate/config.toml`
//! - Data: `$XDG_DATA_HOME/labgate` or `~/.local/share/labgate`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const LABGATE_CONFIG_ENV: &str = "LABGATE_CONFIG";

/// Environment variable for overriding the data directory
pub const LABGATE_DATA_DIR_ENV: &str = "LABGATE_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "labgate";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const STORE_FILENAME: &str = "labgate.db";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$LABGATE_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/labgate/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/labgate/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(LABGATE_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// `$LABGATE_DATA_DIR` is not consulted here; the CLI applies it as an
/// override on top of the configured value.
pub fn default_data_dir() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_contains_labgate() {
        let path = default_data_dir();
        assert!(path.to_string_lossy().contains("labgate"));
    }

    #[test]
    fn config_path_ends_with_toml() {
        let path = default_config_path();
        assert!(path.to_string_lossy().ends_with(".toml"));
    }
}

//! Default paths for authwatch components
//!
//! - Config: `$AUTHWATCH_CONFIG`, `$XDG_CONFIG_HOME/authwatch/config.toml`
//!   or `~/.config/authwatch/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const AUTHWATCH_CONFIG_ENV: &str = "AUTHWATCH_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "authwatch";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$AUTHWATCH_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/authwatch/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/authwatch/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(AUTHWATCH_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_dir().join(CONFIG_FILENAME)
}

/// Get the config directory without checking AUTHWATCH_CONFIG.
pub fn config_dir() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_contains_app_name() {
        let dir = config_dir();
        assert!(dir.to_string_lossy().contains("authwatch"));
    }

    #[test]
    fn default_config_path_is_toml() {
        let path = default_config_path();
        if std::env::var(AUTHWATCH_CONFIG_ENV).is_err() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
            assert_eq!(path.parent().unwrap(), config_dir());
        }
    }
}

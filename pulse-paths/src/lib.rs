//! XDG Base Directory paths for pulse.
//!
//! The CLI resolves its user-level configuration through XDG paths on every
//! platform, the same way tools like gh and kubectl do.

use std::path::PathBuf;

/// File name of the pulse configuration file inside any config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the pulse config directory.
///
/// Returns `$XDG_CONFIG_HOME/pulse` if set, otherwise `~/.config/pulse`.
///
/// # Examples
///
/// ```
/// use pulse_paths::config_dir;
///
/// let config = config_dir();
/// assert!(config.ends_with("pulse"));
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("pulse")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/pulse")
    } else {
        PathBuf::from(".config/pulse")
    }
}

/// Path of the user-level config file (`<config_dir>/config.toml`).
pub fn user_config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

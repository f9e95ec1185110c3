//! User configuration for document sessions.
//!
//! Read from `$XDG_CONFIG_HOME/redline/config.toml` (falling back to
//! `~/.config/redline/config.toml`). Every key is optional:
//!
//! ```toml
//! comments = "pending-only"   # or "open"
//! default_sort = "oldest"     # "newest" | "oldest" | "type"
//! event_capacity = 512
//! ```

use std::path::{Path, PathBuf};

use redline_core::{CommentPolicy, SortOrder, SuggestionQuery};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Settings applied to every session opened from this config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedlineConfig {
    /// Whether resolved suggestions still accept comments.
    pub comments: CommentPolicy,
    /// Sort order of [`RedlineConfig::default_query`].
    pub default_sort: SortOrder,
    /// Buffer size of the change-notification channel per session.
    pub event_capacity: usize,
}

impl Default for RedlineConfig {
    fn default() -> Self {
        Self {
            comments: CommentPolicy::Open,
            default_sort: SortOrder::Newest,
            event_capacity: 256,
        }
    }
}

const APP_DIR: &str = "redline";
const FILE_NAME: &str = "config.toml";

/// Base directory for user configuration.
///
/// An unset or empty `$XDG_CONFIG_HOME` falls through to `$HOME/.config`,
/// and with no usable `$HOME` to a relative `.config`.
fn config_home() -> PathBuf {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => match std::env::var_os("HOME") {
            Some(home) if !home.is_empty() => Path::new(&home).join(".config"),
            _ => PathBuf::from(".config"),
        },
    }
}

impl RedlineConfig {
    /// Where [`RedlineConfig::load`] looks: `<config home>/redline/config.toml`.
    pub fn default_path() -> PathBuf {
        config_home().join(APP_DIR).join(FILE_NAME)
    }

    /// Loads the config from [`RedlineConfig::default_path`].
    ///
    /// Never fails: a missing file yields defaults, an unreadable or malformed
    /// file is logged and also yields defaults.
    pub fn load() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Loads the config from `path`.
    ///
    /// # Errors
    ///
    /// [`SessionError::ConfigRead`] if the file cannot be read,
    /// [`SessionError::ConfigParse`] if it is not valid config TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SessionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SessionError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An unfiltered query in the configured sort order.
    pub fn default_query(&self) -> SuggestionQuery {
        SuggestionQuery::new().sort(self.default_sort)
    }
}

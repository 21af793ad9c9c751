//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::loader::ConfigError;

/// What to do when a directory inside a monitor root cannot be watched
/// during the initial walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchErrorPolicy {
    /// Any registration failure aborts startup.
    #[default]
    Strict,
    /// Log and skip the directory. The monitor root itself must still
    /// register.
    BestEffort,
}

/// One watched root: where to watch, what to ignore, what to run.
///
/// Immutable after load; each monitor gets its own watcher task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    /// Root directory of the watched tree.
    pub directory: PathBuf,
    /// Glob patterns matched against individual path segments.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Command to run on change, program first.
    pub action: Vec<String>,
    /// Registration failure policy for the initial walk.
    #[serde(default)]
    pub on_watch_error: WatchErrorPolicy,
}

/// Full configuration: one monitor per watched root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Watched roots.
    #[serde(default)]
    pub monitor: Vec<Monitor>,
}

impl Config {
    /// Pre-flight validation.
    ///
    /// # Errors
    ///
    /// Rejects a configuration with no monitors, an empty action argv, or
    /// duplicate/nested monitor roots (nested roots would deliver the same
    /// events to two watchers).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.is_empty() {
            return Err(ConfigError::NoMonitors);
        }
        for monitor in &self.monitor {
            if monitor.action.is_empty() {
                return Err(ConfigError::EmptyAction {
                    directory: monitor.directory.clone(),
                });
            }
        }
        for (i, a) in self.monitor.iter().enumerate() {
            for b in &self.monitor[i + 1..] {
                if a.directory == b.directory {
                    return Err(ConfigError::DuplicateRoot {
                        directory: a.directory.clone(),
                    });
                }
                if b.directory.starts_with(&a.directory) {
                    return Err(ConfigError::OverlappingRoots {
                        outer: a.directory.clone(),
                        inner: b.directory.clone(),
                    });
                }
                if a.directory.starts_with(&b.directory) {
                    return Err(ConfigError::OverlappingRoots {
                        outer: b.directory.clone(),
                        inner: a.directory.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

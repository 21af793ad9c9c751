//! The set of watched directories for one monitor.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use walkdir::WalkDir;

use crate::config::WatchErrorPolicy;

use super::error::WatcherError;
use super::exclude::ExcludeRules;

/// Registration seam between the directory set and the OS watch primitive.
///
/// One registration covers exactly one directory level; recursion is managed
/// by the set, not by the OS.
pub trait WatchRegistry {
    /// Register a change-notification subscription for one directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses the subscription.
    fn register(&mut self, dir: &Path) -> Result<(), WatcherError>;

    /// Drop the subscription for one directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be removed.
    fn unregister(&mut self, dir: &Path) -> Result<(), WatcherError>;
}

impl WatchRegistry for RecommendedWatcher {
    fn register(&mut self, dir: &Path) -> Result<(), WatcherError> {
        self.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unregister(&mut self, dir: &Path) -> Result<(), WatcherError> {
        self.unwatch(dir)?;
        Ok(())
    }
}

/// The directories currently watched for one monitor root.
///
/// Invariant: a path is in the set exactly when a subscription is registered
/// for it. Owned and mutated by a single watcher thread only; never shared.
#[derive(Debug, Default)]
pub struct WatchedDirs {
    dirs: HashSet<PathBuf>,
}

impl WatchedDirs {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` is currently watched.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    /// Number of watched directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Whether nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Walk the tree under `root` and register every non-excluded directory.
    ///
    /// Excluded directories are skipped without descending into them.
    /// Regular files are never registered. Unreadable entries below the root
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Failure to walk or register `root` itself is always an error; for
    /// directories beneath it, `policy` decides between propagating the
    /// failure and skipping the directory.
    pub fn add_subtree(
        &mut self,
        root: &Path,
        rules: &ExcludeRules,
        registry: &mut dyn WatchRegistry,
        policy: WatchErrorPolicy,
    ) -> Result<(), WatcherError> {
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !rules.is_excluded(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            match registry.register(path) {
                Ok(()) => {
                    self.dirs.insert(path.to_path_buf());
                    tracing::info!(path = %path.display(), "Watching");
                }
                Err(e) if entry.depth() == 0 || policy == WatchErrorPolicy::Strict => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Unable to watch, skipping");
                }
            }
        }
        Ok(())
    }

    /// Remove `root` and every watched strict descendant of it.
    ///
    /// No-op when `root` is not watched. Unregister failures are ignored;
    /// for a removed tree the OS side is usually gone already.
    pub fn remove_subtree(&mut self, root: &Path, registry: &mut dyn WatchRegistry) {
        if !self.dirs.remove(root) {
            return;
        }
        let _ = registry.unregister(root);
        tracing::info!(path = %root.display(), "No longer watching");

        let descendants: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect();
        for path in descendants {
            self.dirs.remove(&path);
            let _ = registry.unregister(&path);
            tracing::info!(path = %path.display(), "No longer watching");
        }
    }
}

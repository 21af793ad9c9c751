//! Per-monitor tree watcher.

use std::sync::mpsc as std_mpsc;
use std::thread;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use crate::action::ActionRequest;
use crate::config::{Monitor, WatchErrorPolicy};

use super::directory_set::{WatchRegistry, WatchedDirs};
use super::error::WatcherError;
use super::event::{ChangeEvent, ChangeKind};
use super::exclude::ExcludeRules;

/// Watches one monitor root.
///
/// Maintains the per-directory subscriptions as the tree evolves and emits
/// one action request per qualifying change event. The directory set is
/// owned here and only ever touched from the watcher's own thread.
pub struct TreeWatcher<R: WatchRegistry> {
    monitor: Monitor,
    rules: ExcludeRules,
    dirs: WatchedDirs,
    registry: R,
}

impl<R: WatchRegistry> TreeWatcher<R> {
    /// Build a watcher over an explicit registry and walk the monitor root.
    ///
    /// # Errors
    ///
    /// Fails if the root cannot be walked or registered, or, under the
    /// strict policy, if any directory beneath it cannot be registered.
    pub fn with_registry(monitor: Monitor, registry: R) -> Result<Self, WatcherError> {
        let rules = ExcludeRules::new(&monitor.exclude);
        let mut watcher = Self {
            monitor,
            rules,
            dirs: WatchedDirs::new(),
            registry,
        };
        let root = watcher.monitor.directory.clone();
        watcher.dirs.add_subtree(
            &root,
            &watcher.rules,
            &mut watcher.registry,
            watcher.monitor.on_watch_error,
        )?;
        Ok(watcher)
    }

    /// Handle one change event, returning the action to enqueue, if any.
    ///
    /// Excluded paths are discarded outright. A created directory gets its
    /// whole subtree walked (covering trees moved in with contents); a
    /// removed or renamed-away watched directory gets its subtree pruned.
    pub fn handle_event(&mut self, event: &ChangeEvent) -> Option<ActionRequest> {
        if self.rules.is_excluded(&event.path) {
            return None;
        }
        tracing::debug!(path = %event.path.display(), kind = ?event.kind, "Change event");

        // The is_dir check is a point-in-time stat; a path gone by now is
        // treated as a non-directory.
        if event.kind == ChangeKind::Create && event.path.is_dir() {
            // Past startup a registration failure never takes the process
            // down, whatever the configured policy.
            if let Err(e) = self.dirs.add_subtree(
                &event.path,
                &self.rules,
                &mut self.registry,
                WatchErrorPolicy::BestEffort,
            ) {
                tracing::warn!(path = %event.path.display(), error = %e, "Unable to watch new directory");
            }
        }

        if matches!(event.kind, ChangeKind::Remove | ChangeKind::Rename)
            && self.dirs.contains(&event.path)
        {
            self.dirs.remove_subtree(&event.path, &mut self.registry);
        }

        Some(ActionRequest {
            argv: self.monitor.action.clone(),
            working_dir: self.monitor.directory.clone(),
        })
    }

    /// The directories currently watched.
    #[must_use]
    pub fn watched(&self) -> &WatchedDirs {
        &self.dirs
    }
}

impl TreeWatcher<RecommendedWatcher> {
    /// Create the OS watcher for `monitor`, walk its root, and run the event
    /// loop on a dedicated thread until the subscription is torn down.
    ///
    /// # Errors
    ///
    /// Fails if the OS watcher cannot be created or the initial walk fails;
    /// both are startup-fatal for the monitor.
    pub fn spawn(
        monitor: Monitor,
        actions: mpsc::Sender<ActionRequest>,
    ) -> Result<thread::JoinHandle<()>, WatcherError> {
        let (notify_tx, notify_rx) = std_mpsc::channel();
        let registry = notify::recommended_watcher(move |result| {
            let _ = notify_tx.send(result);
        })?;

        let watcher = Self::with_registry(monitor, registry)?;
        let name = format!("watch:{}", watcher.monitor.directory.display());
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || watcher.event_loop(&notify_rx, &actions))?;
        Ok(handle)
    }

    /// Consume bridged notify results until the channel disconnects.
    ///
    /// Watch errors are logged and the loop continues; only the channel
    /// closing (the watcher being torn down) ends it. A full action channel
    /// blocks here, stalling this monitor until the dispatcher catches up.
    fn event_loop(
        mut self,
        notify_rx: &std_mpsc::Receiver<notify::Result<notify::Event>>,
        actions: &mpsc::Sender<ActionRequest>,
    ) {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    for change in ChangeEvent::from_notify(event) {
                        if change.kind == ChangeKind::Other {
                            continue;
                        }
                        let Some(request) = self.handle_event(&change) else {
                            continue;
                        };
                        if actions.blocking_send(request).is_err() {
                            // Dispatcher is gone; nothing left to feed.
                            return;
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Watch error"),
            }
        }
        tracing::info!(root = %self.monitor.directory.display(), "Watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct NullRegistry;

    impl WatchRegistry for NullRegistry {
        fn register(&mut self, _dir: &Path) -> Result<(), WatcherError> {
            Ok(())
        }

        fn unregister(&mut self, _dir: &Path) -> Result<(), WatcherError> {
            Ok(())
        }
    }

    fn monitor(root: &Path, exclude: &[&str]) -> Monitor {
        Monitor {
            directory: root.to_path_buf(),
            exclude: exclude.iter().map(|s| (*s).to_string()).collect(),
            action: vec!["echo".to_string(), "hi".to_string()],
            on_watch_error: WatchErrorPolicy::Strict,
        }
    }

    fn event(path: impl Into<std::path::PathBuf>, kind: ChangeKind) -> ChangeEvent {
        ChangeEvent {
            path: path.into(),
            kind,
        }
    }

    #[test]
    fn test_initial_walk_covers_subdirectories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/inner")).unwrap();
        fs::create_dir_all(temp.path().join(".git/objects")).unwrap();

        let watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[".git"]), NullRegistry).unwrap();

        assert!(watcher.watched().contains(temp.path()));
        assert!(watcher.watched().contains(&temp.path().join("src")));
        assert!(watcher.watched().contains(&temp.path().join("src/inner")));
        assert!(!watcher.watched().contains(&temp.path().join(".git")));
        assert_eq!(watcher.watched().len(), 3);
    }

    #[test]
    fn test_write_event_emits_one_action() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();

        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[]), NullRegistry).unwrap();

        let request = watcher
            .handle_event(&event(temp.path().join("src/main.txt"), ChangeKind::Write))
            .expect("non-excluded write should produce an action");
        assert_eq!(request.argv, vec!["echo", "hi"]);
        assert_eq!(request.working_dir, temp.path());
    }

    #[test]
    fn test_excluded_event_is_discarded() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();

        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[".git"]), NullRegistry).unwrap();

        let result = watcher.handle_event(&event(
            temp.path().join(".git/objects/ab"),
            ChangeKind::Write,
        ));
        assert!(result.is_none());
    }

    #[test]
    fn test_created_directory_extends_the_watch() {
        let temp = TempDir::new().unwrap();
        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[]), NullRegistry).unwrap();
        assert_eq!(watcher.watched().len(), 1);

        // Simulate a tree moved in with pre-existing contents.
        fs::create_dir_all(temp.path().join("newdir/nested")).unwrap();

        let request = watcher.handle_event(&event(temp.path().join("newdir"), ChangeKind::Create));
        assert!(request.is_some());
        assert!(watcher.watched().contains(&temp.path().join("newdir")));
        assert!(watcher.watched().contains(&temp.path().join("newdir/nested")));
    }

    #[test]
    fn test_created_file_does_not_extend_the_watch() {
        let temp = TempDir::new().unwrap();
        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[]), NullRegistry).unwrap();

        fs::write(temp.path().join("note.txt"), "x").unwrap();

        let request = watcher.handle_event(&event(temp.path().join("note.txt"), ChangeKind::Create));
        assert!(request.is_some());
        assert_eq!(watcher.watched().len(), 1);
    }

    #[test]
    fn test_remove_event_prunes_the_subtree() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/sub")).unwrap();

        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[]), NullRegistry).unwrap();
        assert_eq!(watcher.watched().len(), 3);

        let request = watcher.handle_event(&event(temp.path().join("src"), ChangeKind::Remove));
        assert!(request.is_some());
        assert!(!watcher.watched().contains(&temp.path().join("src")));
        assert!(!watcher.watched().contains(&temp.path().join("src/sub")));
        assert!(watcher.watched().contains(temp.path()));
    }

    #[test]
    fn test_rename_event_prunes_like_remove() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();

        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[]), NullRegistry).unwrap();

        watcher.handle_event(&event(temp.path().join("src"), ChangeKind::Rename));
        assert!(!watcher.watched().contains(&temp.path().join("src")));
    }

    #[test]
    fn test_remove_of_unwatched_path_still_emits_action() {
        let temp = TempDir::new().unwrap();
        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[]), NullRegistry).unwrap();

        // A removed file is not a watched directory; the set is untouched
        // but the action still fires.
        let request = watcher.handle_event(&event(temp.path().join("gone.txt"), ChangeKind::Remove));
        assert!(request.is_some());
        assert_eq!(watcher.watched().len(), 1);
    }

    #[test]
    fn test_chmod_event_emits_action_without_side_effects() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();

        let mut watcher =
            TreeWatcher::with_registry(monitor(temp.path(), &[]), NullRegistry).unwrap();

        let request = watcher.handle_event(&event(temp.path().join("src"), ChangeKind::Chmod));
        assert!(request.is_some());
        assert_eq!(watcher.watched().len(), 2);
    }

    #[test]
    fn test_missing_root_fails_startup() {
        let result = TreeWatcher::with_registry(
            monitor(Path::new("/treewatch/nonexistent/root/12345"), &[]),
            NullRegistry,
        );
        assert!(result.is_err());
    }
}

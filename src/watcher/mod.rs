//! Recursive directory-watch management.
//!
//! The OS notification primitive watches a single directory level, so
//! recursion is managed here: each monitor keeps a registry of watched
//! directories, walks new subtrees into it as they appear, and prunes
//! subtrees that are removed or renamed away. Exclusion rules apply to
//! whole subtrees.

mod directory_set;
mod error;
mod event;
mod exclude;
mod tree_watcher;

pub use directory_set::{WatchRegistry, WatchedDirs};
pub use error::WatcherError;
pub use event::{ChangeEvent, ChangeKind};
pub use exclude::ExcludeRules;
pub use tree_watcher::TreeWatcher;

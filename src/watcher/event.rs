//! Normalized change events.

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// The kinds of change the watch loop reacts to.
///
/// `Other` covers notification kinds outside this model (access events and
/// the like); the loop drops them before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A path appeared, including one renamed or moved in.
    Create,
    /// File contents changed.
    Write,
    /// A path was deleted.
    Remove,
    /// A path was renamed or moved away.
    Rename,
    /// Metadata changed.
    Chmod,
    /// Anything else.
    Other,
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Create,
            // A rename target is a path appearing, so moved-in trees get the
            // same subtree walk a created directory does.
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Self::Create,
            EventKind::Modify(ModifyKind::Name(_)) => Self::Rename,
            EventKind::Modify(ModifyKind::Metadata(_)) => Self::Chmod,
            EventKind::Modify(_) => Self::Write,
            EventKind::Remove(_) => Self::Remove,
            _ => Self::Other,
        }
    }
}

/// One change notification for one path. Transient, consumed immediately.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The affected path.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Split a notify event into one `ChangeEvent` per affected path.
    pub fn from_notify(event: notify::Event) -> impl Iterator<Item = Self> {
        let kind = ChangeKind::from(&event.kind);
        event.paths.into_iter().map(move |path| Self { path, kind })
    }
}

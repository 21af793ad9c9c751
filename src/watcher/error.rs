//! Watcher error types.

/// Errors that can occur while building or maintaining a directory watch.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// The OS notification backend rejected an operation.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// A directory tree could not be walked.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

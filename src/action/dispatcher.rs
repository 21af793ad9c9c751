//! Serialized action execution.

use tokio::sync::mpsc;

use crate::display;

use super::{runner, ActionRequest};

/// Capacity of the shared action channel.
///
/// Kept minimal so a slow command backpressures every watcher instead of
/// queueing an unbounded pile of duplicate requests.
pub const ACTION_CHANNEL_CAPACITY: usize = 1;

/// Single consumer that executes requests from all watchers one at a time,
/// in receipt order. No two commands ever run concurrently.
pub struct ActionDispatcher {
    rx: mpsc::Receiver<ActionRequest>,
}

impl ActionDispatcher {
    /// Create the dispatcher and the sender side handed to the watchers.
    #[must_use]
    pub fn new() -> (mpsc::Sender<ActionRequest>, Self) {
        let (tx, rx) = mpsc::channel(ACTION_CHANNEL_CAPACITY);
        (tx, Self { rx })
    }

    /// Consume requests until every sender is gone.
    ///
    /// Captured output is always flushed to stdout; spawn failures and
    /// non-zero exits are logged and the loop continues.
    pub async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            display::print_action_start(&request.argv, &request.working_dir);
            match runner::run_command(&request).await {
                Ok(output) => {
                    display::print_command_output(&output.combined);
                    if output.success() {
                        tracing::debug!(argv = ?request.argv, "Action completed");
                    } else {
                        tracing::warn!(
                            argv = ?request.argv,
                            status = %output.status,
                            "Action exited with failure"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(argv = ?request.argv, error = %e, "Unable to run action");
                }
            }
        }
        tracing::info!("Action dispatcher stopped");
    }
}

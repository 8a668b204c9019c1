//! Run status: the lifecycle of a process instance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one process run, distinct from the workflow's own states.
///
/// `Pending → Running ↔ Paused → {Completed | Failed | Cancelled}`.
/// The three right-hand statuses are terminal: every state-changing entry
/// point rejects them with a specific error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Created but not started.
    Pending,
    /// Actively accepting events.
    Running,
    /// Temporarily suspended; resumable.
    Paused,
    /// Reached a final state.
    Completed,
    /// Stopped by an execution error.
    Failed,
    /// Stopped by a caller's cancel.
    Cancelled,
}

impl RunStatus {
    /// Whether the run can never advance again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the run has started and not yet finished.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

//! Runtime errors for process instances.

use crate::engine::status::RunStatus;
use crate::model::{HookError, StepError};
use thiserror::Error;

/// Errors returned by the state-changing entry points of a
/// [`ProcessInstance`](crate::engine::ProcessInstance).
///
/// Run-state errors (`AlreadyStarted`, `NotStarted`, `Paused`, `NotPaused`,
/// `Finished`) are returned immediately without mutating the run. Lookup
/// errors (`UnknownState`, `ReservedEvent`, `NoTransition`, `NoneAdmitted`)
/// likewise leave the run untouched. Execution errors (`StepFailed`,
/// `HookFailed`, `ActionFailed`) move the run to `Failed` and are also
/// stored as the instance's last error.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process has already been started")]
    AlreadyStarted,

    #[error("process has not been started")]
    NotStarted,

    #[error("process is paused")]
    Paused,

    #[error("process is not paused")]
    NotPaused,

    #[error("process already finished with status '{0}'")]
    Finished(RunStatus),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("event name '{0}' is reserved")]
    ReservedEvent(String),

    #[error("no transition from state '{state}' for event '{event}'")]
    NoTransition { state: String, event: String },

    #[error("no transition from state '{state}' admitted event '{event}'")]
    NoneAdmitted { state: String, event: String },

    #[error("entry step '{step}' failed in state '{state}': {source}")]
    StepFailed {
        state: String,
        step: String,
        source: StepError,
    },

    #[error("{phase} hook failed in state '{state}': {source}")]
    HookFailed {
        state: String,
        phase: &'static str,
        source: HookError,
    },

    #[error("action failed on transition '{from}' -> '{to}' ({event}): {source}")]
    ActionFailed {
        from: String,
        to: String,
        event: String,
        source: HookError,
    },

    #[error("process stalled in non-terminal state '{0}'")]
    Stalled(String),
}

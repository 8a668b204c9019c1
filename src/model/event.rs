//! Notification events published to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One notification delivered to every subscriber of a process instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessEvent {
    /// The instance the event belongs to.
    pub process_id: Uuid,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub kind: EventKind,
}

/// Lifecycle, state, transition, and error notifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The run started; `state` is the selected initial state.
    Started { state: String },
    /// A state was entered and its entry behavior completed.
    StateEntered { state: String },
    /// A state's exit behavior completed.
    StateExited { state: String },
    /// A transition executed.
    TransitionTaken {
        from: String,
        to: String,
        event: String,
    },
    /// The run was paused.
    Paused,
    /// The run resumed.
    Resumed,
    /// The run was cancelled.
    Cancelled,
    /// The run entered a final state.
    Completed { final_state: String },
    /// The run failed with an execution error.
    Failed { error: String },
}

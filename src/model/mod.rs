//! Passive data model: states, transitions, run data, history, and events.
//!
//! Everything here is a value type with no behavior beyond accessors.
//! The definition builder assembles these into an immutable
//! [`ProcessDefinition`](crate::definition::ProcessDefinition); the engine
//! in [`engine`](crate::engine) drives them at runtime.

mod data;
mod event;
mod record;
mod state;
mod step;
mod transition;

pub use data::ProcessData;
pub use event::{EventKind, ProcessEvent};
pub use record::{ExecutionLog, ExecutionRecord, RecordKind};
pub use state::{Hook, HookError, StateNode};
pub use step::{FnStep, Step, StepError};
pub use transition::{Action, Guard, Transition, AUTO_EVENT};

//! Procflow: a deterministic state-machine engine for multi-step workflows.
//!
//! A workflow is defined once as an immutable graph of named states and
//! guarded, prioritized transitions, then executed any number of times as
//! independent process instances. Instances advance synchronously inside
//! the caller's thread, tolerate concurrent access from many threads, and
//! report progress through subscriber notifications and a bounded
//! execution history.
//!
//! # Core Concepts
//!
//! - **Definition**: validated, immutable graph built with
//!   [`DefinitionBuilder`], shared across instances via `Arc`
//! - **Instance**: one concurrently-accessible run with its own status,
//!   current state, shared data, and history
//! - **Guards**: pure admission predicates, each evaluated at most once
//!   per dispatch
//! - **Auto-transitions**: transitions that cascade without an external
//!   event whenever their guard admits after a state entry
//!
//! # Example
//!
//! ```rust
//! use procflow::definition::DefinitionBuilder;
//! use procflow::model::{StateNode, Transition};
//! use procflow::runner::ProcessInput;
//!
//! let definition = DefinitionBuilder::new()
//!     .add_state(StateNode::new("pending").initial())
//!     .add_state(StateNode::new("processing"))
//!     .add_state(StateNode::new("completed").terminal())
//!     .add_transition(Transition::new("pending", "process", "processing"))
//!     .add_transition(Transition::new("processing", "complete", "completed"))
//!     .build()
//!     .unwrap();
//!
//! let instance = definition.instance();
//! instance.start(ProcessInput::new()).unwrap();
//! instance.send_event("process").unwrap();
//! instance.send_event("complete").unwrap();
//!
//! assert_eq!(instance.current_state().as_deref(), Some("completed"));
//! ```

pub mod definition;
pub mod engine;
pub mod model;
pub mod runner;

// Re-export commonly used types
pub use definition::{BuildError, DefinitionBuilder, ProcessDefinition, RunOptions};
pub use engine::{EventHandler, ProcessError, ProcessInstance, RunStatus};
pub use model::{
    EventKind, ExecutionRecord, FnStep, Guard, ProcessData, ProcessEvent, RecordKind, StateNode,
    Step, StepError, Transition, AUTO_EVENT,
};
pub use runner::{run, run_batch, run_stream, ProcessInput, ProcessOutput};

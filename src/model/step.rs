//! The `Step` trait: executable units bound to state entry.
//!
//! Steps are external collaborators. The engine calls them synchronously
//! while entering a state and stores each output in `ProcessData`, keyed by
//! the step's identity. A step failure aborts the entry and moves the run
//! to `Failed`.

use crate::model::data::ProcessData;
use serde_json::Value;
use thiserror::Error;

/// Error returned by a failing step.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StepError {
    message: String,
}

impl StepError {
    /// Create a step error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An executable unit run when a state is entered.
///
/// Implementations must be thread-safe: the engine invokes `execute` from
/// whichever caller thread drove the transition, while read accessors may
/// run concurrently from other threads.
pub trait Step: Send + Sync {
    /// Stable identity used to key this step's output in `ProcessData`.
    fn id(&self) -> &str;

    /// Run the step against the shared run data.
    fn execute(&self, data: &mut ProcessData) -> Result<Value, StepError>;
}

/// A `Step` built from a closure. The usual way to define steps in tests
/// and small workflows.
///
/// # Example
///
/// ```rust
/// use procflow::model::{FnStep, ProcessData, Step};
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let step = FnStep::new("tally", |data| {
///     let count = data.variables().len();
///     Ok(json!(count))
/// });
///
/// let mut data = ProcessData::new(HashMap::new());
/// assert_eq!(step.execute(&mut data).unwrap(), json!(0));
/// ```
pub struct FnStep {
    id: String,
    func: Box<dyn Fn(&mut ProcessData) -> Result<Value, StepError> + Send + Sync>,
}

impl FnStep {
    /// Wrap a closure as a step with the given identity.
    pub fn new<F>(id: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut ProcessData) -> Result<Value, StepError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            func: Box::new(func),
        }
    }
}

impl Step for FnStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn execute(&self, data: &mut ProcessData) -> Result<Value, StepError> {
        (self.func)(data)
    }
}

//! Shared run data for a single process instance.
//!
//! `ProcessData` is the mutable bag of values that guards, actions, hooks,
//! and entry steps read and write while a process runs. It is owned by
//! exactly one `ProcessInstance` and guarded by that instance's data lock,
//! so user callbacks never need their own synchronization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Mutable run state shared between guards, actions, hooks, and steps.
///
/// The `input` map is a snapshot taken at `start` and is read-only for the
/// rest of the run. `variables` is freely read/write. `step_outputs` is
/// written by the engine after each entry step completes, keyed by the
/// step's identity.
///
/// `Clone` performs a deep value copy, so a cloned `ProcessData` is a fully
/// independent snapshot that callers can inspect without holding any lock.
///
/// # Example
///
/// ```rust
/// use procflow::model::ProcessData;
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// let mut input = HashMap::new();
/// input.insert("order_id".to_string(), json!("ord-42"));
///
/// let mut data = ProcessData::new(input);
/// data.set_var("attempts", json!(1));
///
/// assert_eq!(data.input().get("order_id"), Some(&json!("ord-42")));
/// assert_eq!(data.get_var("attempts"), Some(&json!(1)));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessData {
    input: HashMap<String, Value>,
    variables: HashMap<String, Value>,
    step_outputs: HashMap<String, Value>,
}

impl ProcessData {
    /// Create run data from an input snapshot.
    pub fn new(input: HashMap<String, Value>) -> Self {
        Self {
            input,
            variables: HashMap::new(),
            step_outputs: HashMap::new(),
        }
    }

    /// The read-only input snapshot captured at `start`.
    pub fn input(&self) -> &HashMap<String, Value> {
        &self.input
    }

    /// Look up a single input value.
    pub fn get_input(&self, key: &str) -> Option<&Value> {
        self.input.get(key)
    }

    /// All run variables.
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    /// Look up a run variable.
    pub fn get_var(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Set a run variable, returning the previous value if any.
    pub fn set_var(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.variables.insert(key.into(), value)
    }

    /// Remove a run variable, returning it if present.
    pub fn remove_var(&mut self, key: &str) -> Option<Value> {
        self.variables.remove(key)
    }

    /// All step outputs recorded so far, keyed by step identity.
    pub fn step_outputs(&self) -> &HashMap<String, Value> {
        &self.step_outputs
    }

    /// The output of one step, if it has run.
    pub fn step_output(&self, step_id: &str) -> Option<&Value> {
        self.step_outputs.get(step_id)
    }

    /// Record the output of a completed step. Called by the engine after
    /// every successful entry-step execution.
    pub fn record_step_output(&mut self, step_id: impl Into<String>, output: Value) {
        self.step_outputs.insert(step_id.into(), output);
    }
}

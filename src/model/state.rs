//! Workflow states: named nodes in the definition graph.

use crate::model::data::ProcessData;
use crate::model::step::Step;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a failing enter/exit hook or transition action.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Create a hook error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Callback run on state entry or exit. May read and write the shared run
/// data; a returned error moves the run to `Failed`.
pub type Hook = Arc<dyn Fn(&mut ProcessData) -> Result<(), HookError> + Send + Sync>;

/// A named node in the workflow graph.
///
/// States are identified by their unique name within a definition. Exactly
/// one state per definition is initial and at least one is final; the
/// builder enforces both at `build()`. A state may carry one optional entry
/// step plus enter/exit hooks. All fields are frozen once the definition is
/// built; entry behavior may mutate run data, but never the state itself.
///
/// # Example
///
/// ```rust
/// use procflow::model::StateNode;
///
/// let state = StateNode::new("review").terminal();
/// assert_eq!(state.name(), "review");
/// assert!(state.is_final());
/// assert!(!state.is_initial());
/// ```
pub struct StateNode {
    name: String,
    is_initial: bool,
    is_final: bool,
    entry_step: Option<Arc<dyn Step>>,
    on_enter: Option<Hook>,
    on_exit: Option<Hook>,
    metadata: HashMap<String, Value>,
}

impl StateNode {
    /// Create a plain, non-initial, non-final state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_initial: false,
            is_final: false,
            entry_step: None,
            on_enter: None,
            on_exit: None,
            metadata: HashMap::new(),
        }
    }

    /// Mark this state as the definition's initial state.
    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    /// Mark this state as a final (terminal) state. Entering it completes
    /// the run.
    pub fn terminal(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Bind an entry step, executed whenever this state is entered.
    pub fn with_entry_step(mut self, step: Arc<dyn Step>) -> Self {
        self.entry_step = Some(step);
        self
    }

    /// Register a callback run before the entry step when this state is
    /// entered.
    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ProcessData) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_enter = Some(Arc::new(hook));
        self
    }

    /// Register a callback run when a transition leaves this state.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ProcessData) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_exit = Some(Arc::new(hook));
        self
    }

    /// Attach a free-form metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The state's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the definition's initial state.
    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    /// Whether entering this state completes the run.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// The entry step bound to this state, if any.
    pub fn entry_step(&self) -> Option<&Arc<dyn Step>> {
        self.entry_step.as_ref()
    }

    /// The enter hook, if any.
    pub fn enter_hook(&self) -> Option<&Hook> {
        self.on_enter.as_ref()
    }

    /// The exit hook, if any.
    pub fn exit_hook(&self) -> Option<&Hook> {
        self.on_exit.as_ref()
    }

    /// Free-form metadata attached at build time.
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub(crate) fn set_entry_step(&mut self, step: Arc<dyn Step>) {
        self.entry_step = Some(step);
    }
}

impl fmt::Debug for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateNode")
            .field("name", &self.name)
            .field("is_initial", &self.is_initial)
            .field("is_final", &self.is_final)
            .field("has_entry_step", &self.entry_step.is_some())
            .field("has_on_enter", &self.on_enter.is_some())
            .field("has_on_exit", &self.on_exit.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

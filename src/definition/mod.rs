//! Immutable process definitions: the validated graph of states and
//! transitions plus run-wide options.
//!
//! A definition is built once via [`DefinitionBuilder`] and may back many
//! concurrent [`ProcessInstance`](crate::engine::ProcessInstance)s; nothing
//! in it changes after a successful `build()`.

mod builder;
mod error;

pub use builder::DefinitionBuilder;
pub use error::BuildError;

use crate::engine::ProcessInstance;
use crate::model::{StateNode, Transition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Run-wide options attached to a definition.
///
/// Only `history_limit` is enforced by the engine. The remaining fields are
/// reserved: they are recorded on the definition but not read by the core.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Maximum number of execution records retained per instance; oldest
    /// records are discarded first.
    pub history_limit: usize,
    /// Reserved. Recorded but not enforced.
    pub max_execution_time: Option<Duration>,
    /// Reserved. Recorded but not enforced.
    pub max_steps: Option<usize>,
    /// Reserved. Recorded but not enforced.
    pub checkpoint_interval: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            history_limit: 1000,
            max_execution_time: None,
            max_steps: None,
            checkpoint_interval: None,
        }
    }
}

/// An immutable, validated workflow graph.
///
/// Holds the full set of states and transitions plus run options. Exactly
/// one state is initial and at least one is final. Share it across
/// instances with [`Arc`]; the definition itself is read-only.
#[derive(Debug)]
pub struct ProcessDefinition {
    states: HashMap<String, Arc<StateNode>>,
    transitions: Vec<Arc<Transition>>,
    initial: String,
    options: RunOptions,
}

impl ProcessDefinition {
    pub(crate) fn new(
        states: HashMap<String, Arc<StateNode>>,
        transitions: Vec<Arc<Transition>>,
        initial: String,
        options: RunOptions,
    ) -> Self {
        Self {
            states,
            transitions,
            initial,
            options,
        }
    }

    /// Look up a state by name.
    pub fn state(&self, name: &str) -> Option<&Arc<StateNode>> {
        self.states.get(name)
    }

    /// The definition's unique initial state.
    pub fn initial_state(&self) -> &Arc<StateNode> {
        // Validated at build time: the initial state always exists.
        &self.states[&self.initial]
    }

    /// All states, keyed by name.
    pub fn states(&self) -> &HashMap<String, Arc<StateNode>> {
        &self.states
    }

    /// All transitions, in registration order.
    pub fn transitions(&self) -> &[Arc<Transition>] {
        &self.transitions
    }

    /// Transitions whose source and event match, in registration order.
    pub fn transitions_from(&self, state: &str, event: &str) -> Vec<Arc<Transition>> {
        self.transitions
            .iter()
            .filter(|t| t.from() == state && t.event() == event)
            .cloned()
            .collect()
    }

    /// Run-wide options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Create a fresh runnable instance of this definition.
    pub fn instance(self: &Arc<Self>) -> ProcessInstance {
        ProcessInstance::new(Arc::clone(self))
    }
}

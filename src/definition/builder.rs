//! Fluent builder assembling states and transitions into a validated,
//! immutable [`ProcessDefinition`].

use crate::definition::error::BuildError;
use crate::definition::{ProcessDefinition, RunOptions};
use crate::model::{ProcessData, StateNode, Step, Transition};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builder for [`ProcessDefinition`].
///
/// Misconfigurations never interrupt the fluent chain: a duplicate state
/// name is recorded as a deferred error and surfaced by [`build`], together
/// with structural validation (exactly one initial state, at least one
/// final state, every transition endpoint known).
///
/// # Example
///
/// ```rust
/// use procflow::definition::DefinitionBuilder;
/// use procflow::model::{StateNode, Transition};
///
/// let definition = DefinitionBuilder::new()
///     .add_state(StateNode::new("pending").initial())
///     .add_state(StateNode::new("processing"))
///     .add_state(StateNode::new("completed").terminal())
///     .add_transition(Transition::new("pending", "process", "processing"))
///     .add_transition(Transition::new("processing", "complete", "completed"))
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.initial_state().name(), "pending");
/// ```
///
/// [`build`]: DefinitionBuilder::build
#[derive(Default)]
pub struct DefinitionBuilder {
    states: Vec<StateNode>,
    transitions: Vec<Transition>,
    entry_steps: Vec<(String, Arc<dyn Step>)>,
    options: RunOptions,
    deferred: Vec<BuildError>,
    seen: HashSet<String>,
}

impl DefinitionBuilder {
    /// Create an empty builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state. A duplicate name records a deferred error surfaced at
    /// [`build`](Self::build) rather than failing immediately.
    pub fn add_state(mut self, state: StateNode) -> Self {
        if !self.seen.insert(state.name().to_string()) {
            self.deferred
                .push(BuildError::DuplicateState(state.name().to_string()));
            return self;
        }
        self.states.push(state);
        self
    }

    /// Add a transition. Endpoints are validated at [`build`](Self::build).
    pub fn add_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add a guarded automatic transition from `from` to `to`, eligible to
    /// fire immediately after any entry of `from`.
    pub fn add_auto_transition<F>(self, from: &str, to: &str, guard: F) -> Self
    where
        F: Fn(&ProcessData) -> bool + Send + Sync + 'static,
    {
        self.add_transition(Transition::auto(from, to).with_guard(guard))
    }

    /// Bind an entry step to an already-added state. The binding happens at
    /// [`build`](Self::build); an unknown name is a build error.
    pub fn on_state_enter(mut self, state: &str, step: Arc<dyn Step>) -> Self {
        self.entry_steps.push((state.to_string(), step));
        self
    }

    /// Replace the run-wide options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate and freeze the definition.
    ///
    /// Fails with a distinct [`BuildError`] for each misconfiguration:
    /// deferred duplicates, zero states, zero or multiple initial states,
    /// zero final states, a transition endpoint or entry-step binding that
    /// references no known state.
    pub fn build(mut self) -> Result<Arc<ProcessDefinition>, BuildError> {
        if let Some(err) = self.deferred.into_iter().next() {
            return Err(err);
        }
        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let initial_count = self.states.iter().filter(|s| s.is_initial()).count();
        match initial_count {
            1 => {}
            0 => return Err(BuildError::NoInitialState),
            n => return Err(BuildError::MultipleInitialStates(n)),
        }
        if !self.states.iter().any(|s| s.is_final()) {
            return Err(BuildError::NoFinalState);
        }

        for (name, step) in self.entry_steps {
            let state = self
                .states
                .iter_mut()
                .find(|s| s.name() == name)
                .ok_or(BuildError::UnknownStateRef(name))?;
            state.set_entry_step(step);
        }

        let names: HashSet<&str> = self.states.iter().map(|s| s.name()).collect();
        for t in &self.transitions {
            if !names.contains(t.from()) {
                return Err(BuildError::UnknownTransitionSource {
                    from: t.from().to_string(),
                    event: t.event().to_string(),
                });
            }
            if !names.contains(t.to()) {
                return Err(BuildError::UnknownTransitionTarget {
                    to: t.to().to_string(),
                    event: t.event().to_string(),
                });
            }
        }

        let initial = self
            .states
            .iter()
            .find(|s| s.is_initial())
            .map(|s| s.name().to_string())
            .ok_or(BuildError::NoInitialState)?;

        let states = self
            .states
            .into_iter()
            .map(|s| (s.name().to_string(), Arc::new(s)))
            .collect::<HashMap<_, _>>();
        let transitions = self.transitions.into_iter().map(Arc::new).collect();

        Ok(Arc::new(ProcessDefinition::new(
            states,
            transitions,
            initial,
            self.options,
        )))
    }
}

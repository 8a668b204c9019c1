//! Adapter surface: single-call execution of process definitions.
//!
//! These entry points compose the builder, instance, and notification
//! layers for callers that want one synchronous call instead of manual
//! `start`/`send_event`/inspect. They add no invariants of their own.
//!
//! The engine is passive, so all synchronous advancement happens inside
//! `start`: entry steps plus the automatic-transition cascade. A
//! definition that needs external events to finish cannot complete under
//! [`run`]; its output carries [`ProcessError::Stalled`] instead of
//! blocking forever.

use crate::definition::ProcessDefinition;
use crate::engine::{ProcessError, ProcessInstance, RunStatus};
use crate::model::{ExecutionRecord, ProcessData};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Input record handed to [`ProcessInstance::start`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessInput {
    /// Input snapshot, read-only for the rest of the run.
    pub data: HashMap<String, Value>,
    /// Start from this state instead of the definition's initial state.
    /// An unknown name fails `start` and leaves the run `Pending`.
    pub initial_state_override: Option<String>,
}

impl ProcessInput {
    /// Empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the input data map.
    pub fn with_data(mut self, data: HashMap<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Insert one input value.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Override the starting state.
    pub fn starting_at(mut self, state: impl Into<String>) -> Self {
        self.initial_state_override = Some(state.into());
        self
    }
}

/// Result record returned by [`run`].
#[derive(Debug)]
pub struct ProcessOutput {
    /// Final snapshot of the shared run data.
    pub data: ProcessData,
    /// Name of the state the run finished (or stalled) in.
    pub final_state: Option<String>,
    /// Terminal (or stalled) run status.
    pub status: RunStatus,
    /// Wall-clock execution time, when the run both started and ended.
    pub duration: Option<Duration>,
    /// Outputs of every entry step that ran, keyed by step identity.
    pub step_outputs: HashMap<String, Value>,
    /// Bounded execution history, oldest first.
    pub history: Vec<ExecutionRecord>,
    /// The error that stopped the run, if any.
    pub error: Option<ProcessError>,
}

impl ProcessOutput {
    /// Whether the run reached `Completed`.
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Build one instance, start it, and return the final result as a single
/// value.
pub fn run(definition: &Arc<ProcessDefinition>, input: ProcessInput) -> ProcessOutput {
    let instance = definition.instance();
    let error = instance.start(input).err();
    collect(&instance, error)
}

/// Execute one fresh instance per input, independently and in order.
pub fn run_batch(
    definition: &Arc<ProcessDefinition>,
    inputs: Vec<ProcessInput>,
) -> Vec<ProcessOutput> {
    inputs
        .into_iter()
        .map(|input| run(definition, input))
        .collect()
}

/// Lazily execute a stream of inputs, yielding one output per input.
pub fn run_stream<'a, I>(
    definition: &'a Arc<ProcessDefinition>,
    inputs: I,
) -> impl Iterator<Item = ProcessOutput> + 'a
where
    I: IntoIterator<Item = ProcessInput>,
    I::IntoIter: 'a,
{
    inputs.into_iter().map(move |input| run(definition, input))
}

fn collect(instance: &ProcessInstance, error: Option<ProcessError>) -> ProcessOutput {
    let status = instance.status();
    let final_state = instance.current_state();
    let error = match error {
        Some(err) => Some(err),
        None if !status.is_terminal() => Some(ProcessError::Stalled(
            final_state.clone().unwrap_or_default(),
        )),
        None => None,
    };

    let duration = match (instance.started_at(), instance.ended_at()) {
        (Some(started), Some(ended)) => Some(ended - started),
        _ => None,
    };

    let data = instance.data_snapshot();
    ProcessOutput {
        step_outputs: data.step_outputs().clone(),
        data,
        final_state,
        status,
        duration,
        history: instance.history(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionBuilder;
    use crate::model::{FnStep, StateNode, Transition};
    use serde_json::json;

    fn auto_definition() -> Arc<ProcessDefinition> {
        let score = Arc::new(FnStep::new("score", |data| {
            let amount = data
                .get_input("amount")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            data.set_var("large", json!(amount > 100));
            Ok(json!(amount))
        }));

        DefinitionBuilder::new()
            .add_state(StateNode::new("scoring").initial())
            .add_state(StateNode::new("manual_review").terminal())
            .add_state(StateNode::new("approved").terminal())
            .on_state_enter("scoring", score)
            .add_auto_transition("scoring", "manual_review", |data| {
                data.get_var("large") == Some(&json!(true))
            })
            .add_auto_transition("scoring", "approved", |data| {
                data.get_var("large") == Some(&json!(false))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn run_drives_auto_definition_to_completion() {
        let definition = auto_definition();
        let output = run(&definition, ProcessInput::new().with_value("amount", json!(50)));

        assert!(output.is_completed());
        assert_eq!(output.final_state.as_deref(), Some("approved"));
        assert_eq!(output.step_outputs.get("score"), Some(&json!(50)));
        assert!(output.duration.is_some());
        assert!(output.error.is_none());
        assert!(!output.history.is_empty());
    }

    #[test]
    fn run_reports_stall_for_event_driven_definition() {
        let definition = DefinitionBuilder::new()
            .add_state(StateNode::new("waiting").initial())
            .add_state(StateNode::new("done").terminal())
            .add_transition(Transition::new("waiting", "finish", "done"))
            .build()
            .unwrap();

        let output = run(&definition, ProcessInput::new());
        assert_eq!(output.status, RunStatus::Running);
        assert!(matches!(
            output.error,
            Some(ProcessError::Stalled(ref state)) if state == "waiting"
        ));
    }

    #[test]
    fn batch_runs_each_input_independently() {
        let definition = auto_definition();
        let outputs = run_batch(
            &definition,
            vec![
                ProcessInput::new().with_value("amount", json!(500)),
                ProcessInput::new().with_value("amount", json!(5)),
            ],
        );

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].final_state.as_deref(), Some("manual_review"));
        assert_eq!(outputs[1].final_state.as_deref(), Some("approved"));
    }

    #[test]
    fn stream_is_lazy_and_ordered() {
        let definition = auto_definition();
        let inputs = (0..3).map(|i| ProcessInput::new().with_value("amount", json!(i * 100)));

        let states: Vec<_> = run_stream(&definition, inputs.collect::<Vec<_>>())
            .map(|out| out.final_state.unwrap_or_default())
            .collect();

        assert_eq!(states, vec!["approved", "approved", "manual_review"]);
    }
}

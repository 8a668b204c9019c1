//! End-to-end scenarios: definition validation, the canonical
//! pending/processing/completed walkthrough, and lifecycle control.

use procflow::{
    BuildError, DefinitionBuilder, EventKind, ProcessError, ProcessInput, RecordKind, RunStatus,
    StateNode, Transition,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn order_definition() -> Arc<procflow::ProcessDefinition> {
    DefinitionBuilder::new()
        .add_state(StateNode::new("pending").initial())
        .add_state(StateNode::new("processing"))
        .add_state(StateNode::new("completed").terminal())
        .add_transition(Transition::new("pending", "process", "processing"))
        .add_transition(Transition::new("processing", "complete", "completed"))
        .build()
        .unwrap()
}

#[test]
fn build_rejects_each_misconfiguration_distinctly() {
    assert_eq!(
        DefinitionBuilder::new().build().unwrap_err(),
        BuildError::NoStates
    );

    assert_eq!(
        DefinitionBuilder::new()
            .add_state(StateNode::new("a").initial())
            .add_state(StateNode::new("b").initial().terminal())
            .build()
            .unwrap_err(),
        BuildError::MultipleInitialStates(2)
    );

    assert_eq!(
        DefinitionBuilder::new()
            .add_state(StateNode::new("a").initial())
            .build()
            .unwrap_err(),
        BuildError::NoFinalState
    );

    assert_eq!(
        DefinitionBuilder::new()
            .add_state(StateNode::new("a").initial())
            .add_state(StateNode::new("b").terminal())
            .add_transition(Transition::new("a", "go", "ghost"))
            .build()
            .unwrap_err(),
        BuildError::UnknownTransitionTarget {
            to: "ghost".to_string(),
            event: "go".to_string(),
        }
    );
}

#[test]
fn full_scenario_reaches_completed_with_one_transition_record_per_hop() {
    let definition = order_definition();
    let instance = definition.instance();

    instance.start(ProcessInput::new()).unwrap();
    instance.send_event("process").unwrap();
    instance.send_event("complete").unwrap();

    assert_eq!(instance.status(), RunStatus::Completed);
    assert_eq!(instance.current_state().as_deref(), Some("completed"));

    let transitions: Vec<_> = instance
        .history()
        .into_iter()
        .filter(|r| r.kind == RecordKind::Transition)
        .collect();
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].from.as_deref(), Some("pending"));
    assert_eq!(transitions[0].to.as_deref(), Some("processing"));
    assert_eq!(transitions[0].event.as_deref(), Some("process"));
    assert_eq!(transitions[1].from.as_deref(), Some("processing"));
    assert_eq!(transitions[1].to.as_deref(), Some("completed"));
    assert_eq!(transitions[1].event.as_deref(), Some("complete"));
    assert!(transitions.iter().all(|r| r.success));
}

#[test]
fn bad_override_leaves_status_pending() {
    let definition = order_definition();
    let instance = definition.instance();

    let err = instance
        .start(ProcessInput::new().starting_at("unknown"))
        .unwrap_err();

    assert!(matches!(err, ProcessError::UnknownState(name) if name == "unknown"));
    assert_eq!(instance.status(), RunStatus::Pending);

    // The run is still startable after the rejected override.
    instance.start(ProcessInput::new()).unwrap();
    assert_eq!(instance.status(), RunStatus::Running);
}

#[test]
fn terminal_runs_reject_every_entry_point() {
    let definition = order_definition();
    let instance = definition.instance();
    instance.start(ProcessInput::new()).unwrap();
    instance.send_event("process").unwrap();
    instance.send_event("complete").unwrap();

    assert!(matches!(
        instance.send_event("process").unwrap_err(),
        ProcessError::Finished(RunStatus::Completed)
    ));
    assert!(matches!(
        instance.pause().unwrap_err(),
        ProcessError::Finished(RunStatus::Completed)
    ));
    assert!(matches!(
        instance.resume().unwrap_err(),
        ProcessError::Finished(RunStatus::Completed)
    ));
    assert!(matches!(
        instance.cancel().unwrap_err(),
        ProcessError::Finished(RunStatus::Completed)
    ));
}

#[test]
fn subscribers_see_the_full_event_sequence() {
    let definition = order_definition();
    let instance = definition.instance();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    instance.subscribe(move |event| {
        sink.lock().unwrap().push(event.kind.clone());
    });

    instance.start(ProcessInput::new()).unwrap();
    instance.pause().unwrap();
    instance.resume().unwrap();
    instance.send_event("process").unwrap();
    instance.send_event("complete").unwrap();

    let kinds = seen.lock().unwrap().clone();
    assert_eq!(
        kinds,
        vec![
            EventKind::Started {
                state: "pending".into()
            },
            EventKind::StateEntered {
                state: "pending".into()
            },
            EventKind::Paused,
            EventKind::Resumed,
            EventKind::StateExited {
                state: "pending".into()
            },
            EventKind::TransitionTaken {
                from: "pending".into(),
                to: "processing".into(),
                event: "process".into()
            },
            EventKind::StateEntered {
                state: "processing".into()
            },
            EventKind::StateExited {
                state: "processing".into()
            },
            EventKind::TransitionTaken {
                from: "processing".into(),
                to: "completed".into(),
                event: "complete".into()
            },
            EventKind::StateEntered {
                state: "completed".into()
            },
            EventKind::Completed {
                final_state: "completed".into()
            },
        ]
    );
}

#[test]
fn input_data_flows_through_guards_and_actions() {
    let definition = DefinitionBuilder::new()
        .add_state(StateNode::new("triage").initial())
        .add_state(StateNode::new("fast_lane").terminal())
        .add_state(StateNode::new("slow_lane").terminal())
        .add_transition(
            Transition::new("triage", "route", "fast_lane")
                .with_priority(10)
                .with_guard(|data| {
                    data.get_input("priority") == Some(&json!("high"))
                })
                .with_action(|data| {
                    data.set_var("lane", json!("fast"));
                    Ok(())
                }),
        )
        .add_transition(Transition::new("triage", "route", "slow_lane"))
        .build()
        .unwrap();

    let instance = definition.instance();
    instance
        .start(ProcessInput::new().with_value("priority", json!("high")))
        .unwrap();
    instance.send_event("route").unwrap();

    assert_eq!(instance.current_state().as_deref(), Some("fast_lane"));
    assert_eq!(instance.data_snapshot().get_var("lane"), Some(&json!("fast")));
}

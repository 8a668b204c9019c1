//! Concurrency regression tests: serialized transitions under racing
//! callers, re-entrant read accessors from inside handlers, and per-handler
//! fault isolation.

use procflow::{
    DefinitionBuilder, EventKind, ProcessError, ProcessInput, ProcessInstance, RunStatus,
    StateNode, Transition,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Weak};
use std::thread;
use std::time::Duration;

/// Run `f` on its own thread and fail the test if it does not finish
/// within five seconds. Used wherever a regression would deadlock rather
/// than return.
fn assert_completes_within_bound<F>(label: &str, f: F)
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        f();
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .unwrap_or_else(|_| panic!("{label} did not complete in time"));
}

fn racing_definition() -> Arc<procflow::ProcessDefinition> {
    // "next" is deliberately neither final nor a source for "fire", so the
    // losing caller observes a lookup failure instead of a terminal status.
    DefinitionBuilder::new()
        .add_state(StateNode::new("ready").initial())
        .add_state(StateNode::new("next"))
        .add_state(StateNode::new("done").terminal())
        .add_transition(Transition::new("ready", "fire", "next"))
        .add_transition(Transition::new("next", "finish", "done"))
        .build()
        .unwrap()
}

#[test]
fn racing_send_events_yield_exactly_one_success() {
    let definition = racing_definition();

    for _ in 0..100 {
        let instance = Arc::new(definition.instance());
        instance.start(ProcessInput::new()).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let instance = instance.clone();
            let barrier = barrier.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                instance.send_event("fire")
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let no_transition = results
            .iter()
            .filter(|r| matches!(r, Err(ProcessError::NoTransition { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(no_transition, 1);
        assert_eq!(instance.current_state().as_deref(), Some("next"));
    }
}

#[test]
fn mutually_exclusive_guards_admit_exactly_one_racer() {
    let definition = DefinitionBuilder::new()
        .add_state(StateNode::new("gate").initial())
        .add_state(StateNode::new("left"))
        .add_state(StateNode::new("right"))
        .add_state(StateNode::new("done").terminal())
        .add_transition(
            Transition::new("gate", "pick", "left")
                .with_guard(|data| data.get_var("taken").is_none())
                .with_action(|data| {
                    data.set_var("taken", serde_json::json!("left"));
                    Ok(())
                }),
        )
        .add_transition(Transition::new("left", "finish", "done"))
        .add_transition(Transition::new("right", "finish", "done"))
        .build()
        .unwrap();

    for _ in 0..100 {
        let instance = Arc::new(definition.instance());
        instance.start(ProcessInput::new()).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let instance = instance.clone();
            let barrier = barrier.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                instance.send_event("pick")
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
        assert_eq!(instance.current_state().as_deref(), Some("left"));
    }
}

/// Subscribe a handler that calls every read accessor, then drive each
/// lifecycle event. A lock held across fan-out would deadlock here.
#[test]
fn reentrant_accessors_from_handlers_never_deadlock() {
    assert_completes_within_bound("re-entrant accessor run", || {
        let definition = DefinitionBuilder::new()
            .add_state(StateNode::new("work").initial())
            .add_state(StateNode::new("done").terminal())
            .add_transition(Transition::new("work", "finish", "done"))
            .build()
            .unwrap();

        let probes = Arc::new(AtomicUsize::new(0));

        let drive = |fail_start: bool| {
            let instance = Arc::new(definition.instance());
            let weak: Weak<ProcessInstance> = Arc::downgrade(&instance);
            let probes = probes.clone();
            instance.subscribe(move |_event| {
                if let Some(instance) = weak.upgrade() {
                    let _ = instance.status();
                    let _ = instance.current_state();
                    let _ = instance.data_snapshot();
                    let _ = instance.history();
                    probes.fetch_add(1, Ordering::SeqCst);
                }
            });
            if fail_start {
                // Unknown event produces an error path without ending the run.
                instance.start(ProcessInput::new()).unwrap();
                let _ = instance.send_event("nope");
                instance.pause().unwrap();
                instance.resume().unwrap();
                instance.cancel().unwrap();
            } else {
                instance.start(ProcessInput::new()).unwrap();
                instance.send_event("finish").unwrap();
            }
        };

        // Covers started, entered, paused, resumed, cancelled on one run
        // and started, exited, transition, entered, completed on the other.
        drive(true);
        drive(false);

        assert!(probes.load(Ordering::SeqCst) > 0);
    });
}

#[test]
fn handler_probing_accessors_during_failure_events_completes() {
    assert_completes_within_bound("failure event probe", || {
        let definition = DefinitionBuilder::new()
            .add_state(StateNode::new("a").initial())
            .add_state(StateNode::new("b").terminal())
            .add_transition(
                Transition::new("a", "go", "b")
                    .with_action(|_| Err(procflow::model::HookError::new("declined"))),
            )
            .build()
            .unwrap();

        let instance = Arc::new(definition.instance());
        let weak = Arc::downgrade(&instance);
        let saw_failed = Arc::new(AtomicUsize::new(0));
        let counter = saw_failed.clone();
        instance.subscribe(move |event| {
            if let Some(instance) = weak.upgrade() {
                let _ = instance.status();
                let _ = instance.history();
                if matches!(event.kind, EventKind::Failed { .. }) {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        instance.start(ProcessInput::new()).unwrap();
        let err = instance.send_event("go").unwrap_err();
        assert!(matches!(err, ProcessError::ActionFailed { .. }));
        assert_eq!(saw_failed.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn faulting_handler_neither_blocks_later_handlers_nor_changes_status() {
    let definition = DefinitionBuilder::new()
        .add_state(StateNode::new("a").initial())
        .add_state(StateNode::new("b").terminal())
        .add_transition(Transition::new("a", "go", "b"))
        .build()
        .unwrap();

    let instance = definition.instance();
    let later_handler_calls = Arc::new(AtomicUsize::new(0));

    instance.subscribe(|_| panic!("subscriber fault"));
    let calls = later_handler_calls.clone();
    instance.subscribe(move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
    });

    instance.start(ProcessInput::new()).unwrap();
    instance.send_event("go").unwrap();

    // Started, entered(a), exited(a), transition, entered(b), completed.
    assert_eq!(later_handler_calls.load(Ordering::SeqCst), 6);
    assert_eq!(instance.status(), RunStatus::Completed);
}

#[test]
fn concurrent_readers_run_alongside_transitions() {
    let definition = racing_definition();
    let instance = Arc::new(definition.instance());
    instance.start(ProcessInput::new()).unwrap();

    let stop = Arc::new(AtomicUsize::new(0));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let instance = instance.clone();
        let stop = stop.clone();
        readers.push(thread::spawn(move || {
            while stop.load(Ordering::SeqCst) == 0 {
                let _ = instance.status();
                let _ = instance.history();
                let _ = instance.data_snapshot();
            }
        }));
    }

    instance.send_event("fire").unwrap();
    instance.send_event("finish").unwrap();
    assert_eq!(instance.status(), RunStatus::Completed);

    stop.store(1, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }
}

//! Document review: an event-driven workflow advanced by explicit
//! `send_event` calls, with a subscriber printing every notification.

use procflow::{DefinitionBuilder, ProcessInput, StateNode, Transition};
use serde_json::json;

fn main() {
    let definition = DefinitionBuilder::new()
        .add_state(StateNode::new("draft").initial())
        .add_state(StateNode::new("in_review"))
        .add_state(StateNode::new("approved").terminal())
        .add_state(StateNode::new("rejected").terminal())
        .add_transition(Transition::new("draft", "submit", "in_review").with_action(|data| {
            data.set_var("submitted", json!(true));
            Ok(())
        }))
        .add_transition(
            Transition::new("in_review", "decide", "approved")
                .with_priority(10)
                .with_guard(|data| data.get_input("reviewer") == Some(&json!("senior"))),
        )
        .add_transition(Transition::new("in_review", "decide", "rejected"))
        .build()
        .expect("definition is valid");

    let instance = definition.instance();
    instance.subscribe(|event| {
        println!("[{}] {:?}", event.timestamp.format("%H:%M:%S%.3f"), event.kind);
    });

    instance
        .start(ProcessInput::new().with_value("reviewer", json!("senior")))
        .expect("start from pending");
    instance.send_event("submit").expect("submit from draft");

    instance.pause().expect("pause while running");
    println!("paused at {:?}", instance.current_state());
    instance.resume().expect("resume while paused");

    instance.send_event("decide").expect("decide from in_review");

    println!(
        "finished: status={} state={:?} history={} records",
        instance.status(),
        instance.current_state(),
        instance.history().len(),
    );
}

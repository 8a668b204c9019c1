//! Order processing: an auto-driven workflow executed with `run`.
//!
//! Orders are scored on entry, then routed automatically: large orders go
//! through a fraud check before charging, small orders charge directly.

use procflow::{DefinitionBuilder, FnStep, ProcessInput, StateNode, Transition};
use serde_json::{json, Value};
use std::sync::Arc;

fn main() {
    let score = Arc::new(FnStep::new("score", |data| {
        let amount = data
            .get_input("amount")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        data.set_var("needs_review", json!(amount > 1000));
        Ok(json!({ "amount": amount }))
    }));

    let charge = Arc::new(FnStep::new("charge", |data| {
        let amount = data
            .get_input("amount")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(json!({ "charged": amount }))
    }));

    let definition = DefinitionBuilder::new()
        .add_state(StateNode::new("received").initial())
        .add_state(StateNode::new("fraud_check"))
        .add_state(StateNode::new("charging"))
        .add_state(StateNode::new("shipped").terminal())
        .on_state_enter("received", score)
        .on_state_enter("charging", charge)
        .add_transition(
            Transition::auto("received", "fraud_check")
                .with_priority(10)
                .with_guard(|data| data.get_var("needs_review") == Some(&json!(true))),
        )
        .add_transition(Transition::auto("received", "charging"))
        .add_transition(
            Transition::auto("fraud_check", "charging").with_action(|data| {
                data.set_var("review_passed", json!(true));
                Ok(())
            }),
        )
        .add_transition(Transition::auto("charging", "shipped"))
        .build()
        .expect("definition is valid");

    for amount in [250, 4999] {
        let output = procflow::run(
            &definition,
            ProcessInput::new().with_value("amount", json!(amount)),
        );

        println!(
            "order of {amount}: status={} final_state={}",
            output.status,
            output.final_state.as_deref().unwrap_or("<none>"),
        );
        for record in &output.history {
            println!(
                "  {:?} {} -> {}",
                record.kind,
                record.from.as_deref().unwrap_or("-"),
                record.to.as_deref().unwrap_or("-"),
            );
        }
        println!("  step outputs: {:?}", output.step_outputs);
    }
}

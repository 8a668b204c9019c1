//! Transitions: guarded, prioritized edges between states.

use crate::model::data::ProcessData;
use crate::model::state::HookError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reserved event name marking transitions that fire without an external
/// event, whenever their guard admits immediately after a state entry.
/// User events may not use this name.
pub const AUTO_EVENT: &str = "__auto__";

/// Pure admission predicate evaluated against shared run data.
///
/// Guards have no error channel: a guard that must fail should instead be
/// omitted or always deny. The engine evaluates each guard at most once per
/// dispatch, so non-deterministic or counting guards still behave sanely.
///
/// # Example
///
/// ```rust
/// use procflow::model::{Guard, ProcessData};
/// use serde_json::json;
///
/// let paid = Guard::new(|data: &ProcessData| {
///     data.get_var("paid").and_then(|v| v.as_bool()).unwrap_or(false)
/// });
///
/// let mut data = ProcessData::new(Default::default());
/// assert!(!paid.admits(&data));
/// data.set_var("paid", json!(true));
/// assert!(paid.admits(&data));
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Arc<dyn Fn(&ProcessData) -> bool + Send + Sync>,
}

impl Guard {
    /// Create a guard from a pure predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ProcessData) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the predicate against the current run data.
    pub fn admits(&self, data: &ProcessData) -> bool {
        (self.predicate)(data)
    }
}

/// Side-effecting function run once per executed transition, after the
/// source state's exit hook and before the target state's entry behavior.
#[derive(Clone)]
pub struct Action {
    func: Arc<dyn Fn(&mut ProcessData) -> Result<(), HookError> + Send + Sync>,
}

impl Action {
    /// Create an action from a closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut ProcessData) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Run the action against the shared run data.
    pub fn run(&self, data: &mut ProcessData) -> Result<(), HookError> {
        (self.func)(data)
    }
}

/// A directed edge (from, event, to) with an optional guard, optional
/// action, and an integer priority (higher fires first; ties keep
/// registration order). Several transitions may share (from, event); the
/// engine picks the first admitting one in priority order.
pub struct Transition {
    from: String,
    event: String,
    to: String,
    guard: Option<Guard>,
    action: Option<Action>,
    priority: i32,
    metadata: HashMap<String, Value>,
}

impl Transition {
    /// Create a transition triggered by a named event.
    pub fn new(from: impl Into<String>, event: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            event: event.into(),
            to: to.into(),
            guard: None,
            action: None,
            priority: 0,
            metadata: HashMap::new(),
        }
    }

    /// Create an automatic transition, eligible to fire right after any
    /// entry of `from` without an external event.
    pub fn auto(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(from, AUTO_EVENT, to)
    }

    /// Attach an admission guard.
    pub fn with_guard<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ProcessData) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Attach a transition action.
    pub fn with_action<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut ProcessData) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.action = Some(Action::new(func));
        self
    }

    /// Set the selection priority. Defaults to 0.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a free-form metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Source state name.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Triggering event name (possibly [`AUTO_EVENT`]).
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Target state name.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// The admission guard, if any. Absence admits.
    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// The transition action, if any.
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Selection priority; higher fires first.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether this transition fires without an external event.
    pub fn is_auto(&self) -> bool {
        self.event == AUTO_EVENT
    }

    /// Free-form metadata attached at build time.
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("event", &self.event)
            .field("to", &self.to)
            .field("priority", &self.priority)
            .field("has_guard", &self.guard.is_some())
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

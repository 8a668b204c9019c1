//! Execution history: append-only audit records with a bounded log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What kind of engine activity a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// A state was entered.
    StateEnter,
    /// A state was exited.
    StateExit,
    /// A transition executed between two states.
    Transition,
}

/// One audit entry, created by the engine on every state entry, state exit,
/// and transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// When the activity happened.
    pub timestamp: DateTime<Utc>,
    /// The kind of activity.
    pub kind: RecordKind,
    /// Source state, where applicable.
    pub from: Option<String>,
    /// Target state, where applicable.
    pub to: Option<String>,
    /// Triggering event name, for transition records.
    pub event: Option<String>,
    /// Whether the activity completed without error.
    pub success: bool,
    /// Error message when `success` is false.
    pub error: Option<String>,
}

impl ExecutionRecord {
    /// Record a successful state entry.
    pub fn state_enter(state: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: RecordKind::StateEnter,
            from: None,
            to: Some(state.into()),
            event: None,
            success: true,
            error: None,
        }
    }

    /// Record a successful state exit.
    pub fn state_exit(state: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: RecordKind::StateExit,
            from: Some(state.into()),
            to: None,
            event: None,
            success: true,
            error: None,
        }
    }

    /// Record an executed transition.
    pub fn transition(
        from: impl Into<String>,
        to: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: RecordKind::Transition,
            from: Some(from.into()),
            to: Some(to.into()),
            event: Some(event.into()),
            success: true,
            error: None,
        }
    }

    /// Mark this record as failed with the given error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Append-only log of execution records, trimmed to a maximum count.
/// The oldest records are discarded first, bounding memory for
/// long-running processes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionLog {
    records: VecDeque<ExecutionRecord>,
    limit: usize,
}

impl ExecutionLog {
    /// Create an empty log holding at most `limit` records.
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit,
        }
    }

    /// Append a record, discarding the oldest when the limit is reached.
    pub fn push(&mut self, record: ExecutionRecord) {
        while self.records.len() >= self.limit.max(1) {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy the retained records, oldest first.
    pub fn to_vec(&self) -> Vec<ExecutionRecord> {
        self.records.iter().cloned().collect()
    }

    /// Iterate the retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ExecutionRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_fields() {
        let enter = ExecutionRecord::state_enter("review");
        assert_eq!(enter.kind, RecordKind::StateEnter);
        assert_eq!(enter.to.as_deref(), Some("review"));
        assert!(enter.success);

        let exit = ExecutionRecord::state_exit("review");
        assert_eq!(exit.kind, RecordKind::StateExit);
        assert_eq!(exit.from.as_deref(), Some("review"));

        let hop = ExecutionRecord::transition("draft", "review", "submit");
        assert_eq!(hop.kind, RecordKind::Transition);
        assert_eq!(hop.event.as_deref(), Some("submit"));
    }

    #[test]
    fn failed_marks_record() {
        let record = ExecutionRecord::state_enter("review").failed("step blew up");
        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some("step blew up"));
    }

    #[test]
    fn log_trims_oldest_first() {
        let mut log = ExecutionLog::new(3);
        for name in ["a", "b", "c", "d", "e"] {
            log.push(ExecutionRecord::state_enter(name));
        }

        assert_eq!(log.len(), 3);
        let retained: Vec<_> = log
            .iter()
            .map(|r| r.to.clone().unwrap_or_default())
            .collect();
        assert_eq!(retained, vec!["c", "d", "e"]);
    }

    #[test]
    fn zero_limit_behaves_as_one() {
        let mut log = ExecutionLog::new(0);
        log.push(ExecutionRecord::state_enter("a"));
        log.push(ExecutionRecord::state_enter("b"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.to_vec()[0].to.as_deref(), Some("b"));
    }
}

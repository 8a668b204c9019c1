//! Build errors for process definitions.

use thiserror::Error;

/// Errors surfaced by [`DefinitionBuilder::build`](crate::definition::DefinitionBuilder::build).
///
/// Configuration problems are never returned mid-chain: `add_state` with a
/// duplicate name records a deferred error so fluent configuration can
/// continue, and everything is reported here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("definition has no states")]
    NoStates,

    #[error("duplicate state name '{0}'")]
    DuplicateState(String),

    #[error("no initial state defined. Mark exactly one state with .initial()")]
    NoInitialState,

    #[error("definition has {0} initial states, expected exactly one")]
    MultipleInitialStates(usize),

    #[error("no final state defined. Mark at least one state with .terminal()")]
    NoFinalState,

    #[error("transition on '{event}' references unknown source state '{from}'")]
    UnknownTransitionSource { from: String, event: String },

    #[error("transition on '{event}' references unknown target state '{to}'")]
    UnknownTransitionTarget { to: String, event: String },

    #[error("entry step bound to unknown state '{0}'")]
    UnknownStateRef(String),
}

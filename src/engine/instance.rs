//! The process instance: one concurrently-accessible execution of a
//! definition.
//!
//! The engine is passive. No background thread exists; every advancement
//! happens synchronously inside the caller's invocation of `start`,
//! `send_event`, `pause`, `resume`, or `cancel`, which may themselves race
//! from multiple threads of the host program.
//!
//! Locking discipline:
//!
//! 1. A transition lock serializes every state-changing entry point, so at
//!    most one logical transition is ever in flight.
//! 2. A snapshot lock protects current state, status, timestamps, and
//!    history for short, bounded critical sections shared with the read
//!    accessors.
//! 3. A data lock guards [`ProcessData`] on its own, so guards, actions,
//!    hooks, and entry steps running on the caller's thread never block
//!    `status()` or `history()` readers.
//!
//! Events are only ever published while none of the snapshot or data locks
//! are held: a handler may call back into any read accessor without
//! deadlocking. Handlers must not call the state-changing entry points
//! from inside their own invocation.

use crate::definition::ProcessDefinition;
use crate::engine::error::ProcessError;
use crate::engine::status::RunStatus;
use crate::engine::subscribers::{EventHandler, SubscriberSet};
use crate::model::{
    EventKind, ExecutionLog, ExecutionRecord, ProcessData, ProcessEvent, StateNode, Transition,
    AUTO_EVENT,
};
use crate::runner::ProcessInput;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Acquire a mutex, recovering the data if a panicking user callback
/// poisoned it. The engine's own critical sections never panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mutable run fields guarded by the snapshot lock.
struct Snapshot {
    current: Option<String>,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    log: ExecutionLog,
}

/// One execution of a [`ProcessDefinition`].
///
/// Create with [`ProcessDefinition::instance`] or [`ProcessInstance::new`],
/// drive with [`start`](Self::start) and [`send_event`](Self::send_event),
/// and observe with [`subscribe`](Self::subscribe) or the read accessors.
/// All methods take `&self` and are safe to call from any thread.
pub struct ProcessInstance {
    id: Uuid,
    definition: Arc<ProcessDefinition>,
    gate: Mutex<()>,
    snapshot: Mutex<Snapshot>,
    data: Mutex<ProcessData>,
    subscribers: SubscriberSet,
    cancel_hook: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl ProcessInstance {
    /// Create a pending instance of the given definition.
    pub fn new(definition: Arc<ProcessDefinition>) -> Self {
        let history_limit = definition.options().history_limit;
        Self {
            id: Uuid::new_v4(),
            definition,
            gate: Mutex::new(()),
            snapshot: Mutex::new(Snapshot {
                current: None,
                status: RunStatus::Pending,
                started_at: None,
                ended_at: None,
                last_error: None,
                log: ExecutionLog::new(history_limit),
            }),
            data: Mutex::new(ProcessData::default()),
            subscribers: SubscriberSet::default(),
            cancel_hook: Mutex::new(None),
        }
    }

    /// The instance's unique identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The definition backing this instance.
    pub fn definition(&self) -> &Arc<ProcessDefinition> {
        &self.definition
    }

    /// Register an event handler, invoked in registration order for every
    /// published event.
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&ProcessEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(Arc::new(handler) as EventHandler);
    }

    /// Register a cooperative-cancellation hook, invoked once by
    /// [`cancel`](Self::cancel) so in-progress steps can observe
    /// cancellation and exit early.
    pub fn on_cancel<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *lock(&self.cancel_hook) = Some(Arc::new(hook));
    }

    /// Current run status.
    pub fn status(&self) -> RunStatus {
        lock(&self.snapshot).status
    }

    /// Name of the current workflow state, once started.
    pub fn current_state(&self) -> Option<String> {
        lock(&self.snapshot).current.clone()
    }

    /// Copy of the bounded execution history, oldest first.
    pub fn history(&self) -> Vec<ExecutionRecord> {
        lock(&self.snapshot).log.to_vec()
    }

    /// Independent deep copy of the shared run data.
    pub fn data_snapshot(&self) -> ProcessData {
        lock(&self.data).clone()
    }

    /// Message of the execution error that failed the run, if any.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.snapshot).last_error.clone()
    }

    /// When the run started.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.snapshot).started_at
    }

    /// When the run reached a terminal status.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.snapshot).ended_at
    }

    /// Start the run. Valid only from `Pending`.
    ///
    /// Selects the definition's initial state, or the input's override
    /// state; an unknown override rolls the status back to `Pending` and
    /// returns [`ProcessError::UnknownState`]. Publishes
    /// [`EventKind::Started`], enters the state, then cascades automatic
    /// transitions until quiescent.
    pub fn start(&self, input: ProcessInput) -> Result<(), ProcessError> {
        let _gate = lock(&self.gate);

        {
            let mut snap = lock(&self.snapshot);
            match snap.status {
                RunStatus::Pending => {}
                RunStatus::Running | RunStatus::Paused => {
                    return Err(ProcessError::AlreadyStarted)
                }
                status => return Err(ProcessError::Finished(status)),
            }
            snap.status = RunStatus::Running;
            snap.started_at = Some(Utc::now());
        }

        let initial = match &input.initial_state_override {
            Some(name) => match self.definition.state(name) {
                Some(state) => Arc::clone(state),
                None => {
                    // Roll back rather than leaving a false-started run.
                    let mut snap = lock(&self.snapshot);
                    snap.status = RunStatus::Pending;
                    snap.started_at = None;
                    return Err(ProcessError::UnknownState(name.clone()));
                }
            },
            None => Arc::clone(self.definition.initial_state()),
        };

        {
            let mut snap = lock(&self.snapshot);
            snap.current = Some(initial.name().to_string());
        }
        *lock(&self.data) = ProcessData::new(input.data);

        debug!(process = %self.id, state = initial.name(), "starting process");
        self.publish(EventKind::Started {
            state: initial.name().to_string(),
        });

        self.enter_state(&initial)?;
        self.cascade()
    }

    /// Deliver a named event. Valid only while `Running`.
    ///
    /// Gathers the transitions matching (current state, event), sorts them
    /// by descending priority (ties keep registration order), and executes
    /// the first whose guard admits, evaluating each guard exactly once.
    /// Afterwards automatic transitions cascade from the new state.
    pub fn send_event(&self, event: &str) -> Result<(), ProcessError> {
        if event == AUTO_EVENT {
            return Err(ProcessError::ReservedEvent(event.to_string()));
        }

        let _gate = lock(&self.gate);

        let current = {
            let snap = lock(&self.snapshot);
            match snap.status {
                RunStatus::Running => {}
                RunStatus::Pending => return Err(ProcessError::NotStarted),
                RunStatus::Paused => return Err(ProcessError::Paused),
                status => return Err(ProcessError::Finished(status)),
            }
            snap.current.clone().unwrap_or_default()
        };

        let (had_candidates, picked) = self.select(&current, event);
        let transition = match picked {
            Some(t) => t,
            None if !had_candidates => {
                return Err(ProcessError::NoTransition {
                    state: current,
                    event: event.to_string(),
                })
            }
            None => {
                return Err(ProcessError::NoneAdmitted {
                    state: current,
                    event: event.to_string(),
                })
            }
        };

        self.execute(&transition)?;
        self.cascade()
    }

    /// Suspend a running process. Valid only while `Running`.
    pub fn pause(&self) -> Result<(), ProcessError> {
        let _gate = lock(&self.gate);
        {
            let mut snap = lock(&self.snapshot);
            match snap.status {
                RunStatus::Running => snap.status = RunStatus::Paused,
                RunStatus::Pending => return Err(ProcessError::NotStarted),
                RunStatus::Paused => return Err(ProcessError::Paused),
                status => return Err(ProcessError::Finished(status)),
            }
        }
        debug!(process = %self.id, "process paused");
        self.publish(EventKind::Paused);
        Ok(())
    }

    /// Resume a paused process. Valid only while `Paused`.
    pub fn resume(&self) -> Result<(), ProcessError> {
        let _gate = lock(&self.gate);
        {
            let mut snap = lock(&self.snapshot);
            match snap.status {
                RunStatus::Paused => snap.status = RunStatus::Running,
                RunStatus::Pending => return Err(ProcessError::NotStarted),
                RunStatus::Running => return Err(ProcessError::NotPaused),
                status => return Err(ProcessError::Finished(status)),
            }
        }
        debug!(process = %self.id, "process resumed");
        self.publish(EventKind::Resumed);
        Ok(())
    }

    /// Cancel the run from any non-terminal status.
    ///
    /// Sets the status to `Cancelled`, records the end timestamp, invokes
    /// the cooperative-cancellation hook (outside all locks), and publishes
    /// [`EventKind::Cancelled`]. The engine never forcibly interrupts an
    /// in-progress step.
    pub fn cancel(&self) -> Result<(), ProcessError> {
        let _gate = lock(&self.gate);
        {
            let mut snap = lock(&self.snapshot);
            if snap.status.is_terminal() {
                return Err(ProcessError::Finished(snap.status));
            }
            snap.status = RunStatus::Cancelled;
            snap.ended_at = Some(Utc::now());
        }

        let hook = lock(&self.cancel_hook).clone();
        if let Some(hook) = hook {
            hook();
        }

        debug!(process = %self.id, "process cancelled");
        self.publish(EventKind::Cancelled);
        Ok(())
    }

    /// Select the winning transition for (state, event).
    ///
    /// Returns whether any candidate existed at all, and the first
    /// candidate, in descending priority order, whose guard admits. Guard
    /// absence admits; each guard is evaluated at most once. Both
    /// `send_event` and the automatic cascade dispatch through here, so the
    /// two paths can never diverge.
    fn select(&self, state: &str, event: &str) -> (bool, Option<Arc<Transition>>) {
        let mut candidates = self.definition.transitions_from(state, event);
        if candidates.is_empty() {
            return (false, None);
        }
        // Stable sort: equal priorities keep registration order.
        candidates.sort_by_key(|t| Reverse(t.priority()));

        for transition in candidates {
            let admitted = match transition.guard() {
                None => true,
                Some(guard) => {
                    let data = lock(&self.data);
                    guard.admits(&data)
                }
            };
            if admitted {
                return (true, Some(transition));
            }
        }
        (true, None)
    }

    /// Execute one selected transition: exit behavior, action, target
    /// resolution, transition record and event, current-state update, and
    /// entry behavior on the target.
    fn execute(&self, transition: &Arc<Transition>) -> Result<(), ProcessError> {
        let from_name = transition.from().to_string();

        if let Some(source) = self.definition.state(&from_name).cloned() {
            if let Some(hook) = source.exit_hook() {
                let result = {
                    let mut data = lock(&self.data);
                    hook(&mut data)
                };
                if let Err(err) = result {
                    lock(&self.snapshot)
                        .log
                        .push(ExecutionRecord::state_exit(&from_name).failed(err.to_string()));
                    return self.fail(ProcessError::HookFailed {
                        state: from_name,
                        phase: "exit",
                        source: err,
                    });
                }
            }
            lock(&self.snapshot)
                .log
                .push(ExecutionRecord::state_exit(&from_name));
            self.publish(EventKind::StateExited {
                state: from_name.clone(),
            });
        }

        if let Some(action) = transition.action() {
            let result = {
                let mut data = lock(&self.data);
                action.run(&mut data)
            };
            if let Err(err) = result {
                // Exit side effects already applied stay applied: the run
                // fails with at-least-once, not atomic, semantics.
                lock(&self.snapshot).log.push(
                    ExecutionRecord::transition(&from_name, transition.to(), transition.event())
                        .failed(err.to_string()),
                );
                return self.fail(ProcessError::ActionFailed {
                    from: from_name,
                    to: transition.to().to_string(),
                    event: transition.event().to_string(),
                    source: err,
                });
            }
        }

        let target = match self.definition.state(transition.to()) {
            Some(state) => Arc::clone(state),
            None => return self.fail(ProcessError::UnknownState(transition.to().to_string())),
        };

        lock(&self.snapshot).log.push(ExecutionRecord::transition(
            &from_name,
            target.name(),
            transition.event(),
        ));
        debug!(
            process = %self.id,
            from = %from_name,
            to = target.name(),
            event = transition.event(),
            "transition executed"
        );
        self.publish(EventKind::TransitionTaken {
            from: from_name,
            to: target.name().to_string(),
            event: transition.event().to_string(),
        });

        lock(&self.snapshot).current = Some(target.name().to_string());
        self.enter_state(&target)
    }

    /// Run a state's entry behavior: enter hook, entry step, enter record
    /// and event, and completion when the state is final.
    fn enter_state(&self, state: &Arc<StateNode>) -> Result<(), ProcessError> {
        let name = state.name().to_string();

        if let Some(hook) = state.enter_hook() {
            let result = {
                let mut data = lock(&self.data);
                hook(&mut data)
            };
            if let Err(err) = result {
                lock(&self.snapshot)
                    .log
                    .push(ExecutionRecord::state_enter(&name).failed(err.to_string()));
                return self.fail(ProcessError::HookFailed {
                    state: name,
                    phase: "enter",
                    source: err,
                });
            }
        }

        if let Some(step) = state.entry_step() {
            let step_id = step.id().to_string();
            let result = {
                let mut data = lock(&self.data);
                step.execute(&mut data).map(|output| {
                    data.record_step_output(&step_id, output);
                })
            };
            if let Err(err) = result {
                lock(&self.snapshot)
                    .log
                    .push(ExecutionRecord::state_enter(&name).failed(err.to_string()));
                return self.fail(ProcessError::StepFailed {
                    state: name,
                    step: step_id,
                    source: err,
                });
            }
        }

        lock(&self.snapshot)
            .log
            .push(ExecutionRecord::state_enter(&name));
        self.publish(EventKind::StateEntered {
            state: name.clone(),
        });

        if state.is_final() {
            self.complete(&name);
        }
        Ok(())
    }

    /// Fire automatic transitions from the current state until none admits
    /// or the run reaches a terminal status.
    fn cascade(&self) -> Result<(), ProcessError> {
        loop {
            let current = {
                let snap = lock(&self.snapshot);
                if snap.status.is_terminal() {
                    return Ok(());
                }
                snap.current.clone().unwrap_or_default()
            };

            let (_, picked) = self.select(&current, AUTO_EVENT);
            let Some(transition) = picked else {
                return Ok(());
            };
            self.execute(&transition)?;
        }
    }

    /// Terminal completion: entered a final state.
    fn complete(&self, final_state: &str) {
        {
            let mut snap = lock(&self.snapshot);
            snap.status = RunStatus::Completed;
            snap.ended_at = Some(Utc::now());
        }
        debug!(process = %self.id, state = final_state, "process completed");
        self.publish(EventKind::Completed {
            final_state: final_state.to_string(),
        });
    }

    /// Terminal failure: record the error, publish it, and return it to
    /// the caller of the entry point that triggered it.
    fn fail(&self, err: ProcessError) -> Result<(), ProcessError> {
        {
            let mut snap = lock(&self.snapshot);
            snap.status = RunStatus::Failed;
            snap.ended_at = Some(Utc::now());
            snap.last_error = Some(err.to_string());
        }
        debug!(process = %self.id, error = %err, "process failed");
        self.publish(EventKind::Failed {
            error: err.to_string(),
        });
        Err(err)
    }

    /// Publish one event to all subscribers. Never called while the
    /// snapshot or data lock is held.
    fn publish(&self, kind: EventKind) {
        let event = ProcessEvent {
            process_id: self.id,
            timestamp: Utc::now(),
            kind,
        };
        self.subscribers.publish(&event);
    }
}

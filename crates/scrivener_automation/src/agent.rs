//! The automation core: a state machine that walks a manifest task by task.
//!
//! The core decides *when* and *what next*; a [`TaskHandler`] decides *how*.
//! Every state change appends a timestamped log line and synchronously
//! notifies the subscriber given at construction.

use crate::{Manifest, ManifestPlanner, Task};
use async_trait::async_trait;
use derive_getters::Getters;
use scrivener_core::Novel;
use scrivener_error::{AgentError, AgentErrorKind, ScrivenerResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument};

/// Maximum retained log lines.
pub const MAX_LOG_ENTRIES: usize = 100;

/// Lifecycle of the automation core.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    /// Nothing running
    #[default]
    #[display("IDLE")]
    Idle,
    /// Waiting for the planner
    #[display("PLANNING")]
    Planning,
    /// Manifest ready for review
    #[display("AWAITING_USER")]
    AwaitingUser,
    /// Walking the manifest
    #[display("EXECUTING")]
    Executing,
    /// Paused by the user
    #[display("PAUSED")]
    Paused,
    /// Planning or a task failed
    #[display("ERROR")]
    Error,
    /// Every task finished
    #[display("COMPLETED")]
    Completed,
}

/// Snapshot of everything a front end shows about the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct AgentCoreState {
    /// Current status
    status: AgentStatus,
    /// Planned manifest, shared read-only
    manifest: Option<Arc<Manifest>>,
    /// Index of the task to run next; `None` before planning
    current_task_index: Option<usize>,
    /// Reset on resume
    retry_count: u32,
    /// Timestamped log, newest first
    logs: Vec<String>,
}

/// Performs the work of a single task.
///
/// The core awaits the returned future before moving on, so a handler may
/// take as long as it needs, including waiting on the user.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Executes `task`; resolving `Ok` marks it complete.
    async fn handle(&self, task: &Task) -> ScrivenerResult<()>;
}

/// Receives a snapshot after every state change.
///
/// Runs after the state lock is released, so it may call back into the core.
/// Snapshots from changes racing on different tasks may arrive out of order.
pub type StateSubscriber = Box<dyn Fn(&AgentCoreState) + Send + Sync>;

/// The automation state machine.
///
/// Share it through an `Arc` so that [`stop`](Self::stop) and friends can be
/// called while [`start_execution`](Self::start_execution) is awaiting a
/// handler.
pub struct AgentCore {
    state: Mutex<AgentCoreState>,
    handler: Arc<dyn TaskHandler>,
    subscriber: Option<StateSubscriber>,
    /// Bumped by stop and resets; gates planner continuations.
    cancel_epoch: AtomicU64,
    /// Bumped by every cancel and by pause; gates task continuations.
    dispatch_epoch: AtomicU64,
}

/// Epochs captured when an async operation starts.
#[derive(Debug, Clone, Copy)]
enum Gate {
    Planning(u64),
    Dispatch(u64),
}

impl AgentCore {
    /// Creates an idle core.
    pub fn new(handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            state: Mutex::new(AgentCoreState::default()),
            handler,
            subscriber: None,
            cancel_epoch: AtomicU64::new(0),
            dispatch_epoch: AtomicU64::new(0),
        }
    }

    /// Installs the state-change subscriber.
    pub fn with_subscriber(
        mut self,
        subscriber: impl Fn(&AgentCoreState) + Send + Sync + 'static,
    ) -> Self {
        self.subscriber = Some(Box::new(subscriber));
        self
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> AgentCoreState {
        self.lock().clone()
    }

    /// Current status.
    pub fn status(&self) -> AgentStatus {
        self.lock().status
    }

    fn lock(&self) -> MutexGuard<'_, AgentCoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_open(&self, gate: Gate) -> bool {
        match gate {
            Gate::Planning(epoch) => self.cancel_epoch.load(Ordering::SeqCst) == epoch,
            Gate::Dispatch(epoch) => self.dispatch_epoch.load(Ordering::SeqCst) == epoch,
        }
    }

    /// Closes the gates of every in-flight continuation. Call with the state
    /// lock held so a continuation cannot slip in between.
    fn close_gates(&self, include_planning: bool) {
        if include_planning {
            self.cancel_epoch.fetch_add(1, Ordering::SeqCst);
        }
        self.dispatch_epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Applies a mutation and logs `message`, then releases the lock and
    /// hands the resulting snapshot to the subscriber.
    fn commit(
        &self,
        mut state: MutexGuard<'_, AgentCoreState>,
        message: &str,
        mutate: impl FnOnce(&mut AgentCoreState),
    ) -> AgentCoreState {
        mutate(&mut state);
        info!(status = %state.status, "{}", message);

        let line = format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), message);
        state.logs.insert(0, line);
        state.logs.truncate(MAX_LOG_ENTRIES);

        let snapshot = state.clone();
        drop(state);

        if let Some(subscriber) = &self.subscriber {
            subscriber(&snapshot);
        }
        snapshot
    }

    fn invalid(operation: &str, status: AgentStatus) -> AgentError {
        AgentError::new(AgentErrorKind::InvalidTransition {
            operation: operation.to_string(),
            status: status.to_string(),
        })
    }

    /// Plans a manifest for `instruction`.
    ///
    /// Moves IDLE → PLANNING, then to AWAITING_USER on success or ERROR on
    /// failure. A stop or reset while the planner is running discards its
    /// result. Returns the status after the planner's result was handled.
    ///
    /// # Errors
    ///
    /// Fails only when the core is not idle; planner failures are reported
    /// through the state.
    #[instrument(skip(self, planner, novel))]
    pub async fn start_planning(
        &self,
        planner: &ManifestPlanner,
        novel: &Novel,
        instruction: &str,
    ) -> ScrivenerResult<AgentStatus> {
        let gate = {
            let state = self.lock();
            if state.status != AgentStatus::Idle {
                return Err(Self::invalid("start planning", state.status).into());
            }
            let gate = Gate::Planning(self.cancel_epoch.load(Ordering::SeqCst));
            self.commit(state, "Planning started", |s| {
                s.status = AgentStatus::Planning;
            });
            gate
        };

        let result = planner.plan(novel, instruction).await;

        let state = self.lock();
        if !self.is_open(gate) {
            debug!("Discarding planner result after cancellation");
            return Ok(state.status);
        }

        let snapshot = match result {
            Ok(manifest) => {
                let message = format!("Plan ready with {} tasks", manifest.len());
                self.commit(state, &message, |s| {
                    s.manifest = Some(Arc::new(manifest));
                    s.current_task_index = Some(0);
                    s.status = AgentStatus::AwaitingUser;
                })
            }
            Err(e) => {
                error!(error = %e, "Planning failed");
                self.commit(state, &format!("Planning failed: {}", e), |s| {
                    s.status = AgentStatus::Error;
                })
            }
        };
        Ok(snapshot.status)
    }

    /// Replaces the manifest while it is under review.
    ///
    /// The next task is taken from the new manifest's own index, clamped to
    /// its length.
    ///
    /// # Errors
    ///
    /// Fails unless the core is AWAITING_USER.
    pub fn update_manifest(&self, manifest: Manifest) -> ScrivenerResult<()> {
        let state = self.lock();
        if state.status != AgentStatus::AwaitingUser {
            return Err(Self::invalid("update the manifest", state.status).into());
        }

        let index = (*manifest.current_task_index()).min(manifest.len());
        let message = format!("Manifest updated ({} tasks)", manifest.len());
        self.commit(state, &message, |s| {
            s.manifest = Some(Arc::new(manifest));
            s.current_task_index = Some(index);
        });
        Ok(())
    }

    /// Starts walking the manifest and returns once the walk ends.
    ///
    /// Allowed from AWAITING_USER, or from IDLE when a manifest was kept by
    /// [`reset_to_idle`](Self::reset_to_idle). The returned status is
    /// COMPLETED, ERROR, or whatever a concurrent stop/pause left behind.
    ///
    /// # Errors
    ///
    /// Fails for any other status, or when there is no manifest.
    #[instrument(skip(self))]
    pub async fn start_execution(&self) -> ScrivenerResult<AgentStatus> {
        let gate = {
            let state = self.lock();
            match state.status {
                AgentStatus::AwaitingUser => {}
                AgentStatus::Idle if state.manifest.is_some() => {}
                AgentStatus::Idle => {
                    return Err(AgentError::new(AgentErrorKind::MissingManifest).into());
                }
                other => return Err(Self::invalid("start execution", other).into()),
            }
            let gate = Gate::Dispatch(self.dispatch_epoch.load(Ordering::SeqCst));
            self.commit(state, "Execution started", |s| {
                s.status = AgentStatus::Executing;
                s.current_task_index.get_or_insert(0);
            });
            gate
        };

        Ok(self.drive(gate).await)
    }

    /// Resumes after a pause or an error, re-running the current task.
    ///
    /// # Errors
    ///
    /// Fails unless the core is PAUSED or ERROR with a manifest.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> ScrivenerResult<AgentStatus> {
        let gate = {
            let state = self.lock();
            if !matches!(state.status, AgentStatus::Paused | AgentStatus::Error) {
                return Err(Self::invalid("resume", state.status).into());
            }
            if state.manifest.is_none() {
                return Err(AgentError::new(AgentErrorKind::MissingManifest).into());
            }
            let gate = Gate::Dispatch(self.dispatch_epoch.load(Ordering::SeqCst));
            self.commit(state, "Resumed", |s| {
                s.status = AgentStatus::Executing;
                s.retry_count = 0;
                s.current_task_index.get_or_insert(0);
            });
            gate
        };

        Ok(self.drive(gate).await)
    }

    /// Runs tasks until the manifest is exhausted, a task fails, or the gate
    /// closes.
    async fn drive(&self, gate: Gate) -> AgentStatus {
        loop {
            let task = {
                let state = self.lock();
                if !self.is_open(gate) {
                    return state.status;
                }

                let Some(manifest) = state.manifest.clone() else {
                    return self
                        .commit(state, "No manifest to execute", |s| {
                            s.status = AgentStatus::Error;
                        })
                        .status;
                };
                let index = state.current_task_index.unwrap_or(0);

                match manifest.task(index) {
                    Some(task) => {
                        let message = format!(
                            "Executing task {}/{}: {}",
                            index + 1,
                            manifest.len(),
                            task.title()
                        );
                        let task = task.clone();
                        self.commit(state, &message, |_| {});
                        task
                    }
                    None => {
                        return self
                            .commit(state, "All tasks completed", |s| {
                                s.status = AgentStatus::Completed;
                                s.current_task_index = Some(manifest.len());
                            })
                            .status;
                    }
                }
            };

            let result = self.handler.handle(&task).await;

            let state = self.lock();
            if !self.is_open(gate) {
                debug!(task = task.title().as_str(), "Discarding task result after cancellation");
                return state.status;
            }

            match result {
                Ok(()) => {
                    let message = format!("Task completed: {}", task.title());
                    self.commit(state, &message, |s| {
                        s.current_task_index = Some(s.current_task_index.unwrap_or(0) + 1);
                    });
                }
                Err(e) => {
                    error!(task = task.title().as_str(), error = %e, "Task failed");
                    let message = format!("Task failed: {}: {}", task.title(), e);
                    return self
                        .commit(state, &message, |s| {
                            s.status = AgentStatus::Error;
                        })
                        .status;
                }
            }
        }
    }

    /// Stops planning or execution and returns to IDLE.
    ///
    /// In-flight work is not aborted, but its result is ignored. From any
    /// other status only the in-flight continuations are cancelled.
    pub fn stop(&self) {
        let state = self.lock();
        self.close_gates(true);
        if matches!(state.status, AgentStatus::Executing | AgentStatus::Planning) {
            self.commit(state, "Stopped", |s| {
                s.status = AgentStatus::Idle;
            });
        }
    }

    /// Pauses; [`resume`](Self::resume) re-runs the current task.
    pub fn pause(&self) {
        let state = self.lock();
        self.close_gates(false);
        self.commit(state, "Paused", |s| {
            s.status = AgentStatus::Paused;
        });
    }

    /// Returns to IDLE, keeping the manifest and position.
    pub fn reset_to_idle(&self) {
        let state = self.lock();
        self.close_gates(true);
        self.commit(state, "Reset to idle", |s| {
            s.status = AgentStatus::Idle;
            s.retry_count = 0;
        });
    }

    /// Discards the manifest and the log.
    pub fn full_reset(&self) {
        let state = self.lock();
        self.close_gates(true);
        self.commit(state, "Agent reset", |s| {
            *s = AgentCoreState::default();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskType;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler(AtomicUsize);

    #[async_trait]
    impl TaskHandler for CountingHandler {
        async fn handle(&self, _task: &Task) -> ScrivenerResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn core_with_manifest(tasks: usize) -> (AgentCore, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler(AtomicUsize::new(0)));
        let core = AgentCore::new(handler.clone());
        {
            let mut state = core.lock();
            let tasks = (0..tasks)
                .map(|i| Task::new(i.to_string(), TaskType::Chapter, format!("T{}", i), ""))
                .collect();
            state.manifest = Some(Arc::new(Manifest::new(tasks)));
            state.current_task_index = Some(0);
            state.status = AgentStatus::AwaitingUser;
        }
        (core, handler)
    }

    #[test]
    fn test_logs_are_newest_first_and_capped() {
        let (core, _) = core_with_manifest(1);
        for _ in 0..(MAX_LOG_ENTRIES + 5) {
            core.pause();
        }
        core.reset_to_idle();

        let state = core.state();
        assert_eq!(state.logs().len(), MAX_LOG_ENTRIES);
        assert!(state.logs()[0].ends_with("] Reset to idle"));
        assert!(state.logs()[0].starts_with('['));
    }

    #[test]
    fn test_full_reset_keeps_single_marker() {
        let (core, _) = core_with_manifest(2);
        core.pause();
        core.full_reset();

        let state = core.state();
        assert_eq!(*state.status(), AgentStatus::Idle);
        assert!(state.manifest().is_none());
        assert_eq!(*state.current_task_index(), None);
        assert_eq!(state.logs().len(), 1);
    }

    #[test]
    fn test_update_manifest_only_while_awaiting_user() {
        let (core, _) = core_with_manifest(1);
        let replacement = Manifest::new(vec![
            Task::new("a", TaskType::Worldview, "World", ""),
            Task::new("b", TaskType::Character, "Cast", ""),
        ]);
        core.update_manifest(replacement.clone()).unwrap();
        assert_eq!(core.state().manifest().as_ref().map(|m| m.len()), Some(2));

        core.pause();
        assert!(core.update_manifest(replacement).is_err());
    }

    #[tokio::test]
    async fn test_empty_manifest_completes_immediately() {
        let (core, handler) = core_with_manifest(0);
        let status = core.start_execution().await.unwrap();

        assert_eq!(status, AgentStatus::Completed);
        assert_eq!(*core.state().current_task_index(), Some(0));
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_execution_requires_manifest() {
        let handler = Arc::new(CountingHandler(AtomicUsize::new(0)));
        let core = AgentCore::new(handler);
        assert!(core.start_execution().await.is_err());
        assert!(core.resume().await.is_err());
    }

    #[tokio::test]
    async fn test_idle_with_kept_manifest_can_execute() {
        let (core, handler) = core_with_manifest(2);
        core.reset_to_idle();

        let status = core.start_execution().await.unwrap();
        assert_eq!(status, AgentStatus::Completed);
        assert_eq!(handler.0.load(Ordering::SeqCst), 2);
    }
}

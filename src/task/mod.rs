//! Cancelable export task.
//!
//! - [`ExportTask`] - one export run: login, bulk export, file writing, layer hand-off
//! - [`AbortHandle`] - requests cancellation from any thread
//! - [`TaskHandle`] - a task running on the tokio runtime
//!
//! Split into focused submodules:
//! - [`orchestration`] - the run sequence and its checkpoints
//! - [`finalization`] - terminal state and notifications

mod finalization;
mod orchestration;


use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::export::ExportSource;
use crate::layer::{LayerLoader, LoadedLayer};
use crate::types::{Credentials, DownloadRequest, Event, ExportArtifact, TaskState};

/// Result of a successful export
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskSuccess {
    /// Files written by the task
    pub artifact: ExportArtifact,
    /// Layer created from the export, when a loader was configured
    pub layer: Option<LoadedLayer>,
}

/// How an export task ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Export written (and loaded, if a loader was configured)
    Succeeded(TaskSuccess),
    /// Export failed
    Failed {
        /// Machine-readable error code, see [`crate::Error::code`]
        code: &'static str,
        /// Error message with its causes
        diagnostic: String,
    },
    /// Export stopped by an abort request
    Aborted,
}

impl TaskOutcome {
    /// Terminal task state matching this outcome
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Succeeded(_) => TaskState::Succeeded,
            TaskOutcome::Failed { .. } => TaskState::Failed,
            TaskOutcome::Aborted => TaskState::Aborted,
        }
    }

    /// Whether the export succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }
}

/// State shared between a task and its abort handles
#[derive(Clone)]
struct TaskShared {
    event_tx: broadcast::Sender<Event>,
    state_tx: Arc<watch::Sender<TaskState>>,
    cancel_token: CancellationToken,
}

impl TaskShared {
    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// Set the state; `StateChanged` is sent while the state lock is held,
    /// so state events arrive in the order the changes happened
    fn transition(&self, state: TaskState) {
        self.state_tx.send_modify(|current| {
            *current = state;
            self.emit(Event::StateChanged { state });
        });
    }
}

/// Requests cancellation of an [`ExportTask`]
///
/// Cloneable and usable from any thread. Aborting is idempotent: the task
/// stops at its next checkpoint or chunk boundary, or at once while it waits
/// on the platform.
#[derive(Clone)]
pub struct AbortHandle {
    shared: TaskShared,
}

impl AbortHandle {
    /// Ask the task to stop
    pub fn abort(&self) {
        self.shared.cancel_token.cancel();
        self.shared.state_tx.send_if_modified(|state| {
            if *state != TaskState::Running {
                return false;
            }
            *state = TaskState::Aborting;
            // Under the state lock: cannot be reordered after a terminal transition
            self.shared.emit(Event::StateChanged {
                state: TaskState::Aborting,
            });
            tracing::info!("export abort requested");
            true
        });
    }

    /// Whether an abort was requested
    pub fn is_aborted(&self) -> bool {
        self.shared.cancel_token.is_cancelled()
    }
}

impl std::fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortHandle")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// One export from request to file pair (and optionally a loaded layer)
pub struct ExportTask {
    source: Arc<dyn ExportSource>,
    request: DownloadRequest,
    credentials: Option<Credentials>,
    config: Arc<Config>,
    layer_loader: Option<Arc<dyn LayerLoader>>,
    shared: TaskShared,
}

impl ExportTask {
    /// Create an idle task exporting `request` from `source`
    pub fn new(source: Arc<dyn ExportSource>, request: DownloadRequest, config: Arc<Config>) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (state_tx, _) = watch::channel(TaskState::Idle);
        Self {
            source,
            request,
            credentials: None,
            config,
            layer_loader: None,
            shared: TaskShared {
                event_tx,
                state_tx: Arc::new(state_tx),
                cancel_token: CancellationToken::new(),
            },
        }
    }

    /// Log in with `credentials` first unless the source is already authenticated
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Hand the finished export to `loader`
    pub fn with_layer_loader(mut self, loader: Arc<dyn LayerLoader>) -> Self {
        self.layer_loader = Some(loader);
        self
    }

    /// Subscribe to task events
    ///
    /// Subscribe before running the task; events sent earlier are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.event_tx.subscribe()
    }

    /// Current state
    pub fn state(&self) -> TaskState {
        *self.shared.state_tx.borrow()
    }

    /// Receiver following every state change
    pub fn watch_state(&self) -> watch::Receiver<TaskState> {
        self.shared.state_tx.subscribe()
    }

    /// Handle that aborts this task
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            shared: self.shared.clone(),
        }
    }

    /// Run the task to completion on the current task
    pub async fn run(self) -> TaskOutcome {
        orchestration::run_export_task(self).await
    }

    /// Run the task on the tokio runtime
    pub fn spawn(self) -> TaskHandle {
        let abort = self.abort_handle();
        let state = self.watch_state();
        let join = tokio::spawn(self.run());
        TaskHandle { abort, state, join }
    }
}

impl std::fmt::Debug for ExportTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportTask")
            .field("request", &self.request)
            .field("state", &self.state())
            .field("has_credentials", &self.credentials.is_some())
            .field("has_layer_loader", &self.layer_loader.is_some())
            .finish()
    }
}

/// A spawned [`ExportTask`]
#[derive(Debug)]
pub struct TaskHandle {
    /// Aborts the task
    pub abort: AbortHandle,
    /// Follows the task state
    pub state: watch::Receiver<TaskState>,
    /// Resolves to the outcome
    pub join: tokio::task::JoinHandle<TaskOutcome>,
}

impl TaskHandle {
    /// Ask the task to stop
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Wait for the outcome
    ///
    /// A panicked or runtime-cancelled task is reported as `Failed`, with
    /// the same `Error`, `StateChanged` and `Completed` events a failed run sends.
    pub async fn wait(self) -> TaskOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => finalization::finalize_crashed(&self.abort.shared, &e),
        }
    }
}

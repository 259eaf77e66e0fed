//! Terminal state and notifications of an export task.

use tracing::{error, info, warn};

use crate::error::Result;
use crate::types::{Event, TaskState};
use crate::utils::error_chain;

use super::{TaskOutcome, TaskShared, TaskSuccess};

/// Text shown once the export has been loaded
pub(crate) const DONE_TEXT: &str = "Socioeconomic data loaded in a new layer";

/// Map the run result to an outcome and publish it
///
/// `Completed` is always the last event. Failures emit an `Error`
/// diagnostic first; aborts emit nothing but the state change.
pub(crate) fn finalize_export(shared: &TaskShared, result: Result<TaskSuccess>) -> TaskOutcome {
    let outcome = match result {
        Ok(success) => {
            info!(
                csv = ?success.artifact.csv_path,
                bytes_received = success.artifact.bytes_received,
                layer = success.layer.is_some(),
                "export task succeeded"
            );
            shared.emit(Event::ProgressText {
                text: DONE_TEXT.to_string(),
            });
            TaskOutcome::Succeeded(success)
        }
        Err(e) if e.is_aborted() => {
            info!("export task aborted");
            TaskOutcome::Aborted
        }
        Err(e) => {
            let diagnostic = error_chain(&e);
            warn!(error = %e, code = e.code(), "export task failed");
            shared.emit(Event::Error {
                text: diagnostic.clone(),
            });
            TaskOutcome::Failed {
                code: e.code(),
                diagnostic,
            }
        }
    };

    shared.transition(outcome.state());
    let csv_path = match &outcome {
        TaskOutcome::Succeeded(success) => Some(success.artifact.csv_path.clone()),
        _ => None,
    };
    shared.emit(Event::Completed {
        success: outcome.is_success(),
        csv_path,
    });
    outcome
}

/// Publish a failure for a task that never reached [`finalize_export`]
pub(crate) fn finalize_crashed(shared: &TaskShared, cause: &tokio::task::JoinError) -> TaskOutcome {
    let diagnostic = format!("export task stopped unexpectedly: {}", cause);
    error!(error = %cause, "export task crashed");
    shared.emit(Event::Error {
        text: diagnostic.clone(),
    });
    shared.transition(TaskState::Failed);
    shared.emit(Event::Completed {
        success: false,
        csv_path: None,
    });
    TaskOutcome::Failed {
        code: "task_failed",
        diagnostic,
    }
}

//! Export task lifecycle: login, open export, write files, load layer.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::export::ExportWriter;
use crate::layer::LayerSource;
use crate::types::{Event, TaskState};

use super::finalization::finalize_export;
use super::{ExportTask, TaskOutcome, TaskShared, TaskSuccess};

/// Text shown while the export is being prepared
pub(crate) const START_TEXT: &str = "Loading socioeconomic data from the platform...";

/// Fail with [`Error::Aborted`] once an abort was requested
fn checkpoint(shared: &TaskShared) -> Result<()> {
    if shared.cancel_token.is_cancelled() {
        return Err(Error::Aborted);
    }
    Ok(())
}

/// Await `request`, giving up as soon as an abort is requested
async fn cancellable<T>(
    shared: &TaskShared,
    request: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = shared.cancel_token.cancelled() => Err(Error::Aborted),
        result = request => result,
    }
}

/// Run `task` and publish its terminal state and notifications
pub(crate) async fn run_export_task(task: ExportTask) -> TaskOutcome {
    let shared = task.shared.clone();

    shared.transition(TaskState::Running);
    info!(
        indicators = task.request.indicator_ids().len(),
        geometry = task.request.include_geometry(),
        "export task started"
    );
    shared.emit(Event::ProgressToggled { determinate: false });
    shared.emit(Event::ProgressText {
        text: START_TEXT.to_string(),
    });

    let result = execute(&task).await;
    finalize_export(&shared, result)
}

async fn execute(task: &ExportTask) -> Result<TaskSuccess> {
    let shared = &task.shared;
    checkpoint(shared)?;

    if let Some(credentials) = &task.credentials {
        if task.source.is_authenticated() {
            debug!("session already authenticated, skipping login");
        } else {
            cancellable(shared, task.source.login(credentials)).await?;
        }
    }
    checkpoint(shared)?;

    let body = cancellable(shared, task.source.open_export(&task.request)).await?;
    debug!(declared_len = body.declared_len, "export response accepted");
    checkpoint(shared)?;

    let writer = ExportWriter::new(
        &task.config.export,
        shared.event_tx.clone(),
        shared.cancel_token.clone(),
    );
    let artifact = writer.write(&task.request, body).await?;
    checkpoint(shared)?;

    let layer = match &task.layer_loader {
        Some(loader) => {
            let source = LayerSource::for_artifact(
                &artifact,
                task.request.include_geometry(),
                &task.config.layer,
            )?;
            debug!(uri = %source.uri, "loading layer");
            Some(loader.load_layer(&source).await?)
        }
        None => None,
    };

    Ok(TaskSuccess { artifact, layer })
}

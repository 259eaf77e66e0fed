//! Streaming export of indicator data to a CSV/CSVT file pair.
//!
//! - [`ExportSource`] - where an export body comes from (the platform session in production)
//! - [`ExportWriter`] - streams a body to disk in bounded chunks, reporting progress
//! - [`descriptor`] - `.csvt` type descriptor generation
//!
//! Output files are never removed here, not even after an abort or a write
//! error: the layer loader reads the same path after the task returns,
//! possibly from another thread.

pub mod descriptor;


use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::types::{Credentials, DownloadRequest, Event, ExportArtifact};
use crate::utils::{format_megabytes, progress_percent};

/// An export response whose status has been accepted, body not yet read
pub struct ExportBody {
    /// Content length announced by the platform
    pub declared_len: u64,
    /// Response body
    pub stream: BoxStream<'static, std::io::Result<Bytes>>,
}

impl std::fmt::Debug for ExportBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportBody")
            .field("declared_len", &self.declared_len)
            .finish_non_exhaustive()
    }
}

/// Abstraction over the platform session, enabling testability.
#[async_trait::async_trait]
pub trait ExportSource: Send + Sync {
    /// Whether a login already succeeded
    fn is_authenticated(&self) -> bool;

    /// Authenticate the session
    async fn login(&self, credentials: &Credentials) -> Result<()>;

    /// Start the bulk export for `request`
    ///
    /// Must not touch the filesystem: a rejected request leaves no files behind.
    async fn open_export(&self, request: &DownloadRequest) -> Result<ExportBody>;
}

/// Parse the `Content-Length` the export endpoint is required to send
///
/// # Errors
/// Returns [`Error::Protocol`] if the header is missing or not a number.
pub fn declared_length(headers: &HeaderMap) -> Result<u64> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or_else(|| Error::Protocol("export response has no Content-Length".to_string()))?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| Error::Protocol(format!("invalid Content-Length header: {:?}", value)))
}

/// Writes export bodies to disk
pub struct ExportWriter {
    output_dir: PathBuf,
    file_prefix: String,
    chunk_size: usize,
    event_tx: tokio::sync::broadcast::Sender<Event>,
    cancel_token: CancellationToken,
}

impl ExportWriter {
    /// Create a writer that reports on `event_tx` and stops when `cancel_token` is cancelled
    pub fn new(
        config: &ExportConfig,
        event_tx: tokio::sync::broadcast::Sender<Event>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            output_dir: config.resolved_output_dir(),
            file_prefix: config.file_prefix.clone(),
            chunk_size: config.chunk_size.max(1),
            event_tx,
            cancel_token,
        }
    }

    /// Stream `body` into a new CSV file next to its type descriptor
    ///
    /// # Errors
    /// - [`Error::Aborted`] when cancelled between chunks; the partial CSV stays on disk
    /// - [`Error::Io`] on local write failures or a broken body stream
    pub async fn write(
        &self,
        request: &DownloadRequest,
        body: ExportBody,
    ) -> Result<ExportArtifact> {
        let ExportBody {
            declared_len,
            stream,
        } = body;

        let (file, csv_path) = self.create_csv_file().await?;
        let csvt_path = descriptor_path(&csv_path);
        descriptor::write_type_descriptor(&csvt_path, request).await?;
        debug!(csv = ?csv_path, csvt = ?csvt_path, "export files created");

        self.event_tx
            .send(Event::ProgressToggled { determinate: true })
            .ok();
        self.event_tx
            .send(Event::ProgressText {
                text: format!("Downloading {}", format_megabytes(declared_len)),
            })
            .ok();

        let bytes_received = self.stream_to_file(stream, declared_len, file).await?;

        info!(
            csv = ?csv_path,
            declared_len,
            bytes_received,
            "export written"
        );
        Ok(ExportArtifact {
            csv_path,
            csvt_path,
            declared_len,
            bytes_received,
        })
    }

    /// Create a uniquely named CSV file that survives this process
    async fn create_csv_file(&self) -> Result<(tokio::fs::File, PathBuf)> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let dir = self.output_dir.clone();
        let prefix = self.file_prefix.clone();
        let (file, path) = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".csv")
                .tempfile_in(&dir)?
                .keep()
                .map_err(|e| e.error)
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok((tokio::fs::File::from_std(file), path))
    }

    /// Copy `stream` into `file` one chunk at a time; returns the bytes written
    pub(crate) async fn stream_to_file<S>(
        &self,
        stream: S,
        declared_len: u64,
        mut file: tokio::fs::File,
    ) -> Result<u64>
    where
        S: futures::Stream<Item = std::io::Result<Bytes>>,
    {
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);

        let mut buf = vec![0u8; self.chunk_size];
        let mut received: u64 = 0;
        let mut last_percent = None;

        loop {
            // A stalled body must not outlive an abort
            let n = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => None,
                read = reader.read(&mut buf) => Some(read?),
            };
            let Some(n) = n else {
                return self.abort(&mut file, received, declared_len).await;
            };
            if n == 0 {
                break;
            }
            if self.cancel_token.is_cancelled() {
                return self.abort(&mut file, received, declared_len).await;
            }

            file.write_all(&buf[..n]).await?;
            received += n as u64;

            // At most one event per percentage point
            let percent = progress_percent(received, declared_len);
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                self.event_tx.send(Event::Progress { percent }).ok();
            }
        }

        file.flush().await?;
        Ok(received)
    }

    async fn abort(&self, file: &mut tokio::fs::File, received: u64, declared_len: u64) -> Result<u64> {
        file.flush().await?;
        info!(bytes_received = received, declared_len, "export aborted");
        Err(Error::Aborted)
    }
}

/// Sidecar path for a CSV path: same stem, `.csvt` extension
pub fn descriptor_path(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("csvt")
}

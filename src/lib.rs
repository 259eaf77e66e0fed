//! # sv-downloader
//!
//! Async client for downloading socioeconomic indicator data from an
//! OpenQuake-style platform into a CSV file with a `.csvt` type descriptor.
//!
//! ## Design Philosophy
//!
//! sv-downloader is designed to be:
//! - **Library-first** - No CLI or UI; the host application loads the layer
//! - **Event-driven** - Consumers subscribe to progress events, no polling required
//! - **Cancelable** - Every export can be aborted between chunks from any thread
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sv_downloader::{Config, Credentials, DownloadRequest, ExportTask, SessionClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     config.validate()?;
//!
//!     let session = Arc::new(SessionClient::new(&config.platform)?);
//!     let request = DownloadRequest::new(["GDP", "LIT"], true)?;
//!     let task = ExportTask::new(session, request, config)
//!         .with_credentials(Credentials::new("user", "pass"));
//!
//!     // Subscribe to events
//!     let mut events = task.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let outcome = task.spawn().wait().await;
//!     println!("Outcome: {:?}", outcome);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Platform session and metadata listings
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Streaming export to CSV/CSVT files
pub mod export;
/// Layer hand-off
pub mod layer;
/// Cancelable export task
pub mod task;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use client::SessionClient;
pub use config::{Config, ExportConfig, LayerConfig, PlatformConfig};
pub use error::{Error, Result};
pub use export::{ExportBody, ExportSource, ExportWriter};
pub use layer::{LayerLoader, LayerSource, LoadedLayer};
pub use task::{AbortHandle, ExportTask, TaskHandle, TaskOutcome, TaskSuccess};
pub use types::{
    Credentials, DownloadRequest, Event, ExportArtifact, IndicatorFilter, IndicatorInfo,
    TaskState,
};

/// Run an export, aborting it on a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// A handler that cannot be registered never fires; the export then runs to
/// completion unless another signal arrives.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sv_downloader::{Config, DownloadRequest, ExportTask, SessionClient, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Config::default());
///     let session = Arc::new(SessionClient::new(&config.platform)?);
///     let request = DownloadRequest::new(["GDP"], false)?;
///
///     // Ctrl+C stops the download at the next chunk
///     let outcome = run_with_shutdown(ExportTask::new(session, request, config)).await;
///     println!("{:?}", outcome);
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(task: ExportTask) -> TaskOutcome {
    let handle = task.spawn();
    let abort = handle.abort.clone();
    let outcome = handle.wait();
    tokio::pin!(outcome);

    tokio::select! {
        result = &mut outcome => result,
        _ = wait_for_signal() => {
            abort.abort();
            outcome.await
        }
    }
}

/// Wait for a signal that still needs an answer
///
/// Handlers that cannot be registered never fire, so the export is not
/// aborted because of a restricted environment (containers, tests).
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    fn register(kind: SignalKind, name: &str) -> Option<Signal> {
        signal(kind)
            .inspect_err(|e| tracing::warn!(error = %e, signal = name, "could not register handler"))
            .ok()
    }

    let sigterm = register(SignalKind::terminate(), "SIGTERM");
    let sigint = register(SignalKind::interrupt(), "SIGINT");

    tokio::select! {
        _ = recv_signal(sigterm) => {
            tracing::info!("SIGTERM received, aborting export");
        }
        _ = recv_signal(sigint) => {
            tracing::info!("SIGINT received, aborting export");
        }
    }
}

/// Resolve on the next delivery of `signal`; an unregistered handler never resolves
#[cfg(unix)]
async fn recv_signal(signal: Option<tokio::signal::unix::Signal>) {
    match signal {
        Some(mut signal) => {
            signal.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Ctrl+C received, aborting export");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}

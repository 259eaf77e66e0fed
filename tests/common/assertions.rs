//! Event collection helpers for integration tests

use std::path::Path;
use std::time::Duration;

use tokio::sync::broadcast;

use sv_downloader::Event;

/// Collect events until `Completed`, or until `timeout` elapses
///
/// Panics on timeout or if the channel closes first.
pub async fn collect_until_completed(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let result = tokio::time::timeout(timeout, async {
        let mut seen = Vec::new();
        loop {
            match events.recv().await {
                Ok(event) => {
                    let done = matches!(event, Event::Completed { .. });
                    seen.push(event);
                    if done {
                        return seen;
                    }
                }
                Err(e) => panic!("event channel failed before completion: {e}"),
            }
        }
    })
    .await;

    match result {
        Ok(seen) => seen,
        Err(_) => panic!("no Completed event within {timeout:?}"),
    }
}

/// Percentages of every `Progress` event, in order
pub fn progress_values(events: &[Event]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

/// Assert that `dir` contains no files
pub fn assert_dir_empty(dir: &Path) {
    let entries: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert!(entries.is_empty(), "unexpected files: {entries:?}");
}

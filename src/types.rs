//! Core types for sv-downloader

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Login credentials for the platform
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A validated request for one bulk export
///
/// The indicator set is fixed once the request is built: it drives both the
/// query sent to the platform and the shape of the type descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    indicator_ids: Vec<String>,
    include_geometry: bool,
}

impl DownloadRequest {
    /// Build a request from indicator codes
    ///
    /// Fails with [`Error::InvalidRequest`] if no codes are given, or if a code
    /// is blank or contains a comma.
    pub fn new<I, S>(indicator_ids: I, include_geometry: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let indicator_ids: Vec<String> = indicator_ids
            .into_iter()
            .map(|id| id.into().trim().to_string())
            .collect();

        if indicator_ids.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one indicator must be selected".to_string(),
            ));
        }
        for id in &indicator_ids {
            if id.is_empty() {
                return Err(Error::InvalidRequest(
                    "indicator codes must not be blank".to_string(),
                ));
            }
            if id.contains(',') {
                return Err(Error::InvalidRequest(format!(
                    "indicator code '{}' contains a comma",
                    id
                )));
            }
        }

        Ok(Self {
            indicator_ids,
            include_geometry,
        })
    }

    /// Build a request from selection-list labels such as `"GDP: Gross domestic product"`
    ///
    /// Only the part before the first `:` is kept as the indicator code.
    pub fn from_selection_labels<I, S>(labels: I, include_geometry: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes: Vec<String> = labels
            .into_iter()
            .map(|label| {
                let label = label.as_ref();
                label.split(':').next().unwrap_or(label).to_string()
            })
            .collect();
        Self::new(codes, include_geometry)
    }

    /// Indicator codes in selection order
    pub fn indicator_ids(&self) -> &[String] {
        &self.indicator_ids
    }

    /// Whether a WKT geometry column is requested
    pub fn include_geometry(&self) -> bool {
        self.include_geometry
    }

    /// Codes joined with commas, as the export endpoint expects them
    pub fn joined_ids(&self) -> String {
        self.indicator_ids.join(",")
    }
}

/// Metadata of one indicator published by the platform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorInfo {
    /// Indicator code (used in export requests)
    pub code: String,
    /// Human-readable name
    pub name: String,
    /// Theme the indicator belongs to
    pub theme: String,
    /// Subtheme within the theme
    pub subtheme: String,
    /// Free-text description
    pub description: String,
    /// How the quantity is measured (e.g. "Percentage")
    pub measurement_type: String,
    /// Data source
    pub source: String,
    /// Aggregation method used for zonal values
    pub aggregation_method: String,
    /// Keywords as published (comma-separated)
    pub keywords: String,
}

/// Optional filters for the indicator metadata listing
///
/// Unset fields are left out of the query string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorFilter {
    /// Substring of the indicator name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Comma-separated keywords
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Theme name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Subtheme name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtheme: Option<String>,
}

/// Files produced by one export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    /// CSV payload as streamed from the platform
    pub csv_path: PathBuf,
    /// Type descriptor sidecar (same stem, `.csvt` extension)
    pub csvt_path: PathBuf,
    /// Content length announced by the platform
    pub declared_len: u64,
    /// Bytes actually written to `csv_path`
    pub bytes_received: u64,
}

/// Lifecycle state of an export task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Created, not started
    Idle,
    /// Working
    Running,
    /// Abort requested, waiting for the next checkpoint
    Aborting,
    /// Export complete and handed off
    Succeeded,
    /// Stopped on an error
    Failed,
    /// Stopped on request
    Aborted,
}

impl TaskState {
    /// Whether the task can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Aborted
        )
    }
}

/// Notification emitted by an export task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task state changed
    StateChanged {
        /// New state
        state: TaskState,
    },

    /// Whether `Progress` percentages are meaningful from now on
    ProgressToggled {
        /// `false` while the total size is unknown
        determinate: bool,
    },

    /// Human-readable progress message
    ProgressText {
        /// Message text
        text: String,
    },

    /// Download progress (0 to 100)
    Progress {
        /// Percentage of the declared length received so far
        percent: u8,
    },

    /// Failure diagnostic, emitted once before a failed `Completed`
    Error {
        /// Error message including its causes
        text: String,
    },

    /// Task finished; emitted exactly once
    Completed {
        /// `true` only for a successful export
        success: bool,
        /// Exported CSV when successful
        #[serde(skip_serializing_if = "Option::is_none")]
        csv_path: Option<PathBuf>,
    },
}

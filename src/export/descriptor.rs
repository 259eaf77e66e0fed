//! `.csvt` type descriptors.
//!
//! Delimited-text readers treat every column as text unless a sibling file
//! with the same stem and a `.csvt` extension declares the column types. The
//! export always starts with two text identifier columns (zone code and zone
//! name), then one numeric column per indicator, then the WKT geometry when
//! it was requested.

use std::path::Path;

use crate::error::Result;
use crate::types::DownloadRequest;

/// Column type understood by delimited-text readers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Text column
    String,
    /// Floating point column
    Real,
}

impl ColumnType {
    fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Real => "Real",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.as_str())
    }
}

/// Column types of an export with `indicator_count` indicators
pub fn column_types(indicator_count: usize, include_geometry: bool) -> Vec<ColumnType> {
    let mut types = Vec::with_capacity(indicator_count + 3);
    types.extend([ColumnType::String, ColumnType::String]);
    types.extend(std::iter::repeat_n(ColumnType::Real, indicator_count));
    if include_geometry {
        types.push(ColumnType::String);
    }
    types
}

/// Descriptor line, e.g. `"String","String","Real","String"`
pub fn type_descriptor(indicator_count: usize, include_geometry: bool) -> String {
    column_types(indicator_count, include_geometry)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Write the descriptor matching `request` to `path`
pub async fn write_type_descriptor(path: &Path, request: &DownloadRequest) -> Result<()> {
    let line = type_descriptor(request.indicator_ids().len(), request.include_geometry());
    tokio::fs::write(path, line).await?;
    Ok(())
}

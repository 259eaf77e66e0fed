//! Hand-off of a finished export to a map layer loader.
//!
//! The export is loaded as a delimited-text layer. The reader needs to know
//! how many preamble lines to skip and, when geometries were exported, which
//! column holds the WKT and in which reference system.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::LayerConfig;
use crate::error::{Error, Result};
use crate::types::ExportArtifact;

/// Everything a layer loader needs to open an export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSource {
    /// Data source URI, e.g. `file:///tmp/x.csv?delimiter=,&skipLines=25&trimFields=yes`
    pub uri: String,
    /// Display name of the layer
    pub name: String,
    /// Data provider key
    pub provider: String,
}

impl LayerSource {
    /// Build the source for `artifact`
    ///
    /// # Errors
    /// Returns [`Error::InvalidLayer`] if the CSV path cannot be expressed as a file URL.
    pub fn for_artifact(
        artifact: &ExportArtifact,
        include_geometry: bool,
        config: &LayerConfig,
    ) -> Result<Self> {
        Ok(Self {
            uri: delimited_text_uri(&artifact.csv_path, include_geometry, config)?,
            name: config.layer_name.clone(),
            provider: config.provider.clone(),
        })
    }
}

fn delimited_text_uri(path: &Path, include_geometry: bool, config: &LayerConfig) -> Result<String> {
    let mut url = Url::from_file_path(path).map_err(|()| {
        Error::InvalidLayer(format!("not an absolute file path: {}", path.display()))
    })?;

    let mut query = String::from("delimiter=,");
    if include_geometry {
        query.push_str(&format!("&crs={}", config.crs));
    }
    query.push_str(&format!("&skipLines={}&trimFields=yes", config.skip_lines));
    if include_geometry {
        query.push_str(&format!("&wktField={}", config.geometry_field));
    }
    url.set_query(Some(&query));

    Ok(url.into())
}

/// Layer created by a [`LayerLoader`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedLayer {
    /// Identifier assigned by the host application
    pub id: String,
    /// Display name
    pub name: String,
}

/// Host-side collaborator that turns a [`LayerSource`] into a map layer
#[async_trait::async_trait]
pub trait LayerLoader: Send + Sync {
    /// Load the layer
    ///
    /// # Errors
    /// Implementations report an unreadable source as [`Error::InvalidLayer`].
    async fn load_layer(&self, source: &LayerSource) -> Result<LoadedLayer>;
}

//! Test configuration helpers pointing a session at a mock platform

use std::sync::Arc;

use tempfile::TempDir;
use wiremock::MockServer;

use sv_downloader::config::ExportConfig;
use sv_downloader::{Config, SessionClient};

/// Configuration for `server`, writing exports into a fresh temporary directory
///
/// The chunk size is larger than any fixture so each transport chunk is read whole.
pub fn config_for(server: &MockServer) -> (Arc<Config>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::for_host(server.uri());
    config.export = ExportConfig {
        output_dir: Some(temp_dir.path().to_path_buf()),
        chunk_size: 64 * 1024,
        ..Default::default()
    };
    config.validate().unwrap();
    (Arc::new(config), temp_dir)
}

/// Session and configuration for `server`
pub fn session_for(server: &MockServer) -> (Arc<SessionClient>, Arc<Config>, TempDir) {
    let (config, temp_dir) = config_for(server);
    let session = Arc::new(SessionClient::new(&config.platform).unwrap());
    (session, config, temp_dir)
}

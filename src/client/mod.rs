//! Authenticated session against the data platform.
//!
//! [`SessionClient`] owns one cookie-backed HTTP session. It logs in once,
//! reads the theme/subtheme/indicator listings, and opens the streaming bulk
//! export consumed by [`crate::export::ExportWriter`].

pub mod endpoints;
mod parsing;


use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::TryStreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PlatformConfig;
use crate::error::{Error, Result};
use crate::export::{ExportBody, ExportSource, declared_length};
use crate::types::{Credentials, DownloadRequest, IndicatorFilter, IndicatorInfo};

/// Empty query string for endpoints without parameters
const NO_QUERY: &[(&str, &str)] = &[];

/// Query string of the bulk export endpoint
#[derive(Serialize)]
struct ExportQuery {
    sv_variables_ids: String,
    /// The platform expects Python-style booleans
    export_geometries: &'static str,
}

/// HTTP session with the platform
pub struct SessionClient {
    /// Cookie-backed HTTP client shared by every request
    http: reqwest::Client,

    /// Base URL without trailing slash
    host: String,

    /// Login endpoint path
    login_path: String,

    /// Per-request timeout of the metadata listings
    metadata_timeout: std::time::Duration,

    /// Set once a login succeeded
    authenticated: AtomicBool,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("host", &self.host)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionClient {
    /// Create a session for the configured platform
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the HTTP client cannot be created
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| {
                Error::config(format!("failed to create HTTP client: {}", e), "platform")
            })?;

        Ok(Self {
            http,
            host: config.host.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            metadata_timeout: config.metadata_timeout,
            authenticated: AtomicBool::new(false),
        })
    }

    /// Base URL of the platform
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether a login succeeded on this session
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// Exchange credentials for a session cookie
    ///
    /// # Errors
    /// Returns [`Error::Authentication`] with the response body when the
    /// platform does not answer with a success status.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        debug!(host = %self.host, username, "logging in");

        let response = self
            .http
            .post(self.url(&self.login_path))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "login rejected");
            return Err(Error::Authentication(body));
        }

        self.authenticated.store(true, Ordering::Release);
        info!(host = %self.host, "session authenticated");
        Ok(())
    }

    /// GET a metadata endpoint and return its body, failing on non-success status
    async fn get_metadata<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Vec<u8>> {
        debug!(endpoint = path, "requesting metadata");

        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .timeout(self.metadata_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = path, status = status.as_u16(), "metadata request failed");
            return Err(Error::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Names of every theme
    pub async fn get_themes(&self) -> Result<Vec<String>> {
        let body = self.get_metadata(endpoints::THEMES, NO_QUERY).await?;
        parsing::parse_first_row(&body)
    }

    /// Names of the subthemes of `theme`
    pub async fn get_subthemes(&self, theme: &str) -> Result<Vec<String>> {
        let body = self
            .get_metadata(endpoints::SUBTHEMES_BY_THEME, &[("theme", theme)])
            .await?;
        parsing::parse_first_row(&body)
    }

    /// Indicator metadata matching `filter`, keyed by indicator code
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if a data row has fewer than nine columns.
    pub async fn get_indicator_metadata(
        &self,
        filter: &IndicatorFilter,
    ) -> Result<BTreeMap<String, IndicatorInfo>> {
        let body = self.get_metadata(endpoints::INDICATORS_INFO, filter).await?;
        let indicators = parsing::parse_indicators(&body)?;
        debug!(count = indicators.len(), "indicator metadata received");
        Ok(indicators)
    }
}

#[async_trait::async_trait]
impl ExportSource for SessionClient {
    fn is_authenticated(&self) -> bool {
        SessionClient::is_authenticated(self)
    }

    async fn login(&self, credentials: &Credentials) -> Result<()> {
        SessionClient::login(self, &credentials.username, &credentials.password).await
    }

    async fn open_export(&self, request: &DownloadRequest) -> Result<ExportBody> {
        let query = ExportQuery {
            sv_variables_ids: request.joined_ids(),
            export_geometries: if request.include_geometry() {
                "True"
            } else {
                "False"
            },
        };
        debug!(
            indicators = request.indicator_ids().len(),
            geometry = request.include_geometry(),
            "requesting export"
        );

        let response = self
            .http
            .get(self.url(endpoints::EXPORT_BY_IDS))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "export request failed");
            return Err(Error::Download {
                status: status.as_u16(),
                body,
            });
        }

        let declared_len = declared_length(response.headers())?;
        let stream = response.bytes_stream().map_err(std::io::Error::other);

        Ok(ExportBody {
            declared_len,
            stream: Box::pin(stream),
        })
    }
}

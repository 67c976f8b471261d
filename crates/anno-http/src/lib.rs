//! REST adapter for the annotation server
//!
//! [`HttpAnnotationApi`] implements [`AnnotationApi`] over `reqwest`:
//! - unit data is a `GET` of the configured unit URL; the body is a JSON
//!   object keyed by unit id
//! - submissions are form posts to the configured API URL
//!
//! # Example
//!
//! ```rust,ignore
//! use anno_core::{EngineConfig, TaskOrchestrator};
//! use anno_http::HttpAnnotationApi;
//!
//! let config = EngineConfig::from_file("annotation.toml")?;
//! let api = std::sync::Arc::new(HttpAnnotationApi::new(&config)?);
//! let orchestrator = TaskOrchestrator::new(config, api, grid, store);
//! ```

#![warn(unreachable_pub)]

use anno_core::{AnnotationApi, ApiError, EngineConfig};
use anno_model::{SubmitForm, SubmitResponse, UnitId, UnitRecord};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::fmt;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("anno-http/", env!("CARGO_PKG_VERSION"));

/// [`AnnotationApi`] backed by the annotation server's REST endpoints
#[derive(Clone)]
pub struct HttpAnnotationApi {
    client: Client,
    config: EngineConfig,
}

impl fmt::Debug for HttpAnnotationApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAnnotationApi")
            .field("api_url", &self.config.api_url)
            .field("unit_data_url", &self.config.unit_data_url)
            .finish_non_exhaustive()
    }
}

impl HttpAnnotationApi {
    /// Create a client for the URLs of `config`
    ///
    /// # Errors
    /// Returns [`ApiError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ApiError::Transport(format!("failed to initialize HTTP client: {err}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Use a prepared client
    #[must_use]
    pub fn with_client(client: Client, config: &EngineConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl AnnotationApi for HttpAnnotationApi {
    async fn fetch_unit(&self, unit: UnitId) -> Result<UnitRecord, ApiError> {
        let url = self.config.unit_url(unit);
        debug!(%unit, %url, "fetching unit");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| ApiError::Transport(format!("failed to fetch unit {unit}: {err}")))?;
        let body = read_body(response).await?;

        let mut units: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))?;
        let row = units
            .remove(&unit.to_string())
            .ok_or(ApiError::MissingUnit(unit))?;
        serde_json::from_value(row).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn submit(&self, form: SubmitForm) -> Result<SubmitResponse, ApiError> {
        let action = form.action_kind();
        let unit = form.unit_id();
        debug!(%unit, %action, url = %self.config.api_url, "posting form");
        let response = self
            .client
            .post(&self.config.api_url)
            .form(&form.into_pairs())
            .send()
            .await
            .map_err(|err| ApiError::Transport(format!("failed to post {action}: {err}")))?;
        let body = read_body(response).await?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

async fn read_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ApiError::Transport(format!("failed to read response: {err}")))?;
    if !status.is_success() {
        warn!(%status, "annotation server returned an error status");
        return Err(ApiError::Status(status.as_u16()));
    }
    Ok(body)
}

//! # Console API Client
//!
//! HTTP adapter for the console REST API: task status resources for the
//! poller and the health details tree for the analyzer.

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::{ApiConfig, ConfigurationError, HealthConfig};
use crate::constants::DEFAULT_HEALTH_MAX_DEPTH;
use crate::error::{Result, TaskwatchError};
use crate::health::HealthFeature;
use crate::polling::{TaskDocument, TaskStatusFetcher};

/// HTTP client for task status and health details
#[derive(Debug, Clone)]
pub struct ConsoleApiClient {
    client: Client,
    base_url: Url,
    config: ApiConfig,
    health_max_depth: usize,
}

impl ConsoleApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ConfigurationError::invalid_value("api.base_url", config.base_url.clone(), e.to_string())
        })?;

        let mut client_builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("taskwatch-core/{}", env!("CARGO_PKG_VERSION")));

        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            let mut default_headers = header::HeaderMap::new();
            let value = format!("Bearer {token}")
                .parse::<header::HeaderValue>()
                .map_err(|_| {
                    ConfigurationError::invalid_value(
                        "api.auth_token",
                        "[redacted]",
                        "token is not a valid header value",
                    )
                })?;
            default_headers.insert(header::AUTHORIZATION, value);
            client_builder = client_builder.default_headers(default_headers);
            debug!("Configured Bearer token authentication");
        }

        let client = client_builder.build()?;

        Ok(Self {
            client,
            base_url,
            config,
            health_max_depth: DEFAULT_HEALTH_MAX_DEPTH,
        })
    }

    /// Apply the health section, bounding how deep details trees are parsed
    pub fn with_health_config(mut self, health: &HealthConfig) -> Self {
        self.health_max_depth = health.max_depth;
        self
    }

    /// URL of one task resource; the id is percent-encoded as a path segment
    pub fn task_url(&self, task_id: &str) -> Result<Url> {
        let mut url = self.resolve(&self.config.tasks_path)?;
        url.path_segments_mut()
            .map_err(|_| TaskwatchError::Internal(format!("cannot extend URL {}", self.base_url)))?
            .pop_if_empty()
            .push(task_id);
        url.query_pairs_mut().append_pair("output_mode", "json");
        Ok(url)
    }

    pub fn health_url(&self) -> Result<Url> {
        let mut url = self.resolve(&self.config.health_path)?;
        url.query_pairs_mut().append_pair("output_mode", "json");
        Ok(url)
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            TaskwatchError::Configuration(ConfigurationError::invalid_value(
                "api path",
                path.to_string(),
                e.to_string(),
            ))
        })
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(url = %url, "GET console resource");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json::<Value>().await?)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(url = %url, status = %status, error = %error_text, "Console API request failed");
            Err(TaskwatchError::api_error(status.as_u16(), error_text))
        }
    }

    /// Fetch and parse the health details tree
    pub async fn fetch_health_details(&self) -> Result<HealthFeature> {
        let body = self.get_json(self.health_url()?).await?;
        self.parse_health_details(&body)
    }

    /// Parse a health details body within the configured depth
    ///
    /// The resource answers either with the tree itself or with an
    /// `entry` list whose first element is the tree.
    pub fn parse_health_details(&self, body: &Value) -> Result<HealthFeature> {
        let document = body
            .get("entry")
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
            .unwrap_or(body);
        Ok(HealthFeature::from_document_with_depth(
            document,
            self.health_max_depth,
        )?)
    }
}

#[async_trait]
impl TaskStatusFetcher for ConsoleApiClient {
    async fn fetch_task(&self, task_id: &str) -> Result<TaskDocument> {
        let body = self.get_json(self.task_url(task_id)?).await?;
        let document = TaskDocument::from_response(body)?;

        debug!(
            task_id = %task_id,
            state = ?document.state,
            "Retrieved task status"
        );
        Ok(document)
    }
}

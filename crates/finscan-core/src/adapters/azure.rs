//! Azure Document Intelligence client.
//!
//! Submits the document to `documentModels/{model}:analyze`, then polls the
//! returned `Operation-Location` until the analysis succeeds or fails.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{FinscanError, OcrError};
use crate::models::config::OcrConfig;
use crate::models::document::DocumentKind;
use crate::ports::{OcrClient, OcrSource};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "Operation-Location";

/// OCR client for the Azure Document Intelligence REST API.
#[derive(Debug, Clone)]
pub struct AzureDocumentClient {
    http: Client,
    endpoint: String,
    api_key: String,
    config: OcrConfig,
}

impl AzureDocumentClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        config: OcrConfig,
    ) -> Result<Self, FinscanError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FinscanError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            config,
        })
    }

    /// Build a client from configuration, reading the endpoint and key from
    /// the environment variables it names.
    pub fn from_config(config: &OcrConfig) -> Result<Self, FinscanError> {
        let endpoint = match &config.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => read_env(&config.endpoint_env)?,
        };
        let api_key = read_env(&config.api_key_env)?;

        Self::new(endpoint, api_key, config.clone())
    }

    fn analyze_url(&self, kind: DocumentKind) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.endpoint,
            self.config.model_for(kind),
            self.config.api_version
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, OcrError> {
        let response = request
            .header(KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(OcrError::new(
            Some(status.as_u16()),
            format!("{}: {}", status, body),
        ))
    }

    async fn poll(&self, operation_url: &str) -> Result<Value, OcrError> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 1..=self.config.max_polls {
            tokio::time::sleep(interval).await;

            let response = self.send(self.http.get(operation_url)).await?;
            let mut body: Value = response.json().await.map_err(transport_error)?;
            let status = body
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            debug!("Poll {} returned status {}", attempt, status);

            match status.as_str() {
                "succeeded" => {
                    return body
                        .get_mut("analyzeResult")
                        .map(Value::take)
                        .ok_or_else(|| OcrError::new(None, "response has no analyzeResult"));
                }
                "failed" | "canceled" => {
                    let detail = body
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .unwrap_or("analysis failed");
                    return Err(OcrError::new(Some(400), detail));
                }
                _ => {}
            }
        }

        Err(OcrError::new(
            Some(408),
            format!("analysis did not finish after {} polls", self.config.max_polls),
        ))
    }
}

#[async_trait]
impl OcrClient for AzureDocumentClient {
    async fn analyze(&self, kind: DocumentKind, source: OcrSource<'_>) -> Result<Value, OcrError> {
        let request = self.http.post(self.analyze_url(kind));
        let request = match source {
            OcrSource::Bytes(bytes) => request
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes.to_vec()),
            OcrSource::Url(url) => request.json(&json!({ "urlSource": url })),
        };

        let response = self.send(request).await?;
        let operation_url = response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| OcrError::new(None, "response has no Operation-Location header"))?;

        info!("Analysis started with model {}", self.config.model_for(kind));
        self.poll(&operation_url).await
    }

    fn provider_name(&self) -> &str {
        "azure-document-intelligence"
    }
}

fn read_env(name: &str) -> Result<String, FinscanError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| FinscanError::Config(format!("environment variable {} is not set", name)))
}

fn transport_error(e: reqwest::Error) -> OcrError {
    let status = if e.is_timeout() {
        Some(408)
    } else {
        e.status().map(|s| s.as_u16())
    };
    OcrError::new(status, e.to_string())
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use ghostpen_core::errors::GatewayError;
use ghostpen_core::provider::{LlmProvider, ModelRequest, ModelResponse};
use ghostpen_core::security::ApiKey;

use crate::converter::{self, RequestOptions};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Non-streaming client for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
    options: RequestOptions,
}

impl AnthropicProvider {
    pub fn new(api_key: ApiKey, model: impl Into<String>) -> Result<Self, GatewayError> {
        Self::build(api_key, model.into(), DEFAULT_TIMEOUT)
    }

    fn build(api_key: ApiKey, model: String, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
            options: RequestOptions::default(),
        })
    }

    /// Whole-request timeout. Rebuilds the HTTP client.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, GatewayError> {
        let Self {
            api_key,
            model,
            base_url,
            options,
            ..
        } = self;
        let mut rebuilt = Self::build(api_key, model, timeout)?;
        rebuilt.base_url = base_url;
        rebuilt.options = options;
        Ok(rebuilt)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = max_tokens;
        self
    }

    /// Enable the provider-side web search tool with a per-request use cap.
    pub fn with_web_search(mut self, max_uses: Option<u32>) -> Self {
        self.options.web_search = max_uses;
        self
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::NetworkError(e.to_string())
        }
    }
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, GatewayError> {
        let body = converter::build_request_body(&request, &self.options, &self.model);

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", API_VERSION)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let delay = retry_after(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            return Err(match GatewayError::from_status(status, body) {
                GatewayError::RateLimited { .. } => GatewayError::RateLimited { retry_after: delay },
                other => other,
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let response = converter::parse_response(&json)?;

        debug!(
            stop_reason = ?response.stop_reason,
            blocks = response.content.len(),
            input = response.usage.input,
            output = response.usage.output,
            "model response"
        );
        Ok(response)
    }
}

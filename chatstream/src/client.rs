//! HTTP client for the chat completions endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::message::ChatRequest;
use crate::stream::CompletionStream;
use crate::types::{ChatCompletionBody, ErrorResponse};

/// Chat completions client for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct ChatClient {
    config: Arc<ClientConfig>,
    client: Client,
}

impl ChatClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        // Per-wait limits only; the stream as a whole has no deadline.
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            let timeout = Duration::from_secs(timeout);
            builder = builder.connect_timeout(timeout).read_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`] and [`ChatClient::new`].
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the default model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the chat completions URL.
    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Build an authenticated JSON POST.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "text/event-stream");

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        req
    }

    /// Sends `request` and returns the open event feed.
    ///
    /// Blocks until the server accepts the request and sends response headers.
    ///
    /// # Errors
    ///
    /// Returns a network error if the connection fails, or an auth /
    /// provider / HTTP status error if the server rejects the request.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<CompletionStream> {
        let url = self.chat_url();
        let body = ChatCompletionBody::streaming(request, &self.config.model);

        tracing::debug!(url = %url, model = body.model, messages = body.messages.len(), "opening stream");

        let response = self.build_request(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text));
        }

        Ok(CompletionStream::from_response(response))
    }

    /// Parse an error response from the API.
    pub(crate) fn parse_error(status: u16, body: &str) -> Error {
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
            let error = error_response.error;

            return match status {
                401 | 403 => Error::auth("openai", error.message),
                429 => Error::rate_limited("openai"),
                _ => {
                    let code = error
                        .code
                        .or(error.error_type)
                        .unwrap_or_else(|| status.to_string());
                    Error::provider_code("openai", code, error.message)
                }
            };
        }

        Error::http_status(status, body.to_owned())
    }
}

//! Client configuration.

use crate::error::{Error, Result};

/// Configuration for the chat client.
///
/// The API key lives here and is handed to [`ChatClient`](crate::ChatClient)
/// at construction; nothing reads it from global state afterwards.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key for bearer authentication.
    pub api_key: String,
    /// Base URL for the API (defaults to OpenAI's API).
    pub base_url: String,
    /// Default model to use when a request leaves it empty.
    pub model: String,
    /// Optional organization ID.
    pub organization: Option<String>,
    /// Idle timeout in seconds: the longest wait for the connection or for
    /// the next chunk of the stream. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Default OpenAI API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";

    /// Creates a new configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `OPENAI_API_KEY` - Required API key
    /// - `OPENAI_BASE_URL` - Optional base URL
    /// - `OPENAI_MODEL` - Optional default model
    /// - `OPENAI_ORGANIZATION` - Optional organization ID
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::auth("openai", "OPENAI_API_KEY environment variable not set"))?;

        Ok(Self::new(api_key).with_env_overrides(
            std::env::var("OPENAI_BASE_URL").ok(),
            std::env::var("OPENAI_MODEL").ok(),
            std::env::var("OPENAI_ORGANIZATION").ok(),
        ))
    }

    /// Applies the optional environment values, normalizing the base URL
    /// the same way [`ClientConfig::with_base_url`] does.
    fn with_env_overrides(
        mut self,
        base_url: Option<String>,
        model: Option<String>,
        organization: Option<String>,
    ) -> Self {
        if let Some(url) = base_url {
            self = self.with_base_url(url);
        }
        if let Some(model) = model {
            self = self.with_model(model);
        }
        self.organization = organization;
        self
    }

    /// Sets the base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the organization ID.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Checks that the configuration can be used to build a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] for an empty API key and [`Error::Config`]
    /// for an empty base URL or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::auth("openai", "API key is required"));
        }
        if self.base_url.is_empty() {
            return Err(Error::config("base URL must not be empty"));
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            organization: None,
            timeout_secs: None,
        }
    }
}

//! Conversation messages and the request sent at stream open.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing instructions.
    System,
    /// User message.
    User,
    /// Assistant (model) message.
    Assistant,
}

impl Role {
    /// Get the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single role/content pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who is speaking.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Immutable configuration sent once when a stream is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier. Empty means "use the client's default model".
    pub model: String,
    /// Ordered conversation seed.
    pub messages: Vec<Message>,
    /// Optional cap on generated tokens.
    pub max_tokens: Option<u32>,
    /// Optional sampling temperature.
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Default system instruction of the seed conversation.
    pub const DEFAULT_SYSTEM: &'static str = "You are a helpful assistant.";
    /// Default user prompt of the seed conversation.
    pub const DEFAULT_PROMPT: &'static str = "Tell me a joke.";
    /// Model the seed conversation is sent to.
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";

    /// Creates a request for `model` with the given messages.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
        }
    }

    /// The fixed two-message seed: a system instruction followed by a user prompt.
    #[must_use]
    pub fn seed(
        model: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self::new(model, vec![Message::system(system), Message::user(prompt)])
    }

    /// The default seed conversation asking for a joke.
    #[must_use]
    pub fn joke() -> Self {
        Self::seed(
            Self::DEFAULT_MODEL,
            Self::DEFAULT_SYSTEM,
            Self::DEFAULT_PROMPT,
        )
    }

    /// Sets the token cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self::joke()
    }
}

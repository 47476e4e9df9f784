//! chatstream - streaming chat completions for OpenAI-compatible APIs
//!
//! This crate opens one streaming chat completion request, reads the
//! server-sent events it produces in order, and turns each event into a
//! `Received: <content>` line. A session ends when the server finishes,
//! when a payload cannot be decoded, or when a shutdown signal (Ctrl-C in
//! the `chatstream` binary) fires, and always releases the connection.
//!
//! ```rust,ignore
//! use chatstream::prelude::*;
//!
//! let client = ChatClient::from_env()?;
//! let mut stream = client.open_stream(&ChatRequest::joke()).await?;
//! let shutdown = async { tokio::signal::ctrl_c().await.ok(); };
//! run_session(&mut stream, &mut std::io::stdout(), shutdown, ContentMode::Message).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod mock;
pub mod prelude;
pub mod session;
pub mod stream;
pub mod types;

pub use client::ChatClient;
pub use config::ClientConfig;
pub use error::{Error, Result};

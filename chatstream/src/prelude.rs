//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chatstream::prelude::*;
//! ```

pub use crate::client::ChatClient;
pub use crate::config::ClientConfig;
pub use crate::error::{Error, Result};
pub use crate::handler::{ContentMode, extract_fragment, handle_event};
pub use crate::message::{ChatRequest, Message, Role};
pub use crate::session::{CLOSING_NOTICE, SessionEnd, SessionOutcome, run_session};
pub use crate::stream::{CompletionStream, Event, EventSource};

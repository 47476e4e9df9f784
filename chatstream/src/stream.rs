//! Server-sent event feed of an open completion request.
//!
//! [`CompletionStream`] owns the HTTP response of one request and yields its
//! events in arrival order. It supports exactly one traversal; the connection
//! is released by [`EventSource::close`] or, failing that, when the stream is
//! dropped.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};

use crate::error::{Error, Result};

/// One unit pushed by the server over the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// SSE `event:` type, if the server named one.
    pub event: Option<String>,
    /// SSE `data:` payload, if the event carried one.
    pub data: Option<String>,
    /// SSE `id:` field, if present.
    pub id: Option<String>,
}

impl Event {
    /// Payload the server sends to mark the end of a completion.
    pub const DONE: &'static str = "[DONE]";

    /// Creates an event carrying `data`.
    #[must_use]
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    /// Creates an event without a payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this event is the end-of-completion sentinel.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.data.as_deref().map(str::trim) == Some(Self::DONE)
    }
}

impl From<eventsource_stream::Event> for Event {
    fn from(event: eventsource_stream::Event) -> Self {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);
        Self {
            event: non_empty(event.event).filter(|e| e != "message"),
            data: non_empty(event.data),
            id: non_empty(event.id),
        }
    }
}

/// An ordered, pull-based feed of events that can be closed.
#[async_trait]
pub trait EventSource: Send {
    /// Waits for the next event.
    ///
    /// Returns `None` once the feed is exhausted or closed.
    async fn next_event(&mut self) -> Option<Result<Event>>;

    /// Releases the underlying connection.
    ///
    /// Calling it more than once is harmless.
    async fn close(&mut self);
}

type BoxedEvents = Pin<Box<dyn Stream<Item = Result<Event>> + Send>>;

/// The event feed of one streaming chat completion request.
pub struct CompletionStream {
    events: Option<BoxedEvents>,
}

impl CompletionStream {
    /// Wraps an HTTP response whose body is a `text/event-stream`.
    #[must_use]
    pub fn from_response(response: reqwest::Response) -> Self {
        let events = response.bytes_stream().eventsource().map(|item| {
            item.map(Event::from)
                .map_err(|e| Error::stream(e.to_string()))
        });
        Self::from_stream(events)
    }

    /// Wraps any stream of already-decoded events.
    #[must_use]
    pub fn from_stream<S>(events: S) -> Self
    where
        S: Stream<Item = Result<Event>> + Send + 'static,
    {
        Self {
            events: Some(Box::pin(events)),
        }
    }

    /// Whether the connection has been released.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.events.is_none()
    }
}

impl fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionStream")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl EventSource for CompletionStream {
    async fn next_event(&mut self) -> Option<Result<Event>> {
        let events = self.events.as_mut()?;
        let next = events.next().await;
        if let Some(Ok(event)) = &next {
            tracing::trace!(?event, "event received");
        }
        next
    }

    async fn close(&mut self) {
        if self.events.take().is_some() {
            tracing::debug!("completion stream closed");
        }
    }
}

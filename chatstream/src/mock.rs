//! Scripted event source for testing.
//!
//! [`MockSource`] replays a fixed list of steps without touching the network,
//! and records how often it was closed, so session behaviour can be checked
//! deterministically.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::stream::{Event, EventSource};

/// One scripted step of a [`MockSource`].
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Yield this event.
    Event(Event),
    /// Yield a stream error with this message.
    Error(String),
    /// Fire the shutdown signal, then never yield again.
    Interrupt,
}

impl MockStep {
    /// An event carrying `data`.
    #[must_use]
    pub fn data(data: impl Into<String>) -> Self {
        Self::Event(Event::data(data))
    }
}

/// An [`EventSource`] that replays scripted steps.
///
/// # Example
///
/// ```rust,ignore
/// let mut source = MockSource::new(vec![MockStep::data("{}"), MockStep::Interrupt]);
/// let shutdown = source.shutdown_signal();
/// run_session(&mut source, &mut std::io::sink(), shutdown, ContentMode::Message).await?;
/// assert_eq!(source.close_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockSource {
    steps: VecDeque<MockStep>,
    interrupt: Arc<Notify>,
    closed: bool,
    close_count: usize,
}

impl MockSource {
    /// Create a source that replays `steps` and is exhausted afterwards.
    #[must_use]
    pub fn new(steps: Vec<MockStep>) -> Self {
        Self {
            steps: steps.into(),
            interrupt: Arc::new(Notify::new()),
            closed: false,
            close_count: 0,
        }
    }

    /// A future that resolves when a [`MockStep::Interrupt`] is reached.
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + use<> {
        let interrupt = Arc::clone(&self.interrupt);
        async move { interrupt.notified().await }
    }

    /// How many times `close` was called.
    #[must_use]
    pub const fn close_count(&self) -> usize {
        self.close_count
    }

    /// Steps not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait]
impl EventSource for MockSource {
    async fn next_event(&mut self) -> Option<Result<Event>> {
        if self.closed {
            return None;
        }
        match self.steps.pop_front()? {
            MockStep::Event(event) => Some(Ok(event)),
            MockStep::Error(message) => Some(Err(Error::stream(message))),
            MockStep::Interrupt => {
                self.interrupt.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        self.close_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_steps() {
        let mut source = MockSource::new(vec![
            MockStep::data("one"),
            MockStep::Error("boom".to_owned()),
        ]);

        assert_eq!(
            source.next_event().await.unwrap().unwrap(),
            Event::data("one")
        );
        assert!(source.next_event().await.unwrap().is_err());
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_mock_counts_closes() {
        let mut source = MockSource::new(vec![MockStep::data("one")]);
        source.close().await;
        source.close().await;

        assert_eq!(source.close_count(), 2);
        assert!(source.next_event().await.is_none());
        assert_eq!(source.remaining(), 1);
    }
}

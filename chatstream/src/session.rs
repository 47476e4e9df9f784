//! The consume loop of one streaming session.
//!
//! A session pulls events from an [`EventSource`] in arrival order, prints
//! each fragment, and races every wait against a shutdown future (Ctrl-C in
//! the binary). The source is closed exactly once on every exit path.

use std::future::Future;
use std::io::Write;

use crate::error::Result;
use crate::handler::{ContentMode, handle_event};
use crate::stream::{Event, EventSource};

/// Notice written when a session is interrupted.
pub const CLOSING_NOTICE: &str = "Closing stream.";

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the feed.
    Exhausted,
    /// The server sent the `[DONE]` sentinel.
    Done,
    /// The shutdown future fired while waiting for an event.
    Interrupted,
}

/// Summary of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Events pulled from the source.
    pub events: usize,
    /// `Received:` lines written.
    pub fragments: usize,
    /// Why the session stopped.
    pub end: SessionEnd,
}

enum Step {
    Interrupted,
    Next(Option<Result<Event>>),
}

/// Consumes `source` until it is exhausted, sends `[DONE]`, fails, or
/// `shutdown` resolves.
///
/// On shutdown the [`CLOSING_NOTICE`] line is written and no further event
/// is pulled. The source is closed before this function returns, whatever
/// the outcome.
///
/// # Errors
///
/// Returns the first stream or decode error (after closing the source), or
/// an I/O error from writing to `out`.
pub async fn run_session<S, W, F>(
    source: &mut S,
    out: &mut W,
    shutdown: F,
    mode: ContentMode,
) -> Result<SessionOutcome>
where
    S: EventSource + ?Sized,
    W: Write + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut events = 0;
    let mut fragments = 0;

    let end = loop {
        let step = tokio::select! {
            biased;
            () = &mut shutdown => Step::Interrupted,
            next = source.next_event() => Step::Next(next),
        };

        let event = match step {
            Step::Interrupted => {
                tracing::info!(events, fragments, "interrupted, closing stream");
                let notice = writeln!(out, "{CLOSING_NOTICE}").and_then(|()| out.flush());
                source.close().await;
                notice?;
                return Ok(SessionOutcome {
                    events,
                    fragments,
                    end: SessionEnd::Interrupted,
                });
            }
            Step::Next(None) => break SessionEnd::Exhausted,
            Step::Next(Some(Err(e))) => {
                tracing::warn!(error = %e, "event stream failed");
                source.close().await;
                return Err(e);
            }
            Step::Next(Some(Ok(event))) => event,
        };

        events += 1;
        if event.is_done() {
            break SessionEnd::Done;
        }

        match handle_event(&event, mode, out) {
            Ok(true) => fragments += 1,
            Ok(false) => tracing::trace!(?event, "event carried no fragment"),
            Err(e) => {
                tracing::warn!(error = %e, "failed to handle event");
                source.close().await;
                return Err(e);
            }
        }
    };

    tracing::debug!(events, fragments, ?end, "stream finished");
    source.close().await;

    Ok(SessionOutcome {
        events,
        fragments,
        end,
    })
}

//! Turning events into printed text fragments.

use std::io::Write;

use crate::error::{Error, Result};
use crate::stream::Event;
use crate::types::CompletionChunk;

/// Which field of the first choice carries the text fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentMode {
    /// `choices[0].message.content`. A message without a `content` key is a
    /// decode error; a `null` or non-string content is skipped.
    #[default]
    Message,
    /// `choices[0].delta.content`, as sent in `chat.completion.chunk` events.
    /// Deltas without content (role announcements, the final empty delta) are skipped.
    Delta,
}

/// Extracts the text fragment an event carries, if any.
///
/// Events without data, the `[DONE]` sentinel, chunks with no choices and
/// choices without the selected message field yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the data is not a JSON completion chunk,
/// or when in [`ContentMode::Message`] the first choice has a `message`
/// with no `content` key.
pub fn extract_fragment(event: &Event, mode: ContentMode) -> Result<Option<String>> {
    let Some(data) = event.data.as_deref() else {
        return Ok(None);
    };
    if event.is_done() {
        return Ok(None);
    }

    let chunk: CompletionChunk =
        serde_json::from_str(data).map_err(|e| Error::decode(e.to_string(), data))?;

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };

    match mode {
        ContentMode::Message => match choice.message {
            None => Ok(None),
            Some(message) if !message.has_content_key() => Err(Error::decode(
                "choices[0].message has no content",
                data,
            )),
            Some(message) => Ok(message.text().map(ToOwned::to_owned)),
        },
        ContentMode::Delta => Ok(choice
            .delta
            .as_ref()
            .and_then(|delta| delta.text())
            .map(ToOwned::to_owned)),
    }
}

/// Writes the fragment an event carries as a `Received: <content>` line.
///
/// Returns whether a line was written.
///
/// # Errors
///
/// Propagates decode errors from [`extract_fragment`] and I/O errors from `out`.
pub fn handle_event<W: Write + ?Sized>(
    event: &Event,
    mode: ContentMode,
    out: &mut W,
) -> Result<bool> {
    match extract_fragment(event, mode)? {
        Some(content) => {
            writeln!(out, "Received: {content}")?;
            out.flush()?;
            Ok(true)
        }
        None => Ok(false),
    }
}

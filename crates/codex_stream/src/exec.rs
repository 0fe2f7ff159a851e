use std::pin::Pin;

use futures_core::Stream;
use futures_util::stream;

use crate::{
    normalize::parse_event_line,
    process::{launch, ExecRequest},
    CodexError, LineReader, ProtocolEvent,
};

/// Type-erased stream of parsed protocol events.
pub type DynProtocolEventStream =
    Pin<Box<dyn Stream<Item = Result<ProtocolEvent, CodexError>> + Send>>;

/// Launches `codex exec --json` and streams its stdout as [`ProtocolEvent`]s.
///
/// Malformed lines are logged and skipped. The stream ends after the process exits; a non-zero
/// exit surfaces as a final [`CodexError::ExecutionFailed`]. Dropping the stream early kills the
/// process.
///
/// # Panics
///
/// Must be called from within a Tokio runtime.
pub fn stream_events(request: &ExecRequest) -> Result<DynProtocolEventStream, CodexError> {
    let child = launch(request)?;
    let reader = LineReader::new(child)?;
    Ok(Box::pin(events_from_reader(reader)))
}

pub(crate) fn events_from_reader(
    reader: LineReader,
) -> impl Stream<Item = Result<ProtocolEvent, CodexError>> + Send {
    stream::try_unfold(reader, |mut reader| async move {
        while let Some(line) = reader.next_line().await? {
            if let Some(event) = parse_event_line(&line) {
                return Ok(Some((event, reader)));
            }
        }
        Ok::<_, CodexError>(None)
    })
}
